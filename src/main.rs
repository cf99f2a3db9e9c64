use anyhow::{ensure, Context, Result};
use clap::{Parser, Subcommand};
use docsearch::index::check::check_dir;
use docsearch::index::IndexShardStore;
use docsearch::output;
use docsearch::query::{NullRenderer, QuerySession, SessionConfig, SessionState};
use docsearch::utils::{get_config_path, AppConfig};
use std::fs::File;
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Extra time a one-shot query waits beyond the shard load timeout
const QUERY_GRACE: Duration = Duration::from_millis(500);

#[derive(Parser)]
#[command(name = "docsearch")]
#[command(about = "Incremental keyword search over generated documentation indexes")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Search query (when no subcommand is given)
    #[arg(trailing_var_arg = true)]
    query: Vec<String>,

    /// Directory holding the index shards
    #[arg(short, long, global = true, default_value = ".")]
    docs: PathBuf,

    /// Maximum results per category
    #[arg(long, global = true)]
    per_category_cap: Option<usize>,

    /// Maximum results overall
    #[arg(long, global = true)]
    total_cap: Option<usize>,

    /// Shard load timeout in milliseconds
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Search interactively (TUI)
    Search {
        /// Initial query
        query: Option<String>,
    },
    /// Run one query and print the results
    Query {
        /// Query text
        #[arg(required = true)]
        text: Vec<String>,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
    /// Validate every shard listed in the manifest
    Check,
    /// Show the effective configuration
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let interactive = match &cli.command {
        Some(Commands::Search { .. }) => true,
        None => cli.query.is_empty(),
        _ => false,
    };
    init_logging(cli.verbose, interactive);

    let config =
        AppConfig::load()?.with_overrides(cli.per_category_cap, cli.total_cap, cli.timeout_ms);

    match cli.command {
        Some(Commands::Search { query }) => {
            run_interactive(&cli.docs, &config, query)?;
        }
        Some(Commands::Query { text, json }) => {
            run_query(&cli.docs, &config, &text.join(" "), json)?;
        }
        Some(Commands::Check) => {
            let report = check_dir(&cli.docs, !io::stderr().is_terminal())?;
            output::print_check_report(&report, true)?;
            if !report.is_clean() {
                std::process::exit(1);
            }
        }
        Some(Commands::Config) => {
            println!("# {}", get_config_path()?.display());
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        None => {
            if cli.query.is_empty() {
                run_interactive(&cli.docs, &config, None)?;
            } else {
                run_query(&cli.docs, &config, &cli.query.join(" "), false)?;
            }
        }
    }

    Ok(())
}

/// Log to stderr, or to a file in the app data directory while the TUI owns
/// the terminal. `RUST_LOG` overrides the default level.
fn init_logging(verbose: bool, interactive: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("docsearch=debug")
        } else {
            EnvFilter::new("docsearch=warn")
        }
    });

    let log_file = if interactive {
        docsearch::utils::get_log_path()
            .ok()
            .and_then(|path| File::create(path).ok())
    } else {
        None
    };

    let registry = tracing_subscriber::registry().with(filter);
    match log_file {
        Some(file) => registry
            .with(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
            .init(),
        None => registry
            .with(fmt::layer().with_writer(io::stderr).with_target(false).without_time())
            .init(),
    }
}

fn ensure_docs_dir(docs: &Path) -> Result<()> {
    ensure!(docs.is_dir(), "Docs directory not found: {}", docs.display());
    Ok(())
}

#[cfg(feature = "interactive")]
fn run_interactive(docs: &Path, config: &AppConfig, query: Option<String>) -> Result<()> {
    ensure_docs_dir(docs)?;
    docsearch::tui::run(docs.to_path_buf(), config, query)
}

#[cfg(not(feature = "interactive"))]
fn run_interactive(_docs: &Path, _config: &AppConfig, _query: Option<String>) -> Result<()> {
    anyhow::bail!("Built without the `interactive` feature; use `docsearch query`")
}

fn run_query(docs: &Path, config: &AppConfig, text: &str, json: bool) -> Result<()> {
    ensure_docs_dir(docs)?;

    let store = IndexShardStore::open_dir(docs)
        .with_context(|| format!("Failed to open docs directory {}", docs.display()))?;
    let session_config = SessionConfig::from(config);
    let deadline = session_config.load_timeout + QUERY_GRACE;

    let mut session = QuerySession::new(store, session_config, NullRenderer);
    session.on_input(text);
    let state = session.wait(deadline);

    if state == SessionState::Pending {
        anyhow::bail!("Timed out waiting for index shards");
    }
    if session.is_degraded() {
        eprintln!("warning: some index shards did not load in time; results may be incomplete");
    }

    if json {
        output::print_json(session.results())?;
    } else if session.results().is_empty() {
        eprintln!("No results");
    } else {
        let color = io::stdout().is_terminal();
        output::print_results(session.results(), &session.query().tokens, color)?;
    }

    Ok(())
}
