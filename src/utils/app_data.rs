use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

const APP_NAME: &str = "docsearch";
const CONFIG_FILE: &str = "config.json";
const LOG_FILE: &str = "docsearch.log";

/// Application configuration stored in the app data directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Characters of a token that select its bucket. A docs tree's
    /// manifest overrides this.
    #[serde(default = "default_bucket_prefix_len")]
    pub bucket_prefix_len: usize,

    /// How many leading query tokens are routed to buckets
    #[serde(default = "default_max_routed_tokens")]
    pub max_routed_tokens: usize,

    /// Maximum hits shown per category
    #[serde(default = "default_per_category_cap")]
    pub per_category_cap: usize,

    /// Maximum hits shown overall
    #[serde(default = "default_total_cap")]
    pub total_cap: usize,

    /// How long a query waits for a shard before treating it as empty
    #[serde(default = "default_load_timeout_ms")]
    pub load_timeout_ms: u64,

    /// Number of memoized query results
    #[serde(default = "default_result_cache_size")]
    pub result_cache_size: usize,
}

fn default_bucket_prefix_len() -> usize {
    2
}

fn default_max_routed_tokens() -> usize {
    1
}

fn default_per_category_cap() -> usize {
    15
}

fn default_total_cap() -> usize {
    50
}

fn default_load_timeout_ms() -> u64 {
    2000
}

fn default_result_cache_size() -> usize {
    64
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bucket_prefix_len: default_bucket_prefix_len(),
            max_routed_tokens: default_max_routed_tokens(),
            per_category_cap: default_per_category_cap(),
            total_cap: default_total_cap(),
            load_timeout_ms: default_load_timeout_ms(),
            result_cache_size: default_result_cache_size(),
        }
    }
}

impl AppConfig {
    /// Load config from the app data directory, or return default if not found
    pub fn load() -> Result<Self> {
        let config_path = get_config_path()?;

        if config_path.exists() {
            let content = fs::read_to_string(&config_path)
                .context("Failed to read config file")?;
            let config: AppConfig = serde_json::from_str(&content)
                .context("Failed to parse config file")?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Apply command-line overrides on top of the stored values
    pub fn with_overrides(
        mut self,
        per_category_cap: Option<usize>,
        total_cap: Option<usize>,
        load_timeout_ms: Option<u64>,
    ) -> Self {
        if let Some(cap) = per_category_cap {
            self.per_category_cap = cap;
        }
        if let Some(cap) = total_cap {
            self.total_cap = cap;
        }
        if let Some(ms) = load_timeout_ms {
            self.load_timeout_ms = ms;
        }
        self
    }
}

/// Get the path to the config file
pub fn get_config_path() -> Result<PathBuf> {
    let app_dir = get_app_data_dir()?;
    Ok(app_dir.join(CONFIG_FILE))
}

/// Get the path of the interactive-mode log file
pub fn get_log_path() -> Result<PathBuf> {
    let app_dir = get_app_data_dir()?;
    Ok(app_dir.join(LOG_FILE))
}

/// Get the application data directory
pub fn get_app_data_dir() -> Result<PathBuf> {
    let base = if cfg!(target_os = "macos") {
        dirs::home_dir()
            .map(|h| h.join("Library").join("Application Support"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
    } else {
        // Linux/Unix: use XDG_DATA_HOME or ~/.local/share
        dirs::data_dir()
    };

    let base = base.context("Could not determine app data directory")?;
    let app_dir = base.join(APP_NAME);

    fs::create_dir_all(&app_dir)?;
    Ok(app_dir)
}
