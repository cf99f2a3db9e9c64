use crate::index::store::IndexShardStore;
use crate::query::aggregate::ResultSet;
use crate::query::session::{QuerySession, Renderer, ResultView, SessionConfig, SessionState};
use crate::utils::AppConfig;
use anyhow::Result;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Results moved per page key
const PAGE_SIZE: isize = 10;

/// Application mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Search,
    Help,
}

/// Snapshot of what the session last asked to be painted
#[derive(Debug, Default)]
pub struct ViewModel {
    pub results: ResultSet,
    pub cursor: usize,
    pub seq: u64,
    pub degraded: bool,
}

impl Renderer for ViewModel {
    fn render(&mut self, view: &ResultView<'_>) {
        if view.seq != self.seq {
            self.results = view.results.clone();
        }
        self.cursor = view.cursor;
        self.seq = view.seq;
        self.degraded = view.degraded;
    }

    fn clear(&mut self) {
        self.results = ResultSet::default();
        self.cursor = 0;
        self.degraded = false;
    }
}

/// Application state
pub struct App {
    /// Directory holding the shard files; relative result urls resolve here
    pub docs_dir: PathBuf,
    pub query: String,
    pub mode: Mode,
    pub status_message: String,
    session: QuerySession<ViewModel>,
    /// Status set by an action; shown until the next query change
    action_message: Option<String>,
}

impl App {
    pub fn new(docs_dir: PathBuf, config: &AppConfig) -> Result<Self> {
        let store = IndexShardStore::open_dir(&docs_dir)?;
        let session = QuerySession::new(store, SessionConfig::from(config), ViewModel::default());
        Ok(Self::with_session(docs_dir, session))
    }

    pub fn with_session(docs_dir: PathBuf, session: QuerySession<ViewModel>) -> Self {
        let mut app = Self {
            docs_dir,
            query: String::new(),
            mode: Mode::Search,
            status_message: String::new(),
            session,
            action_message: None,
        };
        app.update_status();
        app
    }

    pub fn view(&self) -> &ViewModel {
        self.session.renderer()
    }

    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    /// Process finished shard loads (call this in event loop)
    pub fn poll(&mut self) {
        let before = (self.session.seq(), self.session.state());
        self.session.poll();
        if before != (self.session.seq(), self.session.state()) {
            self.update_status();
        }
    }

    pub fn set_query(&mut self, query: &str) {
        self.query = query.to_string();
        self.query_changed();
    }

    pub fn push_char(&mut self, c: char) {
        self.query.push(c);
        self.query_changed();
    }

    pub fn pop_char(&mut self) {
        self.query.pop();
        self.query_changed();
    }

    pub fn clear_query(&mut self) {
        self.query.clear();
        self.query_changed();
    }

    /// Delete word backward from query (vim Ctrl+w)
    pub fn delete_word(&mut self) {
        // Remove trailing whitespace first
        while self.query.ends_with(' ') {
            self.query.pop();
        }
        // Remove word characters
        while !self.query.is_empty() && !self.query.ends_with(' ') {
            self.query.pop();
        }
        self.query_changed();
    }

    pub fn select_next(&mut self) {
        self.session.move_cursor(1);
    }

    pub fn select_prev(&mut self) {
        self.session.move_cursor(-1);
    }

    pub fn select_page_down(&mut self) {
        self.session.move_cursor(PAGE_SIZE);
    }

    pub fn select_page_up(&mut self) {
        self.session.move_cursor(-PAGE_SIZE);
    }

    /// Jump to first result
    pub fn select_first(&mut self) {
        self.session.cursor_first();
    }

    /// Jump to last result
    pub fn select_last(&mut self) {
        self.session.cursor_last();
    }

    pub fn show_help(&mut self) {
        self.mode = Mode::Help;
    }

    pub fn hide_help(&mut self) {
        self.mode = Mode::Search;
    }

    /// Location of the selected result, resolved against the docs directory
    pub fn selected_target(&self) -> Option<String> {
        self.session
            .activate()
            .map(|url| resolve_url(&self.docs_dir, url))
    }

    /// Open the selected result in $BROWSER, or show where it lives
    pub fn open_selected(&mut self) {
        let Some(target) = self.selected_target() else {
            return;
        };

        let message = match std::env::var("BROWSER") {
            Ok(browser) if !browser.is_empty() => {
                match Command::new(&browser).arg(&target).spawn() {
                    Ok(_) => format!("Opened {}", target),
                    Err(e) => {
                        tracing::warn!(browser = %browser, error = %e, "failed to launch browser");
                        format!("Failed to launch {}: {}", browser, e)
                    }
                }
            }
            _ => target,
        };

        self.action_message = Some(message);
        self.update_status();
    }

    fn query_changed(&mut self) {
        self.action_message = None;
        self.session.on_input(&self.query);
        self.update_status();
    }

    fn update_status(&mut self) {
        if let Some(ref message) = self.action_message {
            self.status_message = message.clone();
            return;
        }

        let store = self.session.store().stats();
        self.status_message = match self.session.state() {
            SessionState::Idle => format!("Type to search ({} shards loaded)", store.cached),
            SessionState::Pending => "Loading shards...".to_string(),
            SessionState::Displaying => {
                let count = self.session.results().len();
                if self.session.is_degraded() {
                    format!("{} results (some shards timed out)", count)
                } else {
                    format!("{} results", count)
                }
            }
        };
    }
}

/// Absolute urls pass through; relative ones become file paths under the
/// docs directory, keeping any fragment.
fn resolve_url(docs_dir: &Path, url: &str) -> String {
    if url.contains("://") {
        return url.to_string();
    }

    let (path, fragment) = match url.split_once('#') {
        Some((path, fragment)) => (path, Some(fragment)),
        None => (url, None),
    };

    let full = docs_dir.join(path);
    match fragment {
        Some(fragment) => format!("file://{}#{}", full.display(), fragment),
        None => format!("file://{}", full.display()),
    }
}
