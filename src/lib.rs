//! # docsearch - incremental search over documentation keyword indexes
//!
//! Documentation generators emit a keyword index split into small shards,
//! one per bucket of leading characters. docsearch answers as-you-type
//! queries against such an index: each keystroke routes the query to the
//! few shards it needs, loads them lazily in the background, matches and
//! groups the entries, and shows only the results of the latest keystroke.
//!
//! ## Architecture
//!
//! - [`index`] - Shard format, bucket routing and the shard store
//! - [`query`] - Matching, result grouping and the query session
//! - [`tui`] - Interactive terminal UI
//! - [`output`] - Result formatting for one-shot queries
//! - [`utils`] - Normalization, entities, configuration
//! - [`error`] - Shard loading errors
//!
//! ## Quick Start
//!
//! ```no_run
//! use docsearch::index::IndexShardStore;
//! use docsearch::query::{NullRenderer, QuerySession, SessionConfig};
//! use std::path::Path;
//! use std::time::Duration;
//!
//! let store = IndexShardStore::open_dir(Path::new("docs/html/search")).unwrap();
//! let mut session = QuerySession::new(store, SessionConfig::default(), NullRenderer);
//!
//! session.on_input("mem map");
//! session.wait(Duration::from_secs(2));
//!
//! for hit in session.results().iter() {
//!     println!("{}  {}", hit.occurrence.label, hit.occurrence.url);
//! }
//! ```
//!
//! ## Model
//!
//! 1. **Shards** are immutable once loaded and cached for the session
//! 2. **Requests** carry a sequence number; only the latest one renders
//! 3. **Failures** (missing or malformed shards) degrade to empty results

pub mod error;
pub mod index;
pub mod output;
pub mod query;
#[cfg(feature = "interactive")]
pub mod tui;
pub mod utils;
