//! Utility functions and data structures.
//!
//! ## Modules
//!
//! - [`app_data`] - Configuration and application data directory (XDG-compliant)
//! - [`entities`] - HTML character references in labels and keys
//! - [`progress`] - Progress bars, no-op without the `progress` feature
//! - [`tokenizer`] - Query normalization
//!
//! ## Key Functions
//!
//! ```
//! use docsearch::utils::{normalize, decode_entities};
//!
//! let query = normalize("  Mem   MAP ");
//! assert_eq!(query.tokens, vec!["mem", "map"]);
//! assert_eq!(query.joined, "mem map");
//!
//! assert_eq!(decode_entities("a &lt; b"), "a < b");
//! ```

pub mod app_data;
pub mod entities;
pub mod progress;
pub mod tokenizer;

pub use app_data::*;
pub use entities::*;
pub use tokenizer::*;
