//! Keyword index shards: on-disk format, routing and loading.
//!
//! - [`decode`] - Shard payload parsing and search-id escaping
//! - [`bucket`] - Token to bucket key routing
//! - [`manifest`] - Optional list of buckets a generator produced
//! - [`store`] - Lazy, cached, background shard loading
//! - [`check`] - Offline validation of a docs tree

pub mod bucket;
pub mod check;
pub mod decode;
pub mod manifest;
pub mod store;
pub mod types;

#[cfg(test)]
pub(crate) mod test_utils;

pub use bucket::BucketRouter;
pub use manifest::Manifest;
pub use store::{DirSource, IndexShardStore, LoadStatus, ShardSource, StoreStats};
pub use types::*;
