//! Error kinds raised while fetching and decoding shards.
//!
//! These never reach a renderer: the shard store logs them and substitutes an
//! empty shard. The checker reports them per bucket.

use std::io;

#[derive(Debug, thiserror::Error)]
pub enum ShardError {
    /// Transport or storage failure while fetching a shard
    #[error("failed to load shard '{bucket}': {source}")]
    LoadFailure {
        bucket: String,
        #[source]
        source: io::Error,
    },

    /// Payload was fetched but could not be decoded
    #[error("malformed shard '{bucket}': {reason}")]
    Malformed { bucket: String, reason: String },
}

impl ShardError {
    pub fn malformed(bucket: &str, reason: impl Into<String>) -> Self {
        ShardError::Malformed {
            bucket: bucket.to_string(),
            reason: reason.into(),
        }
    }

    pub fn bucket(&self) -> &str {
        match self {
            ShardError::LoadFailure { bucket, .. } | ShardError::Malformed { bucket, .. } => {
                bucket
            }
        }
    }
}
