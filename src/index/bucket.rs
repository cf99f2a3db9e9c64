//! Routing of normalized query tokens to shard bucket keys.

use crate::index::manifest::Manifest;

/// Derives bucket keys from the leading characters of normalized tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketRouter {
    prefix_len: usize,
    max_routed_tokens: usize,
}

impl BucketRouter {
    pub fn new(prefix_len: usize, max_routed_tokens: usize) -> Self {
        Self {
            prefix_len: prefix_len.max(1),
            max_routed_tokens: max_routed_tokens.max(1),
        }
    }

    pub fn prefix_len(&self) -> usize {
        self.prefix_len
    }

    /// Bucket key of a normalized token: its first `prefix_len` characters.
    /// Shorter tokens are their own bucket key.
    pub fn bucket_key(&self, token: &str) -> String {
        token.chars().take(self.prefix_len).collect()
    }

    /// Bucket keys needed to answer a query, in routing order without
    /// duplicates.
    ///
    /// Only the first `max_routed_tokens` tokens are routed. With a manifest,
    /// a token shorter than the prefix length fans out to every listed bucket
    /// that starts with it.
    pub fn route(&self, tokens: &[String], manifest: Option<&Manifest>) -> Vec<String> {
        let mut buckets: Vec<String> = Vec::new();

        for token in tokens.iter().take(self.max_routed_tokens) {
            let key = self.bucket_key(token);
            let short = key.chars().count() < self.prefix_len;

            match manifest {
                Some(manifest) if short => {
                    for bucket in manifest.buckets_with_prefix(&key) {
                        push_unique(&mut buckets, bucket.to_string());
                    }
                }
                _ => push_unique(&mut buckets, key),
            }
        }

        buckets
    }
}

fn push_unique(buckets: &mut Vec<String>, bucket: String) {
    if !buckets.contains(&bucket) {
        buckets.push(bucket);
    }
}
