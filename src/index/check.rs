//! Offline validation of a docs tree against the shard contract.
//!
//! The engine tolerates unsorted shards and repeated keys, but a generator
//! that produces them is broken. The checker decodes every bucket named by
//! the manifest in parallel and reports what it finds.

use crate::index::bucket::BucketRouter;
use crate::index::decode::decode_entries;
use crate::index::manifest::Manifest;
use crate::index::store::{DirSource, ShardSource};
use crate::index::types::SearchEntry;
use crate::utils::progress::shard_bar;
use anyhow::{Context, Result};
use rayon::prelude::*;
use std::fmt;
use std::path::Path;

/// A single contract violation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Issue {
    /// Payload missing or not decodable
    Unreadable(String),
    /// Key sorts before its predecessor
    Unsorted { key: String, previous: String },
    DuplicateKey(String),
    NoOccurrences(String),
    /// Key does not route to the bucket it was stored in
    WrongBucket(String),
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Issue::Unreadable(reason) => write!(f, "unreadable: {}", reason),
            Issue::Unsorted { key, previous } => {
                write!(f, "key '{}' sorts before '{}'", key, previous)
            }
            Issue::DuplicateKey(key) => write!(f, "duplicate key '{}'", key),
            Issue::NoOccurrences(key) => write!(f, "key '{}' has no occurrences", key),
            Issue::WrongBucket(key) => write!(f, "key '{}' belongs to another bucket", key),
        }
    }
}

/// Findings for one bucket
#[derive(Debug, Clone)]
pub struct ShardReport {
    pub bucket: String,
    pub entries: usize,
    pub issues: Vec<Issue>,
}

/// Findings for a whole docs tree, in manifest order
#[derive(Debug, Clone, Default)]
pub struct CheckReport {
    pub shards: Vec<ShardReport>,
}

impl CheckReport {
    pub fn is_clean(&self) -> bool {
        self.shards.iter().all(|s| s.issues.is_empty())
    }

    pub fn issue_count(&self) -> usize {
        self.shards.iter().map(|s| s.issues.len()).sum()
    }

    pub fn entry_count(&self) -> usize {
        self.shards.iter().map(|s| s.entries).sum()
    }
}

/// Contract violations in entries decoded from `bucket`, in file order
pub fn check_entries(router: &BucketRouter, bucket: &str, entries: &[SearchEntry]) -> Vec<Issue> {
    let mut issues = Vec::new();

    for (i, entry) in entries.iter().enumerate() {
        if entry.occurrences.is_empty() {
            issues.push(Issue::NoOccurrences(entry.key.clone()));
        }
        if router.bucket_key(&entry.key) != bucket {
            issues.push(Issue::WrongBucket(entry.key.clone()));
        }
        if let Some(previous) = i.checked_sub(1).map(|p| &entries[p]) {
            if previous.key == entry.key {
                issues.push(Issue::DuplicateKey(entry.key.clone()));
            } else if previous.key > entry.key {
                issues.push(Issue::Unsorted {
                    key: entry.key.clone(),
                    previous: previous.key.clone(),
                });
            }
        }
    }

    issues
}

fn check_bucket(source: &dyn ShardSource, router: &BucketRouter, bucket: &str) -> ShardReport {
    let decoded = source
        .fetch(bucket)
        .and_then(|payload| decode_entries(bucket, &payload));

    match decoded {
        Ok(entries) => ShardReport {
            bucket: bucket.to_string(),
            entries: entries.len(),
            issues: check_entries(router, bucket, &entries),
        },
        Err(err) => ShardReport {
            bucket: bucket.to_string(),
            entries: 0,
            issues: vec![Issue::Unreadable(err.to_string())],
        },
    }
}

/// Check every bucket the manifest names
pub fn check_source(source: &dyn ShardSource, manifest: &Manifest, silent: bool) -> CheckReport {
    let router = BucketRouter::new(manifest.prefix_len, 1);
    let buckets: Vec<&String> = manifest.buckets.iter().collect();

    let progress_bar = shard_bar(buckets.len(), "Checking shards...", silent);

    let shards: Vec<ShardReport> = buckets
        .par_iter()
        .map(|bucket| {
            let report = check_bucket(source, &router, bucket);
            if let Some(ref pb) = progress_bar {
                pb.inc(1);
            }
            report
        })
        .collect();

    if let Some(pb) = progress_bar {
        pb.finish_and_clear();
    }

    let report = CheckReport { shards };
    tracing::info!(
        shards = report.shards.len(),
        entries = report.entry_count(),
        issues = report.issue_count(),
        "check finished"
    );
    report
}

/// Check a docs directory. A manifest is required to know which shards exist.
pub fn check_dir(dir: &Path, silent: bool) -> Result<CheckReport> {
    let manifest = Manifest::load(dir)?
        .with_context(|| format!("No manifest.json in {}", dir.display()))?;
    let source = DirSource::new(dir);
    Ok(check_source(&source, &manifest, silent))
}
