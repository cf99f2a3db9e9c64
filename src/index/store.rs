//! Lazy, de-duplicated loading of index shards.
//!
//! Fetches run on background threads and report back through a channel that
//! the owning event loop drains with [`IndexShardStore::poll`]. The cache and
//! the in-flight table are only touched by the owner, so no locking is
//! needed. Shards are never evicted.

use crate::error::ShardError;
use crate::index::decode::{decode_shard, resource_name};
use crate::index::manifest::Manifest;
use crate::index::types::Shard;
use ahash::AHashMap;
use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Where shard payloads come from
pub trait ShardSource: Send + Sync {
    /// Fetch the raw payload for a bucket. May block; always called off the
    /// event loop.
    fn fetch(&self, bucket: &str) -> Result<String, ShardError>;
}

/// Shards stored as `<escaped bucket>.js` files under a docs directory
#[derive(Debug, Clone)]
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ShardSource for DirSource {
    fn fetch(&self, bucket: &str) -> Result<String, ShardError> {
        let path = self.root.join(resource_name(bucket));
        fs::read_to_string(&path).map_err(|source| ShardError::LoadFailure {
            bucket: bucket.to_string(),
            source,
        })
    }
}

/// Result of asking the store for a shard
#[derive(Debug, Clone)]
pub enum LoadStatus {
    Ready(Arc<Shard>),
    /// A fetch is in flight; the bucket shows up in a later `poll`
    Pending,
}

/// Store counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub fetches_issued: u64,
    pub failures: u64,
    pub cached: usize,
    pub in_flight: usize,
}

struct FetchOutcome {
    bucket: String,
    result: Result<Shard, ShardError>,
}

/// Session-scoped cache of immutable shards
pub struct IndexShardStore {
    source: Arc<dyn ShardSource>,
    manifest: Option<Manifest>,
    cache: AHashMap<String, Arc<Shard>>,
    in_flight: AHashMap<String, Instant>,
    tx: Sender<FetchOutcome>,
    rx: Receiver<FetchOutcome>,
    fetches_issued: u64,
    failures: u64,
}

impl IndexShardStore {
    pub fn new(source: Arc<dyn ShardSource>, manifest: Option<Manifest>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            source,
            manifest,
            cache: AHashMap::new(),
            in_flight: AHashMap::new(),
            tx,
            rx,
            fetches_issued: 0,
            failures: 0,
        }
    }

    /// Store over a docs directory, picking up its manifest if present
    pub fn open_dir(dir: &Path) -> Result<Self> {
        let manifest = Manifest::load(dir)?;
        Ok(Self::new(Arc::new(DirSource::new(dir)), manifest))
    }

    pub fn manifest(&self) -> Option<&Manifest> {
        self.manifest.as_ref()
    }

    /// Request a shard.
    ///
    /// Cached shards are returned without I/O. Otherwise a single background
    /// fetch is started per bucket; repeated requests while it is running
    /// just report `Pending`.
    pub fn load(&mut self, bucket: &str) -> LoadStatus {
        if let Some(shard) = self.cache.get(bucket) {
            return LoadStatus::Ready(Arc::clone(shard));
        }

        let unlisted = self
            .manifest
            .as_ref()
            .is_some_and(|manifest| !manifest.contains(bucket));
        if unlisted {
            tracing::debug!(bucket, "bucket not in manifest, using empty shard");
            return LoadStatus::Ready(self.insert(bucket, Shard::empty(bucket)));
        }

        if self.in_flight.contains_key(bucket) {
            return LoadStatus::Pending;
        }

        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();
        let owned = bucket.to_string();

        let spawned = thread::Builder::new()
            .name(format!("shard-{}", bucket))
            .spawn(move || {
                let result = source
                    .fetch(&owned)
                    .and_then(|payload| decode_shard(&owned, &payload));
                // Receiver only goes away with the store itself
                let _ = tx.send(FetchOutcome {
                    bucket: owned,
                    result,
                });
            });

        self.fetches_issued += 1;

        match spawned {
            Ok(_) => {
                tracing::debug!(bucket, "shard fetch started");
                self.in_flight.insert(bucket.to_string(), Instant::now());
                LoadStatus::Pending
            }
            Err(source) => {
                let err = ShardError::LoadFailure {
                    bucket: bucket.to_string(),
                    source,
                };
                LoadStatus::Ready(self.fail(bucket, err))
            }
        }
    }

    /// Cached shard, if loaded
    pub fn get(&self, bucket: &str) -> Option<Arc<Shard>> {
        self.cache.get(bucket).cloned()
    }

    pub fn is_loading(&self, bucket: &str) -> bool {
        self.in_flight.contains_key(bucket)
    }

    /// When the in-flight fetch for `bucket` was started
    pub fn in_flight_since(&self, bucket: &str) -> Option<Instant> {
        self.in_flight.get(bucket).copied()
    }

    /// Drain finished fetches without blocking. Returns the buckets that
    /// became available.
    pub fn poll(&mut self) -> Vec<String> {
        let mut ready = Vec::new();
        while let Ok(outcome) = self.rx.try_recv() {
            ready.push(self.complete(outcome));
        }
        ready
    }

    /// Block up to `timeout` for at least one fetch to finish, then drain.
    pub fn wait(&mut self, timeout: Duration) -> Vec<String> {
        if self.in_flight.is_empty() {
            return self.poll();
        }

        match self.rx.recv_timeout(timeout) {
            Ok(outcome) => {
                let mut ready = vec![self.complete(outcome)];
                ready.extend(self.poll());
                ready
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => Vec::new(),
        }
    }

    /// Load a shard and block until it is available. On timeout an empty
    /// shard is returned (and not cached, so a late arrival still lands).
    pub fn load_blocking(&mut self, bucket: &str, timeout: Duration) -> Arc<Shard> {
        if let LoadStatus::Ready(shard) = self.load(bucket) {
            return shard;
        }

        let deadline = Instant::now() + timeout;
        loop {
            if let Some(shard) = self.get(bucket) {
                return shard;
            }
            let now = Instant::now();
            if now >= deadline {
                tracing::warn!(bucket, "shard load timed out");
                return Arc::new(Shard::empty(bucket));
            }
            self.wait(deadline - now);
        }
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            fetches_issued: self.fetches_issued,
            failures: self.failures,
            cached: self.cache.len(),
            in_flight: self.in_flight.len(),
        }
    }

    fn complete(&mut self, outcome: FetchOutcome) -> String {
        let FetchOutcome { bucket, result } = outcome;
        self.in_flight.remove(&bucket);

        match result {
            Ok(shard) => {
                tracing::debug!(bucket = %bucket, entries = shard.len(), "shard loaded");
                self.insert(&bucket, shard);
            }
            Err(err) => {
                self.fail(&bucket, err);
            }
        }
        bucket
    }

    fn fail(&mut self, bucket: &str, err: ShardError) -> Arc<Shard> {
        tracing::warn!(bucket, error = %err, "substituting empty shard");
        self.failures += 1;
        self.insert(bucket, Shard::empty(bucket))
    }

    fn insert(&mut self, bucket: &str, shard: Shard) -> Arc<Shard> {
        Arc::clone(
            self.cache
                .entry(bucket.to_string())
                .or_insert_with(|| Arc::new(shard)),
        )
    }
}
