//! Per-keystroke query orchestration.
//!
//! A [`QuerySession`] owns the query state, the shard store and a renderer.
//! Every input event gets a new sequence number; shard loads are issued in
//! the background and the session keeps accepting input while they run.
//! When loads complete the result is computed for the request that issued
//! them and rendered only if that request's sequence number is still the
//! current one. Older results are dropped, whatever order they arrive in.

use crate::index::bucket::BucketRouter;
use crate::index::store::IndexShardStore;
use crate::index::types::Shard;
use crate::query::aggregate::{aggregate, ResultSet};
use crate::query::matcher::match_shards;
use crate::utils::{normalize, AppConfig};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Granularity of blocking waits
const WAIT_TICK: Duration = Duration::from_millis(20);

/// Engine parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub bucket_prefix_len: usize,
    pub max_routed_tokens: usize,
    pub per_category_cap: usize,
    pub total_cap: usize,
    pub load_timeout: Duration,
    pub result_cache_size: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for SessionConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            bucket_prefix_len: config.bucket_prefix_len,
            max_routed_tokens: config.max_routed_tokens,
            per_category_cap: config.per_category_cap,
            total_cap: config.total_cap,
            load_timeout: Duration::from_millis(config.load_timeout_ms),
            result_cache_size: config.result_cache_size,
        }
    }
}

/// Session state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No query text
    Idle,
    /// Waiting for shards needed by the current query
    Pending,
    /// Results shown for the latest resolved query
    Displaying,
}

/// Query state, mutated only in response to input events
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryState {
    /// Incremented for every query that changes the normalized text
    pub seq: u64,
    pub raw: String,
    pub tokens: Vec<String>,
    pub joined: String,
    /// Position in the flattened result list
    pub cursor: usize,
}

/// What a renderer gets to paint
#[derive(Debug, Clone, Copy)]
pub struct ResultView<'a> {
    pub seq: u64,
    pub query: &'a str,
    pub results: &'a ResultSet,
    pub cursor: usize,
    /// Some shards timed out and were treated as empty
    pub degraded: bool,
}

/// Narrow interface to whatever paints results
pub trait Renderer {
    /// Results or cursor changed
    fn render(&mut self, view: &ResultView<'_>);
    /// Query was cleared
    fn clear(&mut self);
}

/// Renderer that ignores everything; callers read the session directly
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn render(&mut self, _view: &ResultView<'_>) {}
    fn clear(&mut self) {}
}

/// Session counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub queries_issued: u64,
    pub stale_discarded: u64,
    pub memo_hits: u64,
    pub timeouts: u64,
}

struct PendingRequest {
    seq: u64,
    tokens: Vec<String>,
    joined: String,
    buckets: Vec<String>,
}

/// Incremental search session
pub struct QuerySession<R: Renderer> {
    store: IndexShardStore,
    router: BucketRouter,
    config: SessionConfig,
    renderer: R,
    query: QueryState,
    state: SessionState,
    results: Arc<ResultSet>,
    degraded: bool,
    outstanding: Vec<PendingRequest>,
    memo: LruCache<String, Arc<ResultSet>>,
    stats: SessionStats,
}

impl<R: Renderer> QuerySession<R> {
    pub fn new(store: IndexShardStore, config: SessionConfig, renderer: R) -> Self {
        // The generator's routing wins over local configuration
        let prefix_len = store
            .manifest()
            .map(|m| m.prefix_len)
            .unwrap_or(config.bucket_prefix_len);
        let router = BucketRouter::new(prefix_len, config.max_routed_tokens);
        let memo_size = NonZeroUsize::new(config.result_cache_size).unwrap_or(NonZeroUsize::MIN);

        Self {
            store,
            router,
            config,
            renderer,
            query: QueryState::default(),
            state: SessionState::Idle,
            results: Arc::new(ResultSet::default()),
            degraded: false,
            outstanding: Vec::new(),
            memo: LruCache::new(memo_size),
            stats: SessionStats::default(),
        }
    }

    /// Handle new query text (the full input, not a single key)
    pub fn on_input(&mut self, raw: &str) {
        let normalized = normalize(raw);
        self.query.raw = raw.to_string();

        if normalized.is_empty() {
            if self.state != SessionState::Idle || !self.query.joined.is_empty() {
                self.clear();
            }
            return;
        }

        if normalized.joined == self.query.joined {
            return;
        }

        self.query.seq += 1;
        self.query.tokens = normalized.tokens;
        self.query.joined = normalized.joined;
        self.stats.queries_issued += 1;

        let seq = self.query.seq;

        if let Some(cached) = self.memo.get(&self.query.joined) {
            let cached = Arc::clone(cached);
            self.stats.memo_hits += 1;
            tracing::debug!(seq, query = %self.query.joined, "memoized result");
            self.display(cached, false);
            return;
        }

        let buckets = self.router.route(&self.query.tokens, self.store.manifest());
        tracing::debug!(seq, query = %self.query.joined, ?buckets, "query issued");

        for bucket in &buckets {
            self.store.load(bucket);
        }

        self.outstanding.push(PendingRequest {
            seq,
            tokens: self.query.tokens.clone(),
            joined: self.query.joined.clone(),
            buckets,
        });
        self.state = SessionState::Pending;
        self.resolve();
    }

    /// Process finished shard loads and expired timeouts. Call from the
    /// event loop; never blocks.
    pub fn poll(&mut self) {
        self.store.poll();
        self.resolve();
    }

    /// Block until the current query is no longer pending or `timeout`
    /// elapses. Returns the resulting state.
    pub fn wait(&mut self, timeout: Duration) -> SessionState {
        let deadline = Instant::now() + timeout;
        loop {
            self.poll();
            if self.state != SessionState::Pending {
                return self.state;
            }
            let now = Instant::now();
            if now >= deadline {
                return self.state;
            }
            self.store.wait((deadline - now).min(WAIT_TICK));
        }
    }

    /// Requests (current or superseded) still waiting for shards
    pub fn has_outstanding(&self) -> bool {
        !self.outstanding.is_empty()
    }

    /// Move the cursor by `delta`, clamping at both ends. Ignored unless
    /// results are displayed: while a query is pending the cursor stays on
    /// the row that is painted.
    pub fn move_cursor(&mut self, delta: isize) {
        let len = self.results.len();
        let target = if len == 0 {
            0
        } else {
            self.query
                .cursor
                .saturating_add_signed(delta)
                .min(len - 1)
        };
        self.set_cursor(target);
    }

    pub fn cursor_first(&mut self) {
        self.set_cursor(0);
    }

    pub fn cursor_last(&mut self) {
        self.set_cursor(self.results.len().saturating_sub(1));
    }

    /// URL of the result under the cursor
    pub fn activate(&self) -> Option<&str> {
        self.results
            .get(self.query.cursor)
            .map(|hit| hit.occurrence.url.as_str())
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn query(&self) -> &QueryState {
        &self.query
    }

    pub fn seq(&self) -> u64 {
        self.query.seq
    }

    pub fn cursor(&self) -> usize {
        self.query.cursor
    }

    pub fn results(&self) -> &ResultSet {
        &self.results
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    pub fn store(&self) -> &IndexShardStore {
        &self.store
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    fn clear(&mut self) {
        // Bumping the sequence number turns every outstanding request stale
        self.query.seq += 1;
        self.query.tokens.clear();
        self.query.joined.clear();
        self.query.cursor = 0;
        self.results = Arc::new(ResultSet::default());
        self.degraded = false;
        self.state = SessionState::Idle;
        self.renderer.clear();
    }

    fn resolve(&mut self) {
        if self.outstanding.is_empty() {
            return;
        }

        let now = Instant::now();
        let timeout = self.config.load_timeout;
        let mut waiting = Vec::new();

        for req in std::mem::take(&mut self.outstanding) {
            let missing: Vec<String> = req
                .buckets
                .iter()
                .filter(|b| self.store.get(b).is_none())
                .cloned()
                .collect();

            if missing.is_empty() {
                self.finish(req, false);
                continue;
            }

            let expired = missing.iter().all(|b| {
                self.store
                    .in_flight_since(b)
                    .is_none_or(|since| now.duration_since(since) >= timeout)
            });

            if expired {
                tracing::warn!(seq = req.seq, ?missing, "shard load timed out, treating as empty");
                self.stats.timeouts += 1;
                self.finish(req, true);
            } else {
                waiting.push(req);
            }
        }

        self.outstanding = waiting;
    }

    fn finish(&mut self, req: PendingRequest, degraded: bool) {
        let shards: Vec<Arc<Shard>> = req
            .buckets
            .iter()
            .map(|b| {
                self.store
                    .get(b)
                    .unwrap_or_else(|| Arc::new(Shard::empty(b.as_str())))
            })
            .collect();

        let matches = match_shards(&shards, &req.tokens);
        let results = Arc::new(aggregate(
            &matches,
            self.config.per_category_cap,
            self.config.total_cap,
        ));

        if !degraded {
            self.memo.put(req.joined.clone(), Arc::clone(&results));
        }

        if req.seq != self.query.seq {
            tracing::debug!(
                seq = req.seq,
                current = self.query.seq,
                "discarding stale result"
            );
            self.stats.stale_discarded += 1;
            return;
        }

        self.display(results, degraded);
    }

    fn display(&mut self, results: Arc<ResultSet>, degraded: bool) {
        self.results = results;
        self.degraded = degraded;
        self.query.cursor = 0;
        self.state = SessionState::Displaying;
        self.render();
    }

    fn set_cursor(&mut self, cursor: usize) {
        if self.state != SessionState::Displaying || cursor == self.query.cursor {
            return;
        }
        self.query.cursor = cursor;
        self.render();
    }

    fn render(&mut self) {
        let view = ResultView {
            seq: self.query.seq,
            query: &self.query.joined,
            results: &self.results,
            cursor: self.query.cursor,
            degraded: self.degraded,
        };
        self.renderer.render(&view);
    }
}
