//! Shard sources and payload builders for unit tests.

use crate::error::ShardError;
use crate::index::decode::{escape_search_id, variable_name};
use crate::index::store::ShardSource;
use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Mutex;

/// Build a shard payload from `(key, url, label)` rows
pub fn shard_payload(bucket: &str, rows: &[(&str, &str, &str)]) -> String {
    let rows: Vec<(&str, &str, &str, Option<&str>)> =
        rows.iter().map(|&(k, u, l)| (k, u, l, None)).collect();
    shard_payload_with_categories(bucket, &rows)
}

/// Build a shard payload from `(key, url, label, category)` rows
pub fn shard_payload_with_categories(
    bucket: &str,
    rows: &[(&str, &str, &str, Option<&str>)],
) -> String {
    let mut out = format!("var {}=\n[\n", variable_name(bucket));
    for (i, (key, url, label, category)) in rows.iter().enumerate() {
        let occ = match category {
            Some(cat) => format!("['{}','{}','{}']", url, label, cat),
            None => format!("['{}','{}']", url, label),
        };
        out.push_str(&format!("  ['{}_{}',{}],\n", escape_search_id(key), i, occ));
    }
    // No trailing comma before the closing bracket
    if out.ends_with(",\n") {
        out.truncate(out.len() - 2);
        out.push('\n');
    }
    out.push_str("];\n");
    out
}

fn not_found(bucket: &str) -> ShardError {
    ShardError::LoadFailure {
        bucket: bucket.to_string(),
        source: io::Error::new(io::ErrorKind::NotFound, "no such shard"),
    }
}

/// In-memory source that answers immediately and counts fetches
pub struct MemorySource {
    payloads: HashMap<String, String>,
    calls: AtomicUsize,
}

impl MemorySource {
    pub fn new<const N: usize>(payloads: [(&str, String); N]) -> Self {
        Self {
            payloads: payloads
                .into_iter()
                .map(|(b, p)| (b.to_string(), p))
                .collect(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ShardSource for MemorySource {
    fn fetch(&self, bucket: &str) -> Result<String, ShardError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.payloads.get(bucket).cloned().ok_or_else(|| not_found(bucket))
    }
}

/// In-memory source whose fetches block until the test releases them
pub struct GatedSource {
    payloads: HashMap<String, String>,
    gates: Mutex<HashMap<String, Receiver<()>>>,
    releases: Mutex<HashMap<String, Sender<()>>>,
    calls: AtomicUsize,
}

impl GatedSource {
    pub fn new<const N: usize>(payloads: [(&str, String); N]) -> Self {
        let mut gates = HashMap::new();
        let mut releases = HashMap::new();
        let payloads: HashMap<String, String> = payloads
            .into_iter()
            .map(|(b, p)| (b.to_string(), p))
            .collect();

        for bucket in payloads.keys() {
            let (tx, rx) = mpsc::channel();
            gates.insert(bucket.clone(), rx);
            releases.insert(bucket.clone(), tx);
        }

        Self {
            payloads,
            gates: Mutex::new(gates),
            releases: Mutex::new(releases),
            calls: AtomicUsize::new(0),
        }
    }

    /// Let the pending (or next) fetch of `bucket` complete
    pub fn release(&self, bucket: &str) {
        if let Some(tx) = self.releases.lock().unwrap().get(bucket) {
            let _ = tx.send(());
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ShardSource for GatedSource {
    fn fetch(&self, bucket: &str) -> Result<String, ShardError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let gate = self.gates.lock().unwrap().remove(bucket);
        if let Some(gate) = gate {
            let _ = gate.recv();
        }

        self.payloads.get(bucket).cloned().ok_or_else(|| not_found(bucket))
    }
}
