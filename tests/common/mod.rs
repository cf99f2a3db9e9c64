//! Shared fixtures for integration tests.

#![allow(dead_code)]

use docsearch::index::decode::{escape_search_id, resource_name, variable_name};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Real generator output: one shard covering every key starting with "m"
pub const PAGES_SHARD: &str = include_str!("../fixtures/pages_b.js");

/// Build a shard payload from `(key, url, label, category)` rows
pub fn shard(bucket: &str, rows: &[(&str, &str, &str, &str)]) -> String {
    let rows: Vec<String> = rows
        .iter()
        .enumerate()
        .map(|(i, (key, url, label, category))| {
            format!(
                "  ['{}_{}',['{}','{}','{}']]",
                escape_search_id(key),
                i,
                url,
                label,
                category
            )
        })
        .collect();
    format!("var {}=\n[\n{}\n];\n", variable_name(bucket), rows.join(",\n"))
}

/// Write shard files (and optionally a manifest) into a fresh directory
pub fn docs_dir(prefix_len: Option<usize>, shards: &[(&str, String)]) -> TempDir {
    let dir = TempDir::new().expect("Failed to create temp dir");

    for (bucket, payload) in shards {
        fs::write(dir.path().join(resource_name(bucket)), payload).expect("Failed to write shard");
    }

    if let Some(prefix_len) = prefix_len {
        write_manifest(dir.path(), prefix_len, shards.iter().map(|(b, _)| *b));
    }

    dir
}

pub fn write_manifest<'a>(dir: &Path, prefix_len: usize, buckets: impl Iterator<Item = &'a str>) {
    let manifest = serde_json::json!({
        "prefix_len": prefix_len,
        "buckets": buckets.collect::<Vec<_>>(),
    });
    fs::write(dir.join("manifest.json"), manifest.to_string()).expect("Failed to write manifest");
}

/// Docs tree holding the real shard under bucket "m" with one-character routing
pub fn pages_docs_dir() -> TempDir {
    docs_dir(Some(1), &[("m", PAGES_SHARD.to_string())])
}
