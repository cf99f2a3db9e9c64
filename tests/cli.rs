//! Integration tests for the docsearch command line.

mod common;

use common::pages_docs_dir;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn docsearch_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_docsearch"))
}

/// Run docsearch with an isolated app data directory
fn run_docsearch(args: &[&str], data_home: &Path) -> (String, String, bool) {
    let output = Command::new(docsearch_binary())
        .args(args)
        .env("XDG_DATA_HOME", data_home)
        .env("HOME", data_home)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to run docsearch");

    (
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
        output.status.success(),
    )
}

#[test]
fn test_query_json() {
    let docs = pages_docs_dir();
    let data = TempDir::new().unwrap();
    let docs_arg = docs.path().to_str().unwrap();

    let args = ["query", "mem", "map", "--json", "--docs", docs_arg];
    let (stdout, stderr, ok) = run_docsearch(&args, data.path());
    assert!(ok, "stderr: {}", stderr);

    let value: serde_json::Value = serde_json::from_str(&stdout).expect("valid JSON");
    let groups = value["groups"].as_array().unwrap();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[1]["category"], "index");
    assert_eq!(groups[1]["hits"][0]["occurrence"]["label"], "Memory mapping");
    assert_eq!(groups[1]["hits"][0]["key"], "memory mapping");
}

#[test]
fn test_trailing_query_prints_groups() {
    let docs = pages_docs_dir();
    let data = TempDir::new().unwrap();
    let docs_arg = docs.path().to_str().unwrap();

    let (stdout, stderr, ok) = run_docsearch(&["--docs", docs_arg, "memory", "pools"], data.path());
    assert!(ok, "stderr: {}", stderr);
    assert!(stdout.starts_with("Custom memory pools\n"));
    assert!(stdout.contains("  memory pools  ../custom_memory_pools.html"));
}

#[test]
fn test_query_without_results() {
    let docs = pages_docs_dir();
    let data = TempDir::new().unwrap();
    let docs_arg = docs.path().to_str().unwrap();

    let (stdout, stderr, ok) = run_docsearch(&["query", "zzz", "--docs", docs_arg], data.path());
    assert!(ok);
    assert!(stdout.is_empty());
    assert!(stderr.contains("No results"));
}

#[test]
fn test_missing_docs_dir_fails() {
    let data = TempDir::new().unwrap();
    let missing = data.path().join("nope");

    let args = ["query", "x", "--docs", missing.to_str().unwrap()];
    let (_, stderr, ok) = run_docsearch(&args, data.path());
    assert!(!ok);
    assert!(stderr.contains("Docs directory not found"));
}

#[test]
fn test_check_reports_duplicate_keys() {
    let docs = pages_docs_dir();
    let data = TempDir::new().unwrap();
    let docs_arg = docs.path().to_str().unwrap();

    // The generator emitted "memory allocator" twice
    let (stdout, _, ok) = run_docsearch(&["check", "--docs", docs_arg], data.path());
    assert!(!ok);
    assert!(stdout.contains("duplicate key 'memory allocator'"));
    assert!(stdout.contains("1 shards, 19 entries, 1 issues"));
}

#[test]
fn test_config_uses_overrides() {
    let data = TempDir::new().unwrap();

    let (stdout, stderr, ok) = run_docsearch(&["config", "--total-cap", "7"], data.path());
    assert!(ok, "stderr: {}", stderr);

    let json_start = stdout.find('{').unwrap();
    let value: serde_json::Value = serde_json::from_str(&stdout[json_start..]).unwrap();
    assert_eq!(value["total_cap"], 7);
    assert_eq!(value["per_category_cap"], 15);
}
