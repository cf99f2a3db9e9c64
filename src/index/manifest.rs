use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::ops::Bound;
use std::path::Path;

pub const MANIFEST_FILE: &str = "manifest.json";

/// Enumeration of the bucket keys a generator produced shards for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Number of leading characters the generator routed keys by
    pub prefix_len: usize,
    /// Valid bucket keys
    pub buckets: BTreeSet<String>,
}

impl Manifest {
    pub fn new(prefix_len: usize, buckets: impl IntoIterator<Item = String>) -> Self {
        Self {
            prefix_len,
            buckets: buckets.into_iter().collect(),
        }
    }

    /// Load `manifest.json` from a docs directory. Returns `Ok(None)` when
    /// the directory has no manifest.
    pub fn load(dir: &Path) -> Result<Option<Self>> {
        let path = dir.join(MANIFEST_FILE);
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let manifest: Manifest = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(Some(manifest))
    }

    pub fn contains(&self, bucket: &str) -> bool {
        self.buckets.contains(bucket)
    }

    /// Buckets whose key starts with `prefix`, in key order
    pub fn buckets_with_prefix<'a>(
        &'a self,
        prefix: &'a str,
    ) -> impl Iterator<Item = &'a str> + 'a {
        self.buckets
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(move |b| b.starts_with(prefix))
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buckets_with_prefix() {
        let manifest = Manifest::new(2, ["ma", "me", "mi", "na"].map(String::from));
        let m: Vec<&str> = manifest.buckets_with_prefix("m").collect();
        assert_eq!(m, vec!["ma", "me", "mi"]);
        assert_eq!(manifest.buckets_with_prefix("x").count(), 0);
        assert!(manifest.contains("na"));
        assert!(!manifest.contains("n"));
    }

    #[test]
    fn test_buckets_with_prefix_starts_at_prefix() {
        let manifest = Manifest::new(3, ["m", "ma", "me", "mea", "mem", "mi"].map(String::from));
        let me: Vec<&str> = manifest.buckets_with_prefix("me").collect();
        assert_eq!(me, vec!["me", "mea", "mem"]);
        assert_eq!(manifest.buckets_with_prefix("").count(), 6);
    }

    #[test]
    fn test_load_missing_and_present() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Manifest::load(dir.path()).unwrap().is_none());

        fs::write(
            dir.path().join(MANIFEST_FILE),
            r#"{"prefix_len": 1, "buckets": ["m", "a"]}"#,
        )
        .unwrap();
        let manifest = Manifest::load(dir.path()).unwrap().unwrap();
        assert_eq!(manifest.prefix_len, 1);
        assert_eq!(manifest.buckets.len(), 2);
    }

    #[test]
    fn test_load_invalid() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(MANIFEST_FILE), "{").unwrap();
        assert!(Manifest::load(dir.path()).is_err());
    }
}
