use serde::{Deserialize, Serialize};

/// One hit contributed by a key: a link plus the text shown for it
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Occurrence {
    /// Anchor target, may carry a `#fragment`
    pub url: String,
    /// Human-readable label (entity-decoded)
    pub label: String,
    /// Grouping label such as "page" or "struct member"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl Occurrence {
    pub fn new(url: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            label: label.into(),
            category: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

/// A normalized search key and the places it occurs, in generator order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchEntry {
    pub key: String,
    pub occurrences: Vec<Occurrence>,
}

impl SearchEntry {
    pub fn new(key: impl Into<String>, occurrences: Vec<Occurrence>) -> Self {
        Self {
            key: key.into(),
            occurrences,
        }
    }
}

/// Immutable bucket-partitioned slice of the search index.
///
/// Entries are sorted ascending by key and keys are unique. Both properties
/// are established by [`Shard::from_entries`]; there is no way to mutate a
/// shard afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Shard {
    bucket: String,
    entries: Vec<SearchEntry>,
}

impl Shard {
    /// Empty shard, substituted for missing or undecodable resources
    pub fn empty(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            entries: Vec::new(),
        }
    }

    /// Build a shard from decoded entries.
    ///
    /// Entries are stable-sorted by key, entries sharing a key are merged
    /// (occurrences concatenated in order) and entries without occurrences
    /// are dropped.
    pub fn from_entries(bucket: impl Into<String>, mut entries: Vec<SearchEntry>) -> Self {
        entries.retain(|e| !e.occurrences.is_empty());

        if !entries.windows(2).all(|w| w[0].key <= w[1].key) {
            entries.sort_by(|a, b| a.key.cmp(&b.key));
        }

        let mut merged: Vec<SearchEntry> = Vec::with_capacity(entries.len());
        for entry in entries {
            match merged.last_mut() {
                Some(last) if last.key == entry.key => {
                    last.occurrences.extend(entry.occurrences);
                }
                _ => merged.push(entry),
            }
        }

        Self {
            bucket: bucket.into(),
            entries: merged,
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn entries(&self) -> &[SearchEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Exact key lookup (keys are sorted, so this is a binary search)
    pub fn get(&self, key: &str) -> Option<&SearchEntry> {
        self.entries
            .binary_search_by(|e| e.key.as_str().cmp(key))
            .ok()
            .map(|i| &self.entries[i])
    }
}
