use crate::index::types::{SearchEntry, Shard};
use memchr::memmem;

/// An entry whose key contains every query token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match<'a> {
    pub entry: &'a SearchEntry,
    /// Byte offset of the first token's first occurrence in the key
    pub offset: usize,
}

/// Match entries against normalized tokens.
///
/// An entry matches when every token is a substring of its key. Results keep
/// the input order of `entries`; there is no relevance sorting, callers
/// that want one must sort the output themselves. No tokens means no
/// results.
pub fn match_entries<'a>(entries: &'a [SearchEntry], tokens: &[String]) -> Vec<Match<'a>> {
    let Some((first, rest)) = tokens.split_first() else {
        return Vec::new();
    };

    let first_finder = memmem::Finder::new(first.as_bytes());
    let rest_finders: Vec<memmem::Finder<'_>> = rest
        .iter()
        .map(|t| memmem::Finder::new(t.as_bytes()))
        .collect();

    entries
        .iter()
        .filter_map(|entry| {
            let key = entry.key.as_bytes();
            let offset = first_finder.find(key)?;
            rest_finders
                .iter()
                .all(|f| f.find(key).is_some())
                .then_some(Match { entry, offset })
        })
        .collect()
}

/// Match across several shards, concatenated in the given (routing) order
pub fn match_shards<'a>(shards: &'a [impl AsRef<Shard>], tokens: &[String]) -> Vec<Match<'a>> {
    shards
        .iter()
        .flat_map(|shard| match_entries(shard.as_ref().entries(), tokens))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::types::Occurrence;
    use crate::utils::normalize;
    use std::sync::Arc;

    fn entry(key: &str, url: &str, label: &str) -> SearchEntry {
        SearchEntry::new(key, vec![Occurrence::new(url, label)])
    }

    fn sample() -> Vec<SearchEntry> {
        vec![
            entry("memory allocation", "a.html#x", "Memory allocation"),
            entry("memory mapping", "b.html", "Memory mapping"),
        ]
    }

    #[test]
    fn test_and_semantics() {
        let entries = sample();
        let tokens = normalize("mem map").tokens;
        let matches = match_entries(&entries, &tokens);

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].entry.key, "memory mapping");
        assert_eq!(matches[0].offset, 0);
    }

    #[test]
    fn test_no_tokens_no_results() {
        let entries = sample();
        assert!(match_entries(&entries, &[]).is_empty());
    }

    #[test]
    fn test_preserves_input_order() {
        let entries = vec![
            entry("zeta memory", "z.html", "Zeta"),
            entry("alpha memory", "a.html", "Alpha"),
            entry("memory", "m.html", "Memory"),
        ];
        let tokens = normalize("memory").tokens;
        let keys: Vec<&str> = match_entries(&entries, &tokens)
            .iter()
            .map(|m| m.entry.key.as_str())
            .collect();
        assert_eq!(keys, vec!["zeta memory", "alpha memory", "memory"]);
    }

    #[test]
    fn test_offset_of_first_token() {
        let entries = vec![entry("persistently mapped memory", "p.html", "Persistently")];
        let tokens = normalize("mapped pers").tokens;
        let matches = match_entries(&entries, &tokens);
        assert_eq!(matches[0].offset, "persistently ".len());
    }

    #[test]
    fn test_soundness() {
        let entries = vec![
            entry("making virtual allocations", "1", "1"),
            entry("mapped memory", "2", "2"),
            entry("mapping functions", "3", "3"),
            entry("margins", "4", "4"),
            entry("memory allocator", "5", "5"),
        ];
        for query in ["ma", "ma in", "al oc", "memory", "x", "a n"] {
            let tokens = normalize(query).tokens;
            for m in match_entries(&entries, &tokens) {
                for t in &tokens {
                    assert!(m.entry.key.contains(t.as_str()), "{} !~ {}", m.entry.key, t);
                }
            }
        }
    }

    #[test]
    fn test_match_shards_concatenates_in_order() {
        let first = Arc::new(Shard::from_entries("me", vec![entry("memory map", "1", "1")]));
        let second = Arc::new(Shard::from_entries("ma", vec![entry("map memory", "2", "2")]));
        let shards = vec![first, second];

        let tokens = normalize("map mem").tokens;
        let matches = match_shards(&shards, &tokens);
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].entry.key, "memory map");
        assert_eq!(matches[1].entry.key, "map memory");
    }
}
