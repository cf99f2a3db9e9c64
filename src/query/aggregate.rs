use crate::index::types::Occurrence;
use crate::query::matcher::Match;
use ahash::AHashSet;
use serde::Serialize;

/// One rendered result: an occurrence plus the key it was found under
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Hit {
    pub occurrence: Occurrence,
    /// Normalized key of the matching entry
    pub key: String,
    /// Byte offset of the first query token in `key`
    pub offset: usize,
}

/// Hits sharing a category label
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultGroup {
    pub category: Option<String>,
    pub hits: Vec<Hit>,
}

/// Categorized result set, groups in order of first appearance
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResultSet {
    pub groups: Vec<ResultGroup>,
}

impl ResultSet {
    /// Total number of hits across groups
    pub fn len(&self) -> usize {
        self.groups.iter().map(|g| g.hits.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.iter().all(|g| g.hits.is_empty())
    }

    /// Hit at a position of the flattened, category-ordered list
    pub fn get(&self, index: usize) -> Option<&Hit> {
        self.iter().nth(index)
    }

    /// Flattened, category-ordered iteration
    pub fn iter(&self) -> impl Iterator<Item = &Hit> {
        self.groups.iter().flat_map(|g| g.hits.iter())
    }
}

/// Group matched occurrences by category.
///
/// - categories appear in order of first appearance among the matches
/// - within a category, hits follow match order
/// - a category holding `per_category_cap` hits drops further ones
/// - aggregation stops after `total_cap` hits overall
/// - a repeated `(url, label)` within a category keeps the first
pub fn aggregate(matches: &[Match<'_>], per_category_cap: usize, total_cap: usize) -> ResultSet {
    let mut groups: Vec<ResultGroup> = Vec::new();
    let mut seen: Vec<AHashSet<(&str, &str)>> = Vec::new();
    let mut total = 0;

    'outer: for m in matches {
        for occ in &m.entry.occurrences {
            if total >= total_cap {
                break 'outer;
            }

            let idx = match groups.iter().position(|g| g.category == occ.category) {
                Some(idx) => idx,
                None => {
                    groups.push(ResultGroup {
                        category: occ.category.clone(),
                        hits: Vec::new(),
                    });
                    seen.push(AHashSet::new());
                    groups.len() - 1
                }
            };

            if groups[idx].hits.len() >= per_category_cap {
                continue;
            }
            if !seen[idx].insert((occ.url.as_str(), occ.label.as_str())) {
                continue;
            }

            groups[idx].hits.push(Hit {
                occurrence: occ.clone(),
                key: m.entry.key.clone(),
                offset: m.offset,
            });
            total += 1;
        }
    }

    groups.retain(|g| !g.hits.is_empty());
    ResultSet { groups }
}
