/// Normalized form of raw query text
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Normalized {
    /// Lower-cased, whitespace-separated tokens in input order
    pub tokens: Vec<String>,
    /// Tokens joined with a single space
    pub joined: String,
}

impl Normalized {
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Normalize raw query text into comparable tokens.
///
/// Surrounding whitespace is trimmed, ASCII letters are lower-cased, and the
/// text is split on runs of whitespace. Empty tokens never appear in the
/// output, so feeding `joined` back in yields the same value.
pub fn normalize(raw: &str) -> Normalized {
    let tokens: Vec<String> = raw
        .split_whitespace()
        .map(fold_case)
        .collect();
    let joined = tokens.join(" ");

    Normalized { tokens, joined }
}

/// ASCII case folding shared by query tokens and index keys.
/// Non-ASCII characters pass through untouched, so byte offsets are stable.
pub fn fold_case(s: &str) -> String {
    s.to_ascii_lowercase()
}
