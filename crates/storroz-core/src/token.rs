//! Text tokenization and hashtag name normalization.
//!
//! One tokenizer serves all three search fields so that indexing and
//! querying agree: lowercase, split on non-alphanumeric boundaries,
//! drop empty tokens.

/// Splits text into lowercase alphanumeric tokens.
///
/// `"Hello, World!"` tokenizes to `["hello", "world"]`.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Normalizes a hashtag name: trims whitespace, strips a leading '#',
/// and lowercases. Returns `None` for names that are empty after
/// normalization.
pub fn normalize_hashtag(name: &str) -> Option<String> {
    let normalized = name.trim().trim_start_matches('#').to_lowercase();
    if normalized.is_empty() {
        None
    } else {
        Some(normalized)
    }
}
