//! Query shaping for the two search tiers.

use crate::config::SearchConfig;
use regex::Regex;
use std::sync::LazyLock;

/// Anything that is not a letter, digit, whitespace or the wildcard marker.
static NON_QUERY_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\p{L}\p{N}\s*]").unwrap());

/// Strip a free-text query down to letters, digits, whitespace and `*`.
///
/// Stripped characters become spaces, so `DrawString()` and `Draw-String` both keep
/// their words apart.
pub fn sanitize_query(query: &str) -> String {
    NON_QUERY_CHARS
        .replace_all(query, " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Build an FTS5 match expression from a free-text query.
///
/// Terms are lowercased and joined with implicit AND. Without an explicit wildcard every
/// term becomes a prefix match:
/// - "Draw" → `draw*`
/// - "draw string" → `draw* string*`
/// - "Draw*" → `draw*`
/// - "draw line*" → `draw line*` (the caller placed the wildcard)
///
/// Returns an empty string when nothing searchable is left.
pub fn build_fts5_query(search_term: &str) -> String {
    let cleaned = sanitize_query(&search_term.to_lowercase());
    if !cleaned.chars().any(char::is_alphanumeric) {
        return String::new();
    }

    let explicit_wildcard = cleaned.contains(SearchConfig::WILDCARD);
    let mut query_parts = Vec::new();

    for term in cleaned.split_whitespace() {
        let word: String = term
            .chars()
            .filter(|c| *c != SearchConfig::WILDCARD)
            .collect();
        if word.is_empty() {
            continue;
        }
        // FTS5 only accepts `*` as a trailing prefix marker.
        if !explicit_wildcard || term.ends_with(SearchConfig::WILDCARD) {
            query_parts.push(format!("{}{}", word, SearchConfig::WILDCARD));
        } else {
            query_parts.push(word);
        }
    }

    query_parts.join(" ")
}

/// Split a `Module.Class` query into its trimmed module filter and name prefix.
///
/// Applies only when the query has exactly one `.` and both sides are non-empty.
pub fn parse_qualified(query: &str) -> Option<(&str, &str)> {
    let query = query.trim();
    if query.matches('.').count() != 1 {
        return None;
    }
    let (module, name) = query.split_once('.')?;
    let (module, name) = (module.trim(), name.trim());
    if module.is_empty() || name.is_empty() {
        return None;
    }
    Some((module, name))
}
