//! Concurrency token handling.
//!
//! The API hands out ETags inconsistently: sometimes quoted, sometimes bare,
//! sometimes with a weak-validator marker. Everything that compares or reuses
//! a token goes through [`normalize_etag`] first so that the same resource
//! revision always yields the same string.

/// If-Match value meaning "apply regardless of the current token"
pub const WILDCARD: &str = "*";

/// Canonical form of a raw ETag header value.
///
/// Trims whitespace, drops a leading `W/` weak marker, strips any embedded
/// quote characters and wraps the remainder in exactly one pair of quotes.
/// Returns `None` for a missing header or a value that is empty once
/// stripped. Idempotent.
pub fn normalize_etag(raw: Option<&str>) -> Option<String> {
    let raw = raw?.trim();
    let raw = raw.strip_prefix("W/").unwrap_or(raw);
    let token: String = raw.chars().filter(|c| *c != '"').collect();
    if token.is_empty() {
        None
    } else {
        Some(format!("\"{}\"", token))
    }
}
