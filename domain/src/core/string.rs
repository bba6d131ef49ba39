//! String utilities for the domain layer.

use std::hash::{DefaultHasher, Hash, Hasher};

/// Normalize request text for classification and cache keying:
/// trim, lowercase, collapse internal whitespace runs to single spaces.
pub fn normalize(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Stable-within-process fingerprint of normalized text, used as the
/// classification cache key.
pub fn fingerprint(s: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    normalize(s).hash(&mut hasher);
    hasher.finish()
}

/// Truncate a string to a maximum length with ellipsis (UTF-8 safe)
///
/// Uses byte length for max_len but ensures truncation occurs at valid
/// UTF-8 character boundaries.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        let target = max_len.saturating_sub(3);
        let mut end = target.min(s.len());
        while end > 0 && !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &s[..end])
    }
}

/// Truncate to at most `max_words` whitespace-separated words.
///
/// Bounds the cost of remote classification calls on very long input.
pub fn truncate_words(s: &str, max_words: usize) -> String {
    let words: Vec<&str> = s.split_whitespace().collect();
    if words.len() <= max_words {
        s.trim().to_string()
    } else {
        words[..max_words].join(" ")
    }
}
