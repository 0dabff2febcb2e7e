//! Text normalization for cross-catalog matching.
//!
//! Everything that is compared by the scorer passes through [`normalize`]
//! first. The form is deliberately lossy: only lowercase ASCII letters and
//! digits survive, so "Don't Stop (Me Now)" and "dont stop me now" compare
//! identically.

use once_cell::sync::Lazy;
use regex::Regex;

// ============================================================================
// REGEX PATTERNS
// ============================================================================

/// Anything that is not a lowercase ASCII letter or digit.
pub static NON_ALNUM: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]").unwrap());

/// Word boundaries in raw text: runs of whitespace or punctuation.
/// Letters, digits, and apostrophes stay inside a token ("Don't" is one word).
pub static TOKEN_BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\p{L}\p{N}'\x{2019}]+").unwrap());

// ============================================================================
// NORMALIZATION FUNCTIONS
// ============================================================================

/// Lowercase and strip every character that is not an ASCII letter or digit.
/// e.g., "Blue Monday '88" → "bluemonday88", "Beyoncé" → "beyonc"
///
/// Empty input yields an empty string.
pub fn normalize(text: &str) -> String {
    NON_ALNUM.replace_all(&text.to_lowercase(), "").into_owned()
}

/// Split raw text on word boundaries and normalize each token.
/// Tokens that normalize to nothing (pure punctuation, non-Latin scripts) are dropped.
///
/// Concatenating the result always equals `normalize(text)`.
pub fn title_tokens(text: &str) -> Vec<String> {
    TOKEN_BOUNDARY
        .split(text)
        .map(normalize)
        .filter(|t| !t.is_empty())
        .collect()
}

/// Order-insensitive comparison key: normalized tokens, sorted, joined by a space.
/// e.g., "Title (Artist)" and "Artist - Title" both → "artist title"
pub fn sorted_token_key(text: &str) -> String {
    let mut tokens = title_tokens(text);
    tokens.sort_unstable();
    tokens.join(" ")
}

// ============================================================================
// TESTS
// ============================================================================
