//! Built-in masking patterns and sentinels.

use once_cell::sync::Lazy;
use regex::Regex;

/// Configuration value that masks an entire map.
pub const MASK_ALL_MAGIC: &str = "all";

/// Replacement for a masked value, and for a fully masked map.
pub const SCRUBBED_VALUE: &str = "****";

/// Patterns applied when nothing (or nothing valid) is configured.
pub const DEFAULT_REGEX_KEYS: &[&str] = &[
    ".*pass.*",
    ".*key.*",
    ".*secret.*",
    ".*credential.*",
    ".*passphrase.*",
    ".*token.*",
    "SessionToken",
    "x-amz-security-token",
    "Signature",
    "Credential",
    "Authorization",
];

// Pre-compiled built-in patterns
pub(crate) static DEFAULT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    DEFAULT_REGEX_KEYS
        .iter()
        .map(|p| crate::rules::compile(p).unwrap())
        .collect()
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_compile() {
        assert_eq!(DEFAULT_PATTERNS.len(), DEFAULT_REGEX_KEYS.len());
    }

    #[test]
    fn test_defaults_case_insensitive() {
        assert!(DEFAULT_PATTERNS.iter().any(|p| p.is_match("DB_PASSWORD")));
        assert!(DEFAULT_PATTERNS.iter().any(|p| p.is_match("authorization")));
        assert!(!DEFAULT_PATTERNS.iter().any(|p| p.is_match("HOME")));
    }

    #[test]
    fn test_sentinels_distinct() {
        assert_ne!(SCRUBBED_VALUE, MASK_ALL_MAGIC);
        assert_eq!(SCRUBBED_VALUE.chars().count(), 4);
    }
}
