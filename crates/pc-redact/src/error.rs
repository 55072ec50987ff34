//! Error types for rule parsing.

use thiserror::Error;

/// Result type for rule parsing.
pub type Result<T> = std::result::Result<T, RuleParseError>;

/// Why a masking configuration value was rejected.
#[derive(Error, Debug)]
pub enum RuleParseError {
    /// The value is valid JSON but not an array.
    #[error("expected a JSON array of regular expressions")]
    NotAnArray,

    /// An array element is not a string.
    #[error("element {index} is not a string")]
    NonStringElement { index: usize },

    /// The value is not valid JSON (includes unterminated arrays).
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// A pattern failed to compile.
    #[error("invalid regex {pattern:?}: {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}
