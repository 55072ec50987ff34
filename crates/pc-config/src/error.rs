//! Error types for configuration resolution.

use thiserror::Error;

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur while reading a configuration value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A property expected to hold an integer did not.
    #[error("invalid integer for {key}: {value:?}")]
    InvalidInteger { key: String, value: String },
}
