//! Payload capture configuration loading and resolution.
//!
//! This crate provides:
//! - [`PropertySource`] implementations over the process environment and explicit maps
//! - Resolution of the masking-regex settings (scope override → general key → none)
//! - The row serialization budget
//!
//! Configuration is resolved once into a [`CaptureConfig`] and handed to the
//! capture runtime explicitly.

pub mod error;
pub mod resolve;
pub mod source;

pub use error::{ConfigError, Result};
pub use resolve::{CaptureConfig, MaskingSetting, SettingSource};
pub use source::{env_var_name, EnvProperties, MapProperties, PropertySource};

/// General masking configuration key.
pub const SECRET_MASKING_REGEX: &str = "lumigo.secret.masking.regex";

/// Masking configuration key for the process environment snapshot.
pub const SECRET_MASKING_REGEX_ENVIRONMENT: &str = "lumigo.secret.masking.regex.environment";

/// Maximum length of a serialized result-set row.
pub const ROW_MAX_LENGTH: &str = "otel.instrumentation.jdbc.attribute-value-max-length";
