//! Configuration resolution.
//!
//! Resolution order for a masking setting:
//! 1. Scope-specific override key, when its value is non-blank
//! 2. General masking key, when its value is non-blank
//! 3. No source (blank value, built-in defaults apply downstream)

use crate::{
    ConfigError, PropertySource, Result, ROW_MAX_LENGTH, SECRET_MASKING_REGEX,
    SECRET_MASKING_REGEX_ENVIRONMENT,
};
use pc_common::is_blank;
use serde::Serialize;

/// Where a masking setting came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SettingSource {
    /// The scope-specific override key.
    ScopeOverride,
    /// The general masking key.
    General,
    /// Nothing configured.
    #[default]
    BuiltinDefault,
}

impl std::fmt::Display for SettingSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingSource::ScopeOverride => write!(f, "scope override"),
            SettingSource::General => write!(f, "general key"),
            SettingSource::BuiltinDefault => write!(f, "builtin default"),
        }
    }
}

/// A raw masking value together with the key it was read from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MaskingSetting {
    /// Property name the value was read from; empty when nothing is configured.
    pub source_key: String,
    /// The raw, unparsed value; empty when nothing is configured.
    pub raw: String,
    pub source: SettingSource,
}

impl MaskingSetting {
    /// Resolve a masking setting, preferring `override_key` over the general key.
    pub fn resolve(props: &dyn PropertySource, override_key: Option<&str>) -> Self {
        if let Some(key) = override_key {
            let value = props.get(key);
            if !is_blank(value.as_deref()) {
                return Self {
                    source_key: key.to_string(),
                    raw: value.unwrap_or_default(),
                    source: SettingSource::ScopeOverride,
                };
            }
        }

        let value = props.get(SECRET_MASKING_REGEX);
        if !is_blank(value.as_deref()) {
            return Self {
                source_key: SECRET_MASKING_REGEX.to_string(),
                raw: value.unwrap_or_default(),
                source: SettingSource::General,
            };
        }

        Self::default()
    }

    /// The raw value, or `None` when nothing is configured.
    pub fn raw_value(&self) -> Option<&str> {
        if self.raw.is_empty() {
            None
        } else {
            Some(&self.raw)
        }
    }
}

/// Resolved capture configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaptureConfig {
    /// Masking used for headers and other general key/value maps.
    pub masking: MaskingSetting,
    /// Masking used for the process environment snapshot.
    pub environment_masking: MaskingSetting,
    /// Character budget for one serialized result-set row.
    pub row_max_length: usize,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            masking: MaskingSetting::default(),
            environment_masking: MaskingSetting::default(),
            row_max_length: usize::MAX,
        }
    }
}

impl CaptureConfig {
    /// Resolve configuration from a property source.
    ///
    /// Invalid values are logged and replaced by their defaults.
    pub fn resolve(props: &dyn PropertySource) -> Self {
        let row_max_length = match parse_max_length(props.get(ROW_MAX_LENGTH).as_deref()) {
            Ok(len) => len,
            Err(err) => {
                tracing::warn!(error = %err, "ignoring row length budget, using unbounded");
                usize::MAX
            }
        };

        Self {
            masking: MaskingSetting::resolve(props, None),
            environment_masking: MaskingSetting::resolve(
                props,
                Some(SECRET_MASKING_REGEX_ENVIRONMENT),
            ),
            row_max_length,
        }
    }

    /// Resolve configuration from the process environment.
    pub fn from_env() -> Self {
        Self::resolve(&crate::EnvProperties)
    }
}

/// Parse the row budget. Blank means unbounded; negative values clamp to zero.
pub fn parse_max_length(raw: Option<&str>) -> Result<usize> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(usize::MAX);
    };

    let value: i64 = raw.parse().map_err(|_| ConfigError::InvalidInteger {
        key: ROW_MAX_LENGTH.to_string(),
        value: raw.to_string(),
    })?;

    Ok(usize::try_from(value.max(0)).unwrap_or(usize::MAX))
}
