//! Property sources.
//!
//! Properties are named in dotted form (`lumigo.secret.masking.regex`). A source
//! backed by environment variables also answers to the upper-case underscore form
//! (`LUMIGO_SECRET_MASKING_REGEX`).

use std::collections::HashMap;

/// A read-only view over configuration properties.
pub trait PropertySource {
    /// Raw value of a property, if set.
    fn get(&self, name: &str) -> Option<String>;
}

/// Convert a dotted property name to its environment variable form.
///
/// `.` and `-` become `_`, letters are upper-cased.
pub fn env_var_name(property: &str) -> String {
    property
        .chars()
        .map(|c| match c {
            '.' | '-' => '_',
            c => c.to_ascii_uppercase(),
        })
        .collect()
}

/// Properties read from the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvProperties;

impl EnvProperties {
    pub fn new() -> Self {
        EnvProperties
    }
}

impl PropertySource for EnvProperties {
    fn get(&self, name: &str) -> Option<String> {
        std::env::var(name)
            .ok()
            .or_else(|| std::env::var(env_var_name(name)).ok())
    }
}

/// Properties from an explicit key/value map.
///
/// Lookups try the dotted name first, then the environment variable form, so a
/// map built from `std::env::vars()` behaves like [`EnvProperties`].
#[derive(Debug, Clone, Default)]
pub struct MapProperties {
    values: HashMap<String, String>,
}

impl MapProperties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a property.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MapProperties {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl PropertySource for MapProperties {
    fn get(&self, name: &str) -> Option<String> {
        self.values
            .get(name)
            .or_else(|| self.values.get(&env_var_name(name)))
            .cloned()
    }
}
