//! Key/value scrubbing.
//!
//! The output is JSON text with every double quote backslash-escaped, so it can
//! be stored as a single string attribute.

use crate::{RedactionMode, RedactionRuleSet, SCRUBBED_VALUE};
use serde_json::Value;
use std::borrow::Cow;

/// Applies a [`RedactionRuleSet`] to key/value maps.
#[derive(Debug, Clone)]
pub struct Scrubber {
    rules: RedactionRuleSet,
}

impl Scrubber {
    pub fn new(rules: RedactionRuleSet) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &RedactionRuleSet {
        &self.rules
    }

    /// Mask one value according to its key.
    pub fn redact_value<'a>(&self, key: &str, value: &'a str) -> Cow<'a, str> {
        if self.rules.is_sensitive_key(key) {
            Cow::Borrowed(SCRUBBED_VALUE)
        } else {
            Cow::Borrowed(value)
        }
    }

    /// Scrub `entries`, in iteration order, into escaped JSON text.
    ///
    /// In [`RedactionMode::MaskAll`] the result is the mask itself, whatever
    /// the entries are.
    pub fn scrub<I, K, V>(&self, entries: I) -> String
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        if self.rules.mode() == RedactionMode::MaskAll {
            return SCRUBBED_VALUE.to_string();
        }

        let mut json = String::from("{");
        for (i, (key, value)) in entries.into_iter().enumerate() {
            let key = key.as_ref();
            if i > 0 {
                json.push(',');
            }
            json.push_str(&Value::from(key).to_string());
            json.push(':');
            let value = self.redact_value(key, value.as_ref());
            json.push_str(&Value::from(&*value).to_string());
        }
        json.push('}');

        escape_for_attribute(&json)
    }
}

/// Scrub `entries` with `rules`.
pub fn scrub<I, K, V>(entries: I, rules: &RedactionRuleSet) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    Scrubber::new(rules.clone()).scrub(entries)
}

/// Backslash-escape every double quote.
pub fn escape_for_attribute(json: &str) -> String {
    json.replace('"', "\\\"")
}
