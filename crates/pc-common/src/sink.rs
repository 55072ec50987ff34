//! The seam between captured payloads and the observability record.
//!
//! The core never owns a span; it only writes attributes through an
//! [`AttributeSink`] supplied by the transport adapter.

use crate::AttributeKey;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;

/// Value of an attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Text(String),
    TextList(Vec<String>),
}

impl AttributeValue {
    /// The text value, if this is a single string.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(s) => Some(s),
            AttributeValue::TextList(_) => None,
        }
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::Text(value)
    }
}

impl From<Vec<String>> for AttributeValue {
    fn from(value: Vec<String>) -> Self {
        AttributeValue::TextList(value)
    }
}

/// Anything that can receive attributes: a span, a log record, a test recorder.
///
/// Implementations must not panic; capture code calls this from arbitrary
/// transport threads.
pub trait AttributeSink: Send + Sync {
    fn set_attribute(&self, key: AttributeKey, value: AttributeValue);
}

impl<T: AttributeSink + ?Sized> AttributeSink for Arc<T> {
    fn set_attribute(&self, key: AttributeKey, value: AttributeValue) {
        (**self).set_attribute(key, value)
    }
}

impl<T: AttributeSink + ?Sized> AttributeSink for &T {
    fn set_attribute(&self, key: AttributeKey, value: AttributeValue) {
        (**self).set_attribute(key, value)
    }
}

/// In-memory sink that keeps every write, in order.
#[derive(Debug, Default)]
pub struct RecordedAttributes {
    writes: Mutex<Vec<(AttributeKey, AttributeValue)>>,
}

impl RecordedAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recent value written under `key`.
    pub fn get(&self, key: AttributeKey) -> Option<AttributeValue> {
        self.writes
            .lock()
            .iter()
            .rev()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.clone())
    }

    /// The most recent text value written under `key`.
    pub fn text(&self, key: AttributeKey) -> Option<String> {
        self.get(key).and_then(|v| v.as_text().map(str::to_string))
    }

    /// How many times `key` was written.
    pub fn write_count(&self, key: AttributeKey) -> usize {
        self.writes.lock().iter().filter(|(k, _)| *k == key).count()
    }

    /// Snapshot of every write so far.
    pub fn entries(&self) -> Vec<(AttributeKey, AttributeValue)> {
        self.writes.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.writes.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.lock().is_empty()
    }
}

impl AttributeSink for RecordedAttributes {
    fn set_attribute(&self, key: AttributeKey, value: AttributeValue) {
        self.writes.lock().push((key, value));
    }
}
