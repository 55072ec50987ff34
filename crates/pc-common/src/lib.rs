//! Shared types for payload capture.
//!
//! This crate provides:
//! - The attribute names written onto observability records
//! - The [`AttributeSink`] seam through which captured text leaves the core
//! - An in-memory [`RecordedAttributes`] sink for tests and diagnostics
//! - Small string helpers shared by the configuration and redaction crates

pub mod attributes;
pub mod sink;
pub mod strings;

pub use attributes::AttributeKey;
pub use sink::{AttributeSink, AttributeValue, RecordedAttributes};
pub use strings::is_blank;
