//! Regex redaction engine for captured key/value data.
//!
//! This crate turns a masking configuration value into a [`RedactionRuleSet`]
//! and applies it to key/value maps such as the process environment or
//! message headers.
//!
//! # Key Features
//!
//! - **Magic value**: a configured `all` masks the whole map.
//! - **JSON pattern lists**: `["secret.*","token"]`, compiled case-insensitively.
//! - **Fail-closed**: malformed configuration falls back to the built-in
//!   patterns, never to "no redaction".
//! - **Key-scoped**: patterns are tested against keys, never values.
//!
//! # Example
//!
//! ```
//! use pc_redact::{RuleParser, Scrubber};
//!
//! let rules = RuleParser::masking().parse("lumigo.secret.masking.regex", Some("[\"token\"]"));
//! let scrubbed = Scrubber::new(rules).scrub([("api_token", "abc"), ("user", "bob")]);
//! assert_eq!(scrubbed, r#"{\"api_token\":\"****\",\"user\":\"bob\"}"#);
//! ```

pub mod defaults;
pub mod error;
pub mod rules;
pub mod scrub;

pub use defaults::{DEFAULT_REGEX_KEYS, MASK_ALL_MAGIC, SCRUBBED_VALUE};
pub use error::{Result, RuleParseError};
pub use rules::{parse_pattern_list, parse_rules, RedactionMode, RedactionRuleSet, RuleParser};
pub use scrub::{escape_for_attribute, scrub, Scrubber};
