//! Redaction rule parsing.
//!
//! A masking configuration value is one of:
//! - blank: the default patterns apply
//! - the magic value (`all`, case-insensitive): everything is masked
//! - a JSON array of regular expressions, e.g. `["secret.*","token"]`
//!
//! Anything else is reported once and replaced by the default patterns.

use crate::defaults::{DEFAULT_PATTERNS, DEFAULT_REGEX_KEYS, MASK_ALL_MAGIC};
use crate::{Result, RuleParseError};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How a rule set masks entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedactionMode {
    /// Every entry is sensitive; the whole map collapses to the mask.
    MaskAll,
    /// Entries whose key matches any pattern are masked.
    PatternList,
}

impl std::fmt::Display for RedactionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RedactionMode::MaskAll => write!(f, "mask_all"),
            RedactionMode::PatternList => write!(f, "pattern_list"),
        }
    }
}

/// Compiled redaction rules.
///
/// `patterns` is never empty in [`RedactionMode::PatternList`].
#[derive(Debug, Clone)]
pub struct RedactionRuleSet {
    source_key: String,
    raw: String,
    mode: RedactionMode,
    patterns: Vec<Regex>,
}

impl RedactionRuleSet {
    /// A rule set that masks everything.
    pub fn mask_all(source_key: impl Into<String>, raw: impl Into<String>) -> Self {
        Self {
            source_key: source_key.into(),
            raw: raw.into(),
            mode: RedactionMode::MaskAll,
            patterns: Vec::new(),
        }
    }

    /// The built-in pattern rules.
    pub fn builtin() -> Self {
        Self {
            source_key: String::new(),
            raw: String::new(),
            mode: RedactionMode::PatternList,
            patterns: DEFAULT_PATTERNS.clone(),
        }
    }

    /// Configuration key the rules were parsed from (empty when none).
    pub fn source_key(&self) -> &str {
        &self.source_key
    }

    /// The raw configuration value the rules were parsed from.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn mode(&self) -> RedactionMode {
        self.mode
    }

    pub fn patterns(&self) -> &[Regex] {
        &self.patterns
    }

    /// Pattern sources, in order.
    pub fn pattern_sources(&self) -> Vec<&str> {
        self.patterns.iter().map(|p| p.as_str()).collect()
    }

    /// Whether a value stored under `key` must be masked.
    ///
    /// Patterns match anywhere within the key.
    pub fn is_sensitive_key(&self, key: &str) -> bool {
        match self.mode {
            RedactionMode::MaskAll => true,
            RedactionMode::PatternList => self.patterns.iter().any(|p| p.is_match(key)),
        }
    }
}

/// Parses masking configuration values into rule sets.
#[derive(Debug, Clone)]
pub struct RuleParser {
    magic: Option<String>,
    defaults: Vec<String>,
}

impl RuleParser {
    /// A parser without a magic value, falling back to `defaults`.
    pub fn new<I, S>(defaults: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            magic: None,
            defaults: defaults.into_iter().map(Into::into).collect(),
        }
    }

    /// The parser used for secret masking: magic value `all`, built-in defaults.
    pub fn masking() -> Self {
        Self::new(DEFAULT_REGEX_KEYS.iter().copied()).with_magic(MASK_ALL_MAGIC)
    }

    /// Set the magic value that selects [`RedactionMode::MaskAll`].
    pub fn with_magic(mut self, magic: impl Into<String>) -> Self {
        self.magic = Some(magic.into());
        self
    }

    pub fn magic(&self) -> Option<&str> {
        self.magic.as_deref()
    }

    pub fn defaults(&self) -> &[String] {
        &self.defaults
    }

    /// Parse a raw configuration value read from `source_key`.
    ///
    /// Never fails: malformed input is logged and the defaults are used.
    pub fn parse(&self, source_key: &str, raw: Option<&str>) -> RedactionRuleSet {
        let raw_value = raw.unwrap_or_default();

        if let Some(magic) = &self.magic {
            if raw_value.eq_ignore_ascii_case(magic) {
                return RedactionRuleSet::mask_all(source_key, raw_value);
            }
        }

        if !raw_value.trim().is_empty() {
            match parse_pattern_list(raw_value) {
                Ok(patterns) if !patterns.is_empty() => {
                    return RedactionRuleSet {
                        source_key: source_key.to_string(),
                        raw: raw_value.to_string(),
                        mode: RedactionMode::PatternList,
                        patterns,
                    };
                }
                Ok(_) => {
                    tracing::warn!(
                        source_key,
                        raw = raw_value,
                        defaults = ?self.defaults,
                        "masking regex list is empty; falling back to defaults"
                    );
                }
                Err(err) => {
                    tracing::warn!(
                        source_key,
                        raw = raw_value,
                        error = %err,
                        defaults = ?self.defaults,
                        "failed to parse masking regex; {}",
                        self.expected_format()
                    );
                }
            }
        }

        RedactionRuleSet {
            source_key: source_key.to_string(),
            raw: raw_value.to_string(),
            mode: RedactionMode::PatternList,
            patterns: self.compile_defaults(),
        }
    }

    fn expected_format(&self) -> String {
        match &self.magic {
            Some(magic) => format!(
                "it must either be {:?} or a stringified JSON array of regular expressions, e.g. '[\"a.*\",\"b.*\"]'",
                magic
            ),
            None => "it must be a stringified JSON array of regular expressions, e.g. '[\"a.*\",\"b.*\"]'"
                .to_string(),
        }
    }

    /// Compile the caller's defaults; the built-in set backs up an unusable list.
    fn compile_defaults(&self) -> Vec<Regex> {
        let compiled: Vec<Regex> = self
            .defaults
            .iter()
            .filter_map(|p| match compile(p) {
                Ok(re) => Some(re),
                Err(err) => {
                    tracing::warn!(error = %err, "skipping invalid default masking pattern");
                    None
                }
            })
            .collect();

        if compiled.is_empty() {
            DEFAULT_PATTERNS.clone()
        } else {
            compiled
        }
    }
}

impl Default for RuleParser {
    fn default() -> Self {
        Self::masking()
    }
}

/// Parse `raw` with an optional magic value and explicit defaults.
pub fn parse_rules(raw: Option<&str>, magic: Option<&str>, defaults: &[&str]) -> RedactionRuleSet {
    let mut parser = RuleParser::new(defaults.iter().copied());
    if let Some(magic) = magic {
        parser = parser.with_magic(magic);
    }
    parser.parse("", raw)
}

/// Strictly parse a JSON array of regular expressions.
///
/// Every element must be a string and every string must compile.
pub fn parse_pattern_list(raw: &str) -> Result<Vec<Regex>> {
    let value: Value = serde_json::from_str(raw)?;
    let Value::Array(items) = value else {
        return Err(RuleParseError::NotAnArray);
    };

    let mut patterns: Vec<Regex> = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let Value::String(pattern) = item else {
            return Err(RuleParseError::NonStringElement { index });
        };
        if patterns.iter().any(|p| p.as_str() == pattern) {
            continue;
        }
        patterns.push(compile(pattern)?);
    }
    Ok(patterns)
}

/// Compile one case-insensitive pattern.
pub(crate) fn compile(pattern: &str) -> Result<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|source| RuleParseError::InvalidRegex {
            pattern: pattern.to_string(),
            source,
        })
}
