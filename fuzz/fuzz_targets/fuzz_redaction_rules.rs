//! Fuzz target for masking configuration parsing.
//!
//! Whatever the input, the resulting rules must mask everything or carry at
//! least one pattern.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use pc_redact::{RedactionMode, RuleParser, Scrubber};

#[derive(Arbitrary, Debug)]
struct Input {
    raw: String,
    entries: Vec<(String, String)>,
}

fuzz_target!(|input: Input| {
    let rules = RuleParser::masking().parse("fuzz", Some(&input.raw));
    if rules.mode() == RedactionMode::PatternList {
        assert!(!rules.patterns().is_empty());
    }
    let _ = Scrubber::new(rules).scrub(input.entries);
});
