//! Fuzz target for bounded row serialization.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use pc_core::{RowField, RowSerializer};

#[derive(Arbitrary, Debug)]
struct Input {
    budget: u16,
    fields: Vec<(String, String)>,
}

fuzz_target!(|input: Input| {
    let budget = usize::from(input.budget).max(2);
    let fields: Vec<RowField> = input
        .fields
        .into_iter()
        .map(|(name, value)| RowField::new(name, value))
        .collect();
    let row = RowSerializer::new(budget).serialize_row(&fields);
    assert!(row.chars().count() <= budget);
});
