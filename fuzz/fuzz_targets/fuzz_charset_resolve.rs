//! Fuzz target for content-type charset resolution and decoding.

#![no_main]

use libfuzzer_sys::fuzz_target;
use pc_core::charset;

fuzz_target!(|data: &[u8]| {
    let header = String::from_utf8_lossy(data);
    let resolved = charset::resolve(Some(&header));
    assert!(!resolved.name().is_empty());
    let _ = resolved.decode(data);
});
