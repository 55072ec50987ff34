//! Fuzz target for chunked-body retrieval through a bridge.

#![no_main]

use libfuzzer_sys::fuzz_target;
use pc_core::BridgeRegistry;

fuzz_target!(|data: &[u8]| {
    let registry = BridgeRegistry::new();
    registry.open(0u8);
    registry.observe_headers(&0, [("Transfer-Encoding", "chunked")]);
    for chunk in data.chunks(7) {
        registry.append_payload(&0, chunk);
    }
    let _ = registry.get_payload(&0);
    assert!(registry.get_payload(&0).is_none());
});
