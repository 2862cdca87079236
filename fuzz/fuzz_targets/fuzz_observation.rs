//! Fuzz target for observation input lines.
//!
//! Arbitrary bytes are parsed the way the CLI parses them; any observation
//! that parses must either be rejected cleanly or keep beliefs valid.

#![no_main]

use aif_core::inference::BELIEF_TOLERANCE;
use aif_core::{Engine, Observation};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(obs) = serde_json::from_slice::<Observation>(data) else {
        return;
    };

    let mut engine = Engine::with_defaults();
    let before = engine.beliefs();
    match engine.step(&obs) {
        Ok(_) => assert!(engine.beliefs().is_valid(BELIEF_TOLERANCE)),
        Err(_) => assert_eq!(engine.beliefs(), before),
    }
});
