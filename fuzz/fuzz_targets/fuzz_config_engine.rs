//! Fuzz target for engine configuration parsing.
//!
//! JSON and TOML parsing followed by validation must only ever return
//! errors, and anything that validates must build an engine.

#![no_main]

use aif_config::{validate_engine_config, EngineConfig};
use aif_core::Engine;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    for parsed in [EngineConfig::from_json_str(text), EngineConfig::from_toml_str(text)] {
        let Ok(config) = parsed else {
            continue;
        };
        if validate_engine_config(&config).is_ok() {
            assert!(Engine::new(config).is_ok());
        }
    }
});
