//! Configuration loading for aif-core.
//!
//! Thin layer over `aif_config`: resolves and validates the engine config
//! and records where it came from in the log.

pub use aif_config::{
    load_config, validate_engine_config, ConfigSnapshot, ConfigSource, EngineConfig,
    LearningRule, LoadedConfig, ValidationError, CONFIG_SCHEMA_VERSION,
};

use std::path::Path;

use crate::error::Result;
use crate::logging::event_names;

/// Load the engine config (CLI path, env, XDG, system, defaults) and log
/// its provenance.
pub fn load_engine_config(cli_path: Option<&Path>) -> Result<LoadedConfig> {
    let loaded = load_config(cli_path)?;
    match &loaded.path {
        Some(path) => tracing::info!(
            target: event_names::CONFIG_LOADED,
            path = %path.display(),
            source = %loaded.source,
            hash = loaded.snapshot.short_id(),
            "config loaded"
        ),
        None => tracing::debug!(
            target: event_names::CONFIG_DEFAULT_USED,
            "no config file found, using defaults"
        ),
    }
    Ok(loaded)
}
