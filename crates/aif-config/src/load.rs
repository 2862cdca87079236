//! Resolve, read, parse and validate an engine config in one call.

use std::path::{Path, PathBuf};

use crate::engine::EngineConfig;
use crate::resolve::{resolve_config, ConfigSource};
use crate::snapshot::ConfigSnapshot;
use crate::validate::{validate_engine_config, ValidationError, ValidationResult};

/// A validated config with provenance.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// The effective configuration.
    pub config: EngineConfig,
    /// File it came from (None for built-in defaults).
    pub path: Option<PathBuf>,
    /// Where the file was found.
    pub source: ConfigSource,
    /// Reproducibility snapshot.
    pub snapshot: ConfigSnapshot,
}

/// Load the engine config following the standard resolution order.
///
/// An explicit `cli_path` that does not exist is an error rather than a
/// silent fallback to defaults.
pub fn load_config(cli_path: Option<&Path>) -> ValidationResult<LoadedConfig> {
    if let Some(path) = cli_path {
        if !path.exists() {
            return Err(ValidationError::IoError(format!(
                "config file not found: {}",
                path.display()
            )));
        }
    }

    let resolved = resolve_config(cli_path);
    let Some(path) = resolved.path else {
        let config = EngineConfig::default();
        return Ok(LoadedConfig {
            snapshot: ConfigSnapshot::defaults_only(),
            config,
            path: None,
            source: ConfigSource::BuiltinDefault,
        });
    };

    let content = std::fs::read_to_string(&path)
        .map_err(|e| ValidationError::IoError(format!("{}: {}", path.display(), e)))?;
    let config = EngineConfig::from_str_for_path(&path, &content)?;
    validate_engine_config(&config)?;

    let snapshot = ConfigSnapshot::new(&config, Some(&path), resolved.source, Some(&content));
    Ok(LoadedConfig {
        config,
        path: Some(path),
        source: resolved.source,
        snapshot,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_explicit_path_is_error() {
        let err = load_config(Some(Path::new("/nonexistent/aif/engine.json"))).unwrap_err();
        assert!(matches!(err, ValidationError::IoError(_)));
    }

    #[test]
    fn test_explicit_file_loaded_and_validated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.json");
        std::fs::write(&path, r#"{"inference_iterations": 4, "seed": 11}"#).unwrap();

        let loaded = load_config(Some(&path)).unwrap();
        assert_eq!(loaded.source, ConfigSource::CliArgument);
        assert_eq!(loaded.config.inference_iterations, 4);
        assert_eq!(loaded.config.seed, Some(11));
        assert!(loaded.snapshot.file_hash.is_some());
    }

    #[test]
    fn test_invalid_semantics_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.toml");
        std::fs::write(&path, "action_temperature = -1.0\n").unwrap();

        let err = load_config(Some(&path)).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidValue { .. }));
    }
}
