//! Active inference engine configuration loading and validation.
//!
//! This crate provides:
//! - The typed [`EngineConfig`] with documented defaults
//! - Config resolution (CLI → env → XDG → system → defaults)
//! - Semantic validation (positive temperatures, bounded iterations)
//! - Config snapshots for reproducibility

pub mod engine;
pub mod load;
pub mod resolve;
pub mod snapshot;
pub mod validate;

pub use engine::{EngineConfig, LearningRule};
pub use load::{load_config, LoadedConfig};
pub use resolve::{resolve_config, ConfigSource, ResolvedPath};
pub use snapshot::ConfigSnapshot;
pub use validate::{validate_engine_config, ValidationError, ValidationResult};

/// Schema version for configuration files.
pub const CONFIG_SCHEMA_VERSION: &str = "1.0.0";
