//! Configuration validation errors and semantic validation.

use thiserror::Error;

use crate::engine::EngineConfig;

/// Validation result type.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Upper bound on mean-field passes; beyond this a config is almost
/// certainly a typo rather than a tuning choice.
pub const MAX_INFERENCE_ITERATIONS: u32 = 1000;

/// Configuration validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Unsupported config format: .{0} (expected .json or .toml)")]
    UnsupportedFormat(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl ValidationError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            ValidationError::IoError(_) => 60,
            ValidationError::ParseError(_) => 61,
            ValidationError::UnsupportedFormat(_) => 62,
            ValidationError::InvalidValue { .. } => 65,
        }
    }
}

/// Validate an engine configuration semantically.
pub fn validate_engine_config(config: &EngineConfig) -> ValidationResult<()> {
    if config.inference_iterations > MAX_INFERENCE_ITERATIONS {
        return Err(ValidationError::InvalidValue {
            field: "inference_iterations".to_string(),
            message: format!(
                "Must be at most {}, got {}",
                MAX_INFERENCE_ITERATIONS, config.inference_iterations
            ),
        });
    }

    validate_positive("action_temperature", config.action_temperature)?;
    validate_positive("learning_rate_a", config.learning_rate_a)?;
    validate_positive("surprise_threshold", config.surprise_threshold)?;
    validate_positive("dirichlet_concentration", config.dirichlet_concentration)?;

    Ok(())
}

/// Require a finite, strictly positive value.
fn validate_positive(field: &str, value: f64) -> ValidationResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ValidationError::InvalidValue {
            field: field.to_string(),
            message: format!("Must be positive and finite, got {}", value),
        });
    }
    Ok(())
}
