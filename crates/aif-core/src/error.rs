//! Engine error type.

use aif_config::ValidationError;
use thiserror::Error;

use crate::exit_codes::ExitCode;
use crate::model::{Channel, Factor, ModelError};

/// Result alias for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the engine's public operations.
///
/// Numerical degeneracies are never errors; they are absorbed by the
/// epsilon floor and uniform fallbacks in `aif_math`.
#[derive(Error, Debug)]
pub enum Error {
    #[error("observation {channel}={index} is out of range (cardinality {cardinality})")]
    ObservationOutOfRange {
        channel: Channel,
        index: usize,
        cardinality: usize,
    },

    #[error("true state {factor}={index} is out of range (cardinality {cardinality})")]
    TrueStateOutOfRange {
        factor: Factor,
        index: usize,
        cardinality: usize,
    },

    #[error("policy has {actual} entries, expected one per action ({expected})")]
    PolicyLengthMismatch { expected: usize, actual: usize },

    #[error("invalid beliefs for {factor}: {message}")]
    InvalidBeliefs { factor: Factor, message: String },

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Config(#[from] ValidationError),
}

impl Error {
    /// Stable numeric code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            Error::ObservationOutOfRange { .. } => 30,
            Error::TrueStateOutOfRange { .. } => 31,
            Error::PolicyLengthMismatch { .. } => 32,
            Error::InvalidBeliefs { .. } => 33,
            Error::Model(_) => 40,
            Error::Config(e) => e.code(),
        }
    }

    /// Process exit code for the CLI.
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Error::ObservationOutOfRange { .. } | Error::TrueStateOutOfRange { .. } => {
                ExitCode::InputError
            }
            Error::Config(_) => ExitCode::ConfigError,
            Error::PolicyLengthMismatch { .. } | Error::InvalidBeliefs { .. } | Error::Model(_) => {
                ExitCode::InternalError
            }
        }
    }
}
