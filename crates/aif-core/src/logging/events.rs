//! Structured log vocabulary: levels, stages and stable event names.
//!
//! Event names are used as `tracing` targets so JSONL consumers can filter
//! on a fixed set of strings.

use serde::{Deserialize, Serialize};

/// Log levels for events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<tracing::Level> for Level {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::TRACE => Level::Trace,
            tracing::Level::DEBUG => Level::Debug,
            tracing::Level::INFO => Level::Info,
            tracing::Level::WARN => Level::Warn,
            tracing::Level::ERROR => Level::Error,
        }
    }
}

/// Phases of one perception-action cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Startup and configuration.
    Init,
    /// State inference from an observation.
    Infer,
    /// Policy inference over actions.
    Decide,
    /// Action sampling.
    Act,
    /// Online learning of the model.
    Learn,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Init => "init",
            Stage::Infer => "infer",
            Stage::Decide => "decide",
            Stage::Act => "act",
            Stage::Learn => "learn",
        };
        write!(f, "{}", s)
    }
}

/// Standard event names used in logging.
pub mod event_names {
    // Run lifecycle
    pub const RUN_STARTED: &str = "run.started";
    pub const RUN_FINISHED: &str = "run.finished";

    // Engine lifecycle
    pub const ENGINE_CREATED: &str = "engine.created";
    pub const BELIEFS_RESET: &str = "engine.beliefs_reset";

    // Infer stage
    pub const INFER_FINISHED: &str = "infer.finished";
    pub const INFER_SURPRISE_HIGH: &str = "infer.surprise_high";

    // Decide / act stages
    pub const POLICY_INFERRED: &str = "policy.inferred";
    pub const ACTION_SELECTED: &str = "action.selected";

    // Learn stage
    pub const LEARN_A_UPDATED: &str = "learn.a_updated";

    // Config/init events
    pub const CONFIG_LOADED: &str = "config.loaded";
    pub const CONFIG_DEFAULT_USED: &str = "config.default_used";

    // Error events
    pub const EVENT_HANDLER_FAILED: &str = "events.handler_failed";
    pub const INPUT_REJECTED: &str = "input.rejected";
}
