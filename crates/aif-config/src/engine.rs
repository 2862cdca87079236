//! Engine configuration types.
//!
//! Every field has a documented default; a config file only needs to name
//! the fields it overrides. Both snake_case and the camelCase spellings used
//! by JSON producers are accepted for the core tuning knobs.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::validate::{ValidationError, ValidationResult};

/// Default number of extra mean-field passes after the first.
pub const DEFAULT_INFERENCE_ITERATIONS: u32 = 16;

/// Default softmax temperature over negative EFE.
pub const DEFAULT_ACTION_TEMPERATURE: f64 = 1.0;

/// Default pseudo-count added per supervised observation.
pub const DEFAULT_LEARNING_RATE_A: f64 = 0.05;

/// Default surprise (nats) above which `surprise_high` fires.
pub const DEFAULT_SURPRISE_THRESHOLD: f64 = 5.0;

/// Default total pseudo-count per likelihood column for Dirichlet learning.
pub const DEFAULT_DIRICHLET_CONCENTRATION: f64 = 10.0;

/// How supervised feedback updates the likelihood (A) matrices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LearningRule {
    /// Add the learning rate to the observed cell, then renormalize the column.
    #[default]
    Counting,
    /// Keep Dirichlet pseudo-counts per column; A is their posterior mean.
    Dirichlet,
}

impl std::fmt::Display for LearningRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LearningRule::Counting => write!(f, "counting"),
            LearningRule::Dirichlet => write!(f, "dirichlet"),
        }
    }
}

impl std::str::FromStr for LearningRule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "counting" | "count" => Ok(LearningRule::Counting),
            "dirichlet" => Ok(LearningRule::Dirichlet),
            _ => Err(format!("unknown learning rule: {}", s)),
        }
    }
}

/// Tuning parameters for an active inference engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Extra fixed-point passes of the mean-field update (0 = single pass).
    #[serde(alias = "inferenceIterations")]
    pub inference_iterations: u32,

    /// Softmax temperature applied to `-EFE` when forming the policy.
    #[serde(alias = "actionTemperature")]
    pub action_temperature: f64,

    /// Increment applied by online learning of the A matrices.
    #[serde(alias = "learningRateA")]
    pub learning_rate_a: f64,

    /// Surprise (nats) above which a high-surprise event is emitted.
    #[serde(alias = "surpriseThreshold")]
    pub surprise_threshold: f64,

    /// Online learning rule for the A matrices.
    #[serde(alias = "learningRule")]
    pub learning_rule: LearningRule,

    /// Column pseudo-count total used when `learning_rule = dirichlet`.
    #[serde(alias = "dirichletConcentration")]
    pub dirichlet_concentration: f64,

    /// Seed for the action sampler. Unset means OS entropy.
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            inference_iterations: DEFAULT_INFERENCE_ITERATIONS,
            action_temperature: DEFAULT_ACTION_TEMPERATURE,
            learning_rate_a: DEFAULT_LEARNING_RATE_A,
            surprise_threshold: DEFAULT_SURPRISE_THRESHOLD,
            learning_rule: LearningRule::default(),
            dirichlet_concentration: DEFAULT_DIRICHLET_CONCENTRATION,
            seed: None,
        }
    }
}

impl EngineConfig {
    /// Parse from JSON text.
    pub fn from_json_str(content: &str) -> ValidationResult<Self> {
        serde_json::from_str(content).map_err(|e| ValidationError::ParseError(e.to_string()))
    }

    /// Parse from TOML text.
    pub fn from_toml_str(content: &str) -> ValidationResult<Self> {
        toml::from_str(content).map_err(|e| ValidationError::ParseError(e.to_string()))
    }

    /// Parse `content` using the format implied by `path`'s extension.
    ///
    /// `.toml` is TOML; `.json` or no extension is JSON.
    pub fn from_str_for_path(path: &Path, content: &str) -> ValidationResult<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml_str(content),
            Some("json") | None => Self::from_json_str(content),
            Some(other) => Err(ValidationError::UnsupportedFormat(other.to_string())),
        }
    }

    /// Read and parse a config file. Does not validate semantics.
    pub fn from_file(path: &Path) -> ValidationResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ValidationError::IoError(format!("{}: {}", path.display(), e)))?;
        Self::from_str_for_path(path, &content)
    }

    /// Set the inference iteration count.
    pub fn with_inference_iterations(mut self, iterations: u32) -> Self {
        self.inference_iterations = iterations;
        self
    }

    /// Set the action temperature.
    pub fn with_action_temperature(mut self, temperature: f64) -> Self {
        self.action_temperature = temperature;
        self
    }

    /// Set the A-matrix learning rate.
    pub fn with_learning_rate_a(mut self, rate: f64) -> Self {
        self.learning_rate_a = rate;
        self
    }

    /// Set the high-surprise threshold (nats).
    pub fn with_surprise_threshold(mut self, threshold: f64) -> Self {
        self.surprise_threshold = threshold;
        self
    }

    /// Set the learning rule.
    pub fn with_learning_rule(mut self, rule: LearningRule) -> Self {
        self.learning_rule = rule;
        self
    }

    /// Fix the sampler seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.inference_iterations, 16);
        assert_eq!(config.action_temperature, 1.0);
        assert_eq!(config.learning_rate_a, 0.05);
        assert_eq!(config.surprise_threshold, 5.0);
        assert_eq!(config.learning_rule, LearningRule::Counting);
        assert!(config.seed.is_none());
    }

    #[test]
    fn test_partial_json_merges_over_defaults() {
        let config = EngineConfig::from_json_str(r#"{"inference_iterations": 3}"#).unwrap();
        assert_eq!(config.inference_iterations, 3);
        assert_eq!(config.action_temperature, DEFAULT_ACTION_TEMPERATURE);
    }

    #[test]
    fn test_camel_case_aliases() {
        let config = EngineConfig::from_json_str(
            r#"{"inferenceIterations": 0, "actionTemperature": 0.5, "learningRateA": 0.2}"#,
        )
        .unwrap();
        assert_eq!(config.inference_iterations, 0);
        assert_eq!(config.action_temperature, 0.5);
        assert_eq!(config.learning_rate_a, 0.2);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = EngineConfig::from_json_str(r#"{"inference_iteration": 3}"#).unwrap_err();
        assert!(matches!(err, ValidationError::ParseError(_)));
    }

    #[test]
    fn test_toml() {
        let config = EngineConfig::from_toml_str(
            "action_temperature = 2.0\nlearning_rule = \"dirichlet\"\nseed = 7\n",
        )
        .unwrap();
        assert_eq!(config.action_temperature, 2.0);
        assert_eq!(config.learning_rule, LearningRule::Dirichlet);
        assert_eq!(config.seed, Some(7));
    }

    #[test]
    fn test_format_from_extension() {
        let err = EngineConfig::from_str_for_path(Path::new("engine.yaml"), "").unwrap_err();
        assert!(matches!(err, ValidationError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_learning_rule_parse() {
        assert_eq!("counting".parse::<LearningRule>().unwrap(), LearningRule::Counting);
        assert_eq!("Dirichlet".parse::<LearningRule>().unwrap(), LearningRule::Dirichlet);
        assert!("bayes".parse::<LearningRule>().is_err());
        assert_eq!(LearningRule::Dirichlet.to_string(), "dirichlet");
    }
}
