//! Online learning of the likelihood matrices (A).
//!
//! Given an observation and a (partial) ground-truth state, each channel
//! whose factor is supervised moves probability mass toward the observed
//! value in the column of the true state. Two rules are supported:
//!
//! - `counting`: `A[o][s] += η`, then renormalize column `s`
//! - `dirichlet`: column `s` is the posterior mean of pseudo-counts that
//!   start at `A[·][s] · concentration`; each update adds `η` to count `o`
//!
//! Both leave every column a valid distribution.

use aif_config::{EngineConfig, LearningRule, ValidationError};
use aif_math::dirichlet::DirichletParams;

use crate::error::Result;
use crate::inference::{Observation, TrueState};
use crate::model::{Channel, GenerativeModel};

/// Stateful A-matrix learner.
#[derive(Debug, Clone)]
pub struct LikelihoodLearner {
    rule: LearningRule,
    rate: f64,
    /// Per channel, per state column. Only populated for the Dirichlet rule.
    counts: Vec<Vec<DirichletParams>>,
}

impl LikelihoodLearner {
    /// Create a learner for `model`. The Dirichlet rule seeds its
    /// pseudo-counts from the model's current A columns.
    pub fn new(
        rule: LearningRule,
        rate: f64,
        concentration: f64,
        model: &GenerativeModel,
    ) -> Result<Self> {
        let counts = match rule {
            LearningRule::Counting => Vec::new(),
            LearningRule::Dirichlet => {
                let mut per_channel = Vec::with_capacity(Channel::ALL.len());
                for channel in Channel::ALL {
                    let a = model.likelihood(channel);
                    let mut columns = Vec::with_capacity(a.num_states());
                    for s in 0..a.num_states() {
                        let params = DirichletParams::from_mean(&a.column(s), concentration)
                            .ok_or_else(|| ValidationError::InvalidValue {
                                field: "dirichlet_concentration".to_string(),
                                message: format!("Must be positive, got {}", concentration),
                            })?;
                        columns.push(params);
                    }
                    per_channel.push(columns);
                }
                per_channel
            }
        };
        Ok(Self { rule, rate, counts })
    }

    /// Learner configured from an engine config.
    pub fn from_config(config: &EngineConfig, model: &GenerativeModel) -> Result<Self> {
        Self::new(
            config.learning_rule,
            config.learning_rate_a,
            config.dirichlet_concentration,
            model,
        )
    }

    pub fn rule(&self) -> LearningRule {
        self.rule
    }

    /// Apply one supervised update to `model`.
    ///
    /// Returns the channels whose A matrix changed.
    pub fn update(
        &mut self,
        model: &mut GenerativeModel,
        obs: &Observation,
        truth: &TrueState,
    ) -> Result<Vec<Channel>> {
        obs.validate()?;
        truth.validate()?;

        let mut updated = Vec::new();
        for channel in Channel::ALL {
            let Some(s) = truth.get(channel.factor()) else {
                continue;
            };
            let o = obs.get(channel);
            match self.rule {
                LearningRule::Counting => {
                    model.likelihood_mut(channel).reinforce(o, s, self.rate);
                }
                LearningRule::Dirichlet => {
                    let params = &mut self.counts[channel.index()][s];
                    params.observe(o, self.rate);
                    model.likelihood_mut(channel).set_column(s, &params.mean());
                }
            }
            updated.push(channel);
        }
        Ok(updated)
    }
}
