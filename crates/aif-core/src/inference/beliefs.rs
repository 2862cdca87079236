//! Beliefs, observations and supervised true states.

use aif_math::{argmax, entropy, is_distribution};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{Channel, Factor, GenerativeModel, NUM_FACTORS};

/// Tolerance for the sum-to-one invariant on belief vectors.
pub const BELIEF_TOLERANCE: f64 = 1e-6;

/// Categorical beliefs over every hidden-state factor.
///
/// Each vector has its factor's cardinality and is a distribution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Beliefs {
    viability: Vec<f64>,
    world_state: Vec<f64>,
    coupling: Vec<f64>,
    goal_progress: Vec<f64>,
}

impl Beliefs {
    /// Beliefs equal to the model's prior D.
    pub fn from_prior(model: &GenerativeModel) -> Self {
        Self {
            viability: model.prior(Factor::Viability).to_vec(),
            world_state: model.prior(Factor::WorldState).to_vec(),
            coupling: model.prior(Factor::Coupling).to_vec(),
            goal_progress: model.prior(Factor::GoalProgress).to_vec(),
        }
    }

    /// Build from per-factor vectors indexed by [`Factor::index`].
    pub fn new(factors: [Vec<f64>; NUM_FACTORS]) -> Result<Self> {
        for factor in Factor::ALL {
            let q = &factors[factor.index()];
            if q.len() != factor.cardinality() {
                return Err(Error::InvalidBeliefs {
                    factor,
                    message: format!("expected {} entries, got {}", factor.cardinality(), q.len()),
                });
            }
            if !is_distribution(q, BELIEF_TOLERANCE) {
                return Err(Error::InvalidBeliefs {
                    factor,
                    message: "not a probability distribution".to_string(),
                });
            }
        }
        let [viability, world_state, coupling, goal_progress] = factors;
        Ok(Self {
            viability,
            world_state,
            coupling,
            goal_progress,
        })
    }

    /// Belief vector for `factor`.
    pub fn factor(&self, factor: Factor) -> &[f64] {
        match factor {
            Factor::Viability => &self.viability,
            Factor::WorldState => &self.world_state,
            Factor::Coupling => &self.coupling,
            Factor::GoalProgress => &self.goal_progress,
        }
    }

    pub(crate) fn set(&mut self, factor: Factor, q: Vec<f64>) {
        debug_assert_eq!(q.len(), factor.cardinality());
        match factor {
            Factor::Viability => self.viability = q,
            Factor::WorldState => self.world_state = q,
            Factor::Coupling => self.coupling = q,
            Factor::GoalProgress => self.goal_progress = q,
        }
    }

    /// Iterate `(factor, vector)` pairs in factor order.
    pub fn iter(&self) -> impl Iterator<Item = (Factor, &[f64])> + '_ {
        Factor::ALL.into_iter().map(move |f| (f, self.factor(f)))
    }

    /// Shannon entropy of one factor's belief, in nats.
    pub fn entropy(&self, factor: Factor) -> f64 {
        entropy(self.factor(factor))
    }

    /// Whether every factor vector is a distribution within `tol`.
    pub fn is_valid(&self, tol: f64) -> bool {
        self.iter()
            .all(|(f, q)| q.len() == f.cardinality() && is_distribution(q, tol))
    }

    /// Argmax label for every factor.
    pub fn most_likely(&self) -> MostLikelyState {
        let label = |f: Factor| {
            argmax(self.factor(f))
                .and_then(|i| f.label(i))
                .unwrap_or(f.labels()[0])
        };
        MostLikelyState {
            viability: label(Factor::Viability),
            world_state: label(Factor::WorldState),
            coupling: label(Factor::Coupling),
            goal_progress: label(Factor::GoalProgress),
        }
    }
}

/// Most probable label per factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MostLikelyState {
    pub viability: &'static str,
    pub world_state: &'static str,
    pub coupling: &'static str,
    pub goal_progress: &'static str,
}

impl MostLikelyState {
    pub fn get(&self, factor: Factor) -> &'static str {
        match factor {
            Factor::Viability => self.viability,
            Factor::WorldState => self.world_state,
            Factor::Coupling => self.coupling,
            Factor::GoalProgress => self.goal_progress,
        }
    }
}

impl std::fmt::Display for MostLikelyState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "viability={} world_state={} coupling={} goal_progress={}",
            self.viability, self.world_state, self.coupling, self.goal_progress
        )
    }
}

/// One discrete reading per observation channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Observation {
    pub energy: usize,
    pub phi: usize,
    #[serde(alias = "toolOutcome")]
    pub tool_outcome: usize,
    pub coherence: usize,
    pub task: usize,
}

impl Observation {
    pub fn new(energy: usize, phi: usize, tool_outcome: usize, coherence: usize, task: usize) -> Self {
        Self {
            energy,
            phi,
            tool_outcome,
            coherence,
            task,
        }
    }

    /// Reading for `channel`.
    pub fn get(&self, channel: Channel) -> usize {
        match channel {
            Channel::Energy => self.energy,
            Channel::Phi => self.phi,
            Channel::ToolOutcome => self.tool_outcome,
            Channel::Coherence => self.coherence,
            Channel::Task => self.task,
        }
    }

    /// Reject any reading outside its channel's range.
    pub fn validate(&self) -> Result<()> {
        for channel in Channel::ALL {
            let index = self.get(channel);
            if index >= channel.cardinality() {
                return Err(Error::ObservationOutOfRange {
                    channel,
                    index,
                    cardinality: channel.cardinality(),
                });
            }
        }
        Ok(())
    }
}

/// Partial ground-truth assignment used for supervised A learning.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrueState {
    pub viability: Option<usize>,
    #[serde(alias = "worldState")]
    pub world_state: Option<usize>,
    pub coupling: Option<usize>,
    #[serde(alias = "goalProgress")]
    pub goal_progress: Option<usize>,
}

impl TrueState {
    /// Set the known state of `factor`.
    pub fn with(mut self, factor: Factor, index: usize) -> Self {
        match factor {
            Factor::Viability => self.viability = Some(index),
            Factor::WorldState => self.world_state = Some(index),
            Factor::Coupling => self.coupling = Some(index),
            Factor::GoalProgress => self.goal_progress = Some(index),
        }
        self
    }

    pub fn get(&self, factor: Factor) -> Option<usize> {
        match factor {
            Factor::Viability => self.viability,
            Factor::WorldState => self.world_state,
            Factor::Coupling => self.coupling,
            Factor::GoalProgress => self.goal_progress,
        }
    }

    /// Reject any supervised state outside its factor's range.
    pub fn validate(&self) -> Result<()> {
        for factor in Factor::ALL {
            if let Some(index) = self.get(factor) {
                if index >= factor.cardinality() {
                    return Err(Error::TrueStateOutOfRange {
                        factor,
                        index,
                        cardinality: factor.cardinality(),
                    });
                }
            }
        }
        Ok(())
    }
}
