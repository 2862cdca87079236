//! Generative model: hidden-state factors, observation channels, actions
//! and the A/B/C/D tables that tie them together.
//!
//! Conventions:
//! - `A[channel][o][s] = P(o | s)`; every column `A[·][s]` sums to 1
//! - `B[factor][next][current][action]`; every `(current, action)` column sums to 1
//! - `C[channel]` holds unnormalized log-preferences over observation values
//! - `D[factor]` is the normalized prior used at construction and on reset
//!
//! [`GenerativeModel::new`] is the single place where these invariants are
//! checked; the engine only ever mutates A through renormalizing updates.

pub mod builder;
pub mod likelihood;
pub mod transition;

pub use builder::{default_model, ModelBuilder, A_FIDELITY, B_STAY};
pub use likelihood::LikelihoodMatrix;
pub use transition::TransitionTensor;

use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

/// Number of hidden-state factors.
pub const NUM_FACTORS: usize = 4;

/// Number of observation channels.
pub const NUM_CHANNELS: usize = 5;

/// Tolerance used when checking that a column is a distribution.
pub const STOCHASTIC_TOLERANCE: f64 = 1e-6;

/// Hidden-state factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Factor {
    Viability,
    WorldState,
    Coupling,
    GoalProgress,
}

impl Factor {
    pub const ALL: [Factor; NUM_FACTORS] = [
        Factor::Viability,
        Factor::WorldState,
        Factor::Coupling,
        Factor::GoalProgress,
    ];

    /// Position in [`Factor::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Factor::Viability => "viability",
            Factor::WorldState => "world_state",
            Factor::Coupling => "coupling",
            Factor::GoalProgress => "goal_progress",
        }
    }

    /// Human-readable state labels in index order.
    pub fn labels(self) -> &'static [&'static str] {
        match self {
            Factor::Viability => &["critical", "low", "medium", "high", "optimal"],
            Factor::WorldState => &["stable", "volatile", "hostile", "favorable"],
            Factor::Coupling => &["isolated", "weak", "moderate", "strong", "entrained"],
            Factor::GoalProgress => &["blocked", "slow", "on_track", "achieved"],
        }
    }

    pub fn cardinality(self) -> usize {
        self.labels().len()
    }

    /// Label of state `index`, if in range.
    pub fn label(self, index: usize) -> Option<&'static str> {
        self.labels().get(index).copied()
    }

    /// Index of the state called `label`.
    pub fn state_index(self, label: &str) -> Option<usize> {
        self.labels().iter().position(|l| *l == label)
    }
}

impl std::fmt::Display for Factor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Observation channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Energy,
    Phi,
    ToolOutcome,
    Coherence,
    Task,
}

impl Channel {
    pub const ALL: [Channel; NUM_CHANNELS] = [
        Channel::Energy,
        Channel::Phi,
        Channel::ToolOutcome,
        Channel::Coherence,
        Channel::Task,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Channel::Energy => "energy",
            Channel::Phi => "phi",
            Channel::ToolOutcome => "tool_outcome",
            Channel::Coherence => "coherence",
            Channel::Task => "task",
        }
    }

    /// Number of discrete observation values.
    pub fn cardinality(self) -> usize {
        match self {
            Channel::Energy => 5,
            Channel::Phi => 4,
            Channel::ToolOutcome => 3,
            Channel::Coherence => 5,
            Channel::Task => 4,
        }
    }

    /// Factor whose states index the columns of this channel's A matrix.
    pub fn factor(self) -> Factor {
        match self {
            Channel::Energy => Factor::Viability,
            Channel::Phi => Factor::WorldState,
            Channel::ToolOutcome | Channel::Coherence => Factor::Coupling,
            Channel::Task => Factor::GoalProgress,
        }
    }

    /// Secondary factor that also receives this channel's log-likelihood.
    ///
    /// Only coherence has one: its row is added to viability as well, which
    /// relies on coupling and viability sharing a cardinality.
    pub fn cross_factor(self) -> Option<Factor> {
        match self {
            Channel::Coherence => Some(Factor::Viability),
            _ => None,
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Discrete action available to the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Idle,
    Rest,
    Explore,
    Exploit,
    Communicate,
    Reflect,
}

impl Action {
    pub const COUNT: usize = 6;

    pub const ALL: [Action; Action::COUNT] = [
        Action::Idle,
        Action::Rest,
        Action::Explore,
        Action::Exploit,
        Action::Communicate,
        Action::Reflect,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Action> {
        Action::ALL.get(index).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            Action::Idle => "idle",
            Action::Rest => "rest",
            Action::Explore => "explore",
            Action::Exploit => "exploit",
            Action::Communicate => "communicate",
            Action::Reflect => "reflect",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .iter()
            .copied()
            .find(|a| a.name() == s.to_lowercase())
            .ok_or_else(|| format!("unknown action: {}", s))
    }
}

/// Shape or stochasticity violation in a generative model.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("{table}: expected {expected} but got {actual}")]
    Shape {
        table: String,
        expected: String,
        actual: String,
    },

    #[error("{table}: column {column} sums to {sum}, expected 1")]
    NotStochastic {
        table: String,
        column: String,
        sum: f64,
    },

    #[error("{table}: entry {entry} is {value}; entries must be finite and non-negative")]
    InvalidEntry {
        table: String,
        entry: String,
        value: f64,
    },

    #[error("invalid model parameter {name}: {message}")]
    InvalidParameter { name: String, message: String },
}

/// The agent's generative model.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerativeModel {
    a: [LikelihoodMatrix; NUM_CHANNELS],
    b: [TransitionTensor; NUM_FACTORS],
    c: [Vec<f64>; NUM_CHANNELS],
    d: [Vec<f64>; NUM_FACTORS],
}

impl GenerativeModel {
    /// Assemble a model, checking every table against the factor and
    /// channel cardinalities.
    ///
    /// Tables are indexed by [`Channel::index`] and [`Factor::index`].
    pub fn new(
        a: [LikelihoodMatrix; NUM_CHANNELS],
        b: [TransitionTensor; NUM_FACTORS],
        c: [Vec<f64>; NUM_CHANNELS],
        d: [Vec<f64>; NUM_FACTORS],
    ) -> Result<Self, ModelError> {
        for channel in Channel::ALL {
            let matrix = &a[channel.index()];
            let expected = (channel.cardinality(), channel.factor().cardinality());
            let actual = (matrix.num_observations(), matrix.num_states());
            if expected != actual {
                return Err(ModelError::Shape {
                    table: format!("A[{}]", channel),
                    expected: format!("{}x{}", expected.0, expected.1),
                    actual: format!("{}x{}", actual.0, actual.1),
                });
            }

            let prefs = &c[channel.index()];
            if prefs.len() != channel.cardinality() {
                return Err(ModelError::Shape {
                    table: format!("C[{}]", channel),
                    expected: format!("{} entries", channel.cardinality()),
                    actual: format!("{} entries", prefs.len()),
                });
            }
            if let Some((i, &v)) = prefs.iter().enumerate().find(|(_, v)| !v.is_finite()) {
                return Err(ModelError::InvalidEntry {
                    table: format!("C[{}]", channel),
                    entry: i.to_string(),
                    value: v,
                });
            }
        }

        for factor in Factor::ALL {
            let tensor = &b[factor.index()];
            let n = factor.cardinality();
            if tensor.num_states() != n || tensor.num_actions() != Action::COUNT {
                return Err(ModelError::Shape {
                    table: format!("B[{}]", factor),
                    expected: format!("{}x{}x{}", n, n, Action::COUNT),
                    actual: format!(
                        "{}x{}x{}",
                        tensor.num_states(),
                        tensor.num_states(),
                        tensor.num_actions()
                    ),
                });
            }

            let prior = &d[factor.index()];
            let table = format!("D[{}]", factor);
            if prior.len() != n {
                return Err(ModelError::Shape {
                    table,
                    expected: format!("{} entries", n),
                    actual: format!("{} entries", prior.len()),
                });
            }
            if let Some((i, &v)) = prior
                .iter()
                .enumerate()
                .find(|(_, v)| !v.is_finite() || **v < 0.0)
            {
                return Err(ModelError::InvalidEntry {
                    table,
                    entry: i.to_string(),
                    value: v,
                });
            }
            let sum: f64 = prior.iter().sum();
            if (sum - 1.0).abs() > STOCHASTIC_TOLERANCE {
                return Err(ModelError::NotStochastic {
                    table,
                    column: "prior".to_string(),
                    sum,
                });
            }
        }

        Ok(Self { a, b, c, d })
    }

    /// Likelihood matrix for `channel`.
    pub fn likelihood(&self, channel: Channel) -> &LikelihoodMatrix {
        &self.a[channel.index()]
    }

    pub(crate) fn likelihood_mut(&mut self, channel: Channel) -> &mut LikelihoodMatrix {
        &mut self.a[channel.index()]
    }

    /// Transition tensor for `factor`.
    pub fn transition(&self, factor: Factor) -> &TransitionTensor {
        &self.b[factor.index()]
    }

    /// Log-preferences over `channel`'s observation values.
    pub fn preferences(&self, channel: Channel) -> &[f64] {
        &self.c[channel.index()]
    }

    /// Prior over `factor`'s states.
    pub fn prior(&self, factor: Factor) -> &[f64] {
        &self.d[factor.index()]
    }
}

impl Default for GenerativeModel {
    fn default() -> Self {
        default_model()
    }
}

/// Serializes a per-channel or per-factor table as a map keyed by name.
struct Named<'a, K, T> {
    keys: &'a [K],
    values: &'a [T],
}

impl<K: std::fmt::Display, T: Serialize> Serialize for Named<'_, K, T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.keys.len()))?;
        for (key, value) in self.keys.iter().zip(self.values) {
            map.serialize_entry(&key.to_string(), value)?;
        }
        map.end()
    }
}

impl Serialize for GenerativeModel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("GenerativeModel", 5)?;
        state.serialize_field("actions", &Action::ALL)?;
        state.serialize_field(
            "a",
            &Named {
                keys: &Channel::ALL,
                values: &self.a,
            },
        )?;
        state.serialize_field(
            "b",
            &Named {
                keys: &Factor::ALL,
                values: &self.b,
            },
        )?;
        state.serialize_field(
            "c",
            &Named {
                keys: &Channel::ALL,
                values: &self.c,
            },
        )?;
        state.serialize_field(
            "d",
            &Named {
                keys: &Factor::ALL,
                values: &self.d,
            },
        )?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factor_tables() {
        assert_eq!(Factor::Viability.cardinality(), 5);
        assert_eq!(Factor::WorldState.cardinality(), 4);
        assert_eq!(Factor::Coupling.cardinality(), 5);
        assert_eq!(Factor::GoalProgress.cardinality(), 4);
        assert_eq!(Factor::Coupling.label(4), Some("entrained"));
        assert_eq!(Factor::GoalProgress.label(4), None);
        assert_eq!(Factor::WorldState.state_index("hostile"), Some(2));
    }

    #[test]
    fn test_channel_factor_mapping() {
        assert_eq!(Channel::Energy.factor(), Factor::Viability);
        assert_eq!(Channel::Phi.factor(), Factor::WorldState);
        assert_eq!(Channel::ToolOutcome.factor(), Factor::Coupling);
        assert_eq!(Channel::Coherence.factor(), Factor::Coupling);
        assert_eq!(Channel::Task.factor(), Factor::GoalProgress);
        assert_eq!(Channel::Coherence.cross_factor(), Some(Factor::Viability));
        assert_eq!(
            Channel::Coherence.factor().cardinality(),
            Factor::Viability.cardinality()
        );
    }

    #[test]
    fn test_action_round_trip_by_index() {
        for (i, action) in Action::ALL.iter().enumerate() {
            assert_eq!(action.index(), i);
            assert_eq!(Action::from_index(i), Some(*action));
        }
        assert_eq!(Action::from_index(Action::COUNT), None);
        assert_eq!("Explore".parse::<Action>().unwrap(), Action::Explore);
        assert!("sprint".parse::<Action>().is_err());
    }

    #[test]
    fn test_action_serialization() {
        assert_eq!(
            serde_json::to_string(&Action::Communicate).unwrap(),
            "\"communicate\""
        );
        assert_eq!(
            serde_json::to_string(&Factor::GoalProgress).unwrap(),
            "\"goal_progress\""
        );
    }

    #[test]
    fn test_model_serializes_named_tables() {
        let json = serde_json::to_value(default_model()).unwrap();
        let tool_outcome = json["a"]["tool_outcome"].as_array().unwrap();
        assert_eq!(tool_outcome.len(), Channel::ToolOutcome.cardinality());
        assert_eq!(json["c"]["task"], serde_json::json!([-2.0, 0.0, 1.0, 3.0]));
        assert_eq!(json["d"]["world_state"].as_array().unwrap().len(), 4);
        assert_eq!(json["actions"][5], "reflect");
    }

    #[test]
    fn test_rejects_wrong_likelihood_shape() {
        let model = default_model();
        let mut a = Channel::ALL.map(|ch| model.likelihood(ch).clone());
        // Phi's matrix in the energy slot: 4x4 instead of 5x5.
        a[Channel::Energy.index()] = model.likelihood(Channel::Phi).clone();
        let err = GenerativeModel::new(
            a,
            Factor::ALL.map(|f| model.transition(f).clone()),
            Channel::ALL.map(|ch| model.preferences(ch).to_vec()),
            Factor::ALL.map(|f| model.prior(f).to_vec()),
        )
        .unwrap_err();
        assert!(matches!(err, ModelError::Shape { ref table, .. } if table == "A[energy]"));
    }

    #[test]
    fn test_rejects_unnormalized_prior() {
        let model = default_model();
        let mut d = Factor::ALL.map(|f| model.prior(f).to_vec());
        d[Factor::Coupling.index()] = vec![1.0, 2.0, 1.0, 1.0, 1.0];
        let err = GenerativeModel::new(
            Channel::ALL.map(|ch| model.likelihood(ch).clone()),
            Factor::ALL.map(|f| model.transition(f).clone()),
            Channel::ALL.map(|ch| model.preferences(ch).to_vec()),
            d,
        )
        .unwrap_err();
        assert!(matches!(err, ModelError::NotStochastic { .. }));
    }

    #[test]
    fn test_rejects_non_finite_preference() {
        let model = default_model();
        let mut c = Channel::ALL.map(|ch| model.preferences(ch).to_vec());
        c[Channel::Task.index()][2] = f64::INFINITY;
        let err = GenerativeModel::new(
            Channel::ALL.map(|ch| model.likelihood(ch).clone()),
            Factor::ALL.map(|f| model.transition(f).clone()),
            c,
            Factor::ALL.map(|f| model.prior(f).to_vec()),
        )
        .unwrap_err();
        assert!(matches!(err, ModelError::InvalidEntry { .. }));
    }
}
