//! Deterministic construction of the default generative model.
//!
//! The same builder settings always yield bit-identical tables.

use aif_math::normalize;

use super::{
    Action, Channel, Factor, GenerativeModel, LikelihoodMatrix, ModelError, TransitionTensor,
};

/// Probability that a channel reports the value aligned with the true state.
pub const A_FIDELITY: f64 = 0.7;

/// Probability that a factor keeps its state before action effects apply.
pub const B_STAY: f64 = 0.7;

/// Where an action pushes a factor.
#[derive(Debug, Clone, Copy)]
enum Shift {
    /// One state up, from every state below the top.
    Up,
    /// One state down, from every state above the bottom.
    Down,
    /// Directly to a fixed state, from every other state.
    Toward(usize),
}

impl Shift {
    fn target(self, current: usize, n: usize) -> Option<usize> {
        match self {
            Shift::Up if current + 1 < n => Some(current + 1),
            Shift::Down if current > 0 => Some(current - 1),
            Shift::Toward(target) if current != target => Some(target),
            _ => None,
        }
    }
}

/// Action effects layered over the identity-like base. Each entry assigns
/// (does not add) `B[target][current][action] = probability`.
const TRANSITION_OVERRIDES: &[(Action, Factor, Shift, f64)] = &[
    (Action::Rest, Factor::Viability, Shift::Up, 0.6),
    (Action::Explore, Factor::WorldState, Shift::Toward(1), 0.5),
    (Action::Explore, Factor::Viability, Shift::Down, 0.3),
    (Action::Exploit, Factor::GoalProgress, Shift::Up, 0.5),
    (Action::Exploit, Factor::Viability, Shift::Down, 0.2),
    (Action::Communicate, Factor::Coupling, Shift::Up, 0.6),
    (Action::Reflect, Factor::WorldState, Shift::Toward(0), 0.4),
    (Action::Reflect, Factor::Coupling, Shift::Up, 0.3),
];

/// Default log-preferences per channel.
pub fn default_preferences(channel: Channel) -> Vec<f64> {
    match channel {
        Channel::Energy => vec![-4.0, -2.0, 0.0, 1.0, 2.0],
        Channel::Phi => vec![1.0, 0.0, -2.0, 1.5],
        Channel::ToolOutcome => vec![-2.0, 0.0, 2.0],
        Channel::Coherence => vec![-2.0, -1.0, 0.0, 1.0, 2.0],
        Channel::Task => vec![-2.0, 0.0, 1.0, 3.0],
    }
}

/// Default prior per factor (normalized).
pub fn default_prior(factor: Factor) -> Vec<f64> {
    let weights: &[f64] = match factor {
        Factor::Viability => &[1.0, 1.0, 2.0, 1.0, 1.0],
        Factor::WorldState => &[2.0, 1.0, 1.0, 1.0],
        Factor::Coupling => &[1.0, 2.0, 1.0, 1.0, 1.0],
        Factor::GoalProgress => &[1.0, 2.0, 1.0, 1.0],
    };
    normalize(weights)
}

/// Observation value a channel reports for state `s` of its factor.
///
/// Maps the state range linearly onto the channel range and rounds.
pub fn aligned_observation(channel: Channel, s: usize) -> usize {
    let levels = channel.cardinality();
    let states = channel.factor().cardinality();
    if states <= 1 {
        return 0;
    }
    let scaled = s as f64 * (levels - 1) as f64 / (states - 1) as f64;
    (scaled.round() as usize).min(levels - 1)
}

/// Builder for generative models with tunable fidelity and priors.
#[derive(Debug, Clone)]
pub struct ModelBuilder {
    likelihood_fidelity: f64,
    transition_stay: f64,
    action_effects: bool,
    preferences: [Vec<f64>; super::NUM_CHANNELS],
    priors: [Vec<f64>; super::NUM_FACTORS],
}

impl Default for ModelBuilder {
    fn default() -> Self {
        Self {
            likelihood_fidelity: A_FIDELITY,
            transition_stay: B_STAY,
            action_effects: true,
            preferences: Channel::ALL.map(default_preferences),
            priors: Factor::ALL.map(default_prior),
        }
    }
}

impl ModelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Probability mass on the aligned observation, in `(0, 1]`.
    pub fn likelihood_fidelity(mut self, fidelity: f64) -> Self {
        self.likelihood_fidelity = fidelity;
        self
    }

    /// Probability of keeping the current state, in `[0, 1]`.
    pub fn transition_stay(mut self, stay: f64) -> Self {
        self.transition_stay = stay;
        self
    }

    /// Drop the per-action transition effects, leaving every action
    /// with the same identity-like dynamics.
    pub fn without_action_effects(mut self) -> Self {
        self.action_effects = false;
        self
    }

    /// Replace the log-preferences of one channel.
    pub fn preferences(mut self, channel: Channel, prefs: Vec<f64>) -> Self {
        self.preferences[channel.index()] = prefs;
        self
    }

    /// Replace the prior of one factor. Weights are normalized.
    pub fn prior(mut self, factor: Factor, weights: Vec<f64>) -> Self {
        self.priors[factor.index()] = normalize(&weights);
        self
    }

    /// Build and validate the model.
    pub fn build(self) -> Result<GenerativeModel, ModelError> {
        if !(self.likelihood_fidelity > 0.0 && self.likelihood_fidelity <= 1.0) {
            return Err(ModelError::InvalidParameter {
                name: "likelihood_fidelity".to_string(),
                message: format!("must be in (0, 1], got {}", self.likelihood_fidelity),
            });
        }
        if !(0.0..=1.0).contains(&self.transition_stay) {
            return Err(ModelError::InvalidParameter {
                name: "transition_stay".to_string(),
                message: format!("must be in [0, 1], got {}", self.transition_stay),
            });
        }

        let mut a = Vec::with_capacity(super::NUM_CHANNELS);
        for channel in Channel::ALL {
            a.push(self.likelihood(channel)?);
        }
        let mut b = Vec::with_capacity(super::NUM_FACTORS);
        for factor in Factor::ALL {
            b.push(self.transition(factor)?);
        }

        GenerativeModel::new(
            into_array(a)?,
            into_array(b)?,
            self.preferences,
            self.priors,
        )
    }

    fn likelihood(&self, channel: Channel) -> Result<LikelihoodMatrix, ModelError> {
        let levels = channel.cardinality();
        let states = channel.factor().cardinality();
        let off = (1.0 - self.likelihood_fidelity) / (levels - 1).max(1) as f64;

        let mut rows = vec![vec![off; states]; levels];
        for s in 0..states {
            rows[aligned_observation(channel, s)][s] = self.likelihood_fidelity;
        }
        LikelihoodMatrix::new(rows).map_err(|e| in_table(e, format!("A[{}]", channel)))
    }

    fn transition(&self, factor: Factor) -> Result<TransitionTensor, ModelError> {
        let n = factor.cardinality();
        let off = (1.0 - self.transition_stay) / (n - 1).max(1) as f64;

        let mut data = vec![vec![vec![off; Action::COUNT]; n]; n];
        for (s, plane) in data.iter_mut().enumerate() {
            for cell in &mut plane[s] {
                *cell = self.transition_stay;
            }
        }

        if self.action_effects {
            for &(action, target_factor, shift, p) in TRANSITION_OVERRIDES {
                if target_factor != factor {
                    continue;
                }
                for current in 0..n {
                    if let Some(next) = shift.target(current, n) {
                        data[next][current][action.index()] = p;
                    }
                }
            }
        }

        // Overrides break column sums; renormalize every (current, action).
        for current in 0..n {
            for a in 0..Action::COUNT {
                let column: Vec<f64> = data.iter().map(|plane| plane[current][a]).collect();
                let column = normalize(&column);
                for (plane, p) in data.iter_mut().zip(column) {
                    plane[current][a] = p;
                }
            }
        }

        TransitionTensor::new(data).map_err(|e| in_table(e, format!("B[{}]", factor)))
    }
}

/// Rename the table in an error raised by a per-table constructor.
fn in_table(err: ModelError, name: String) -> ModelError {
    match err {
        ModelError::Shape {
            expected, actual, ..
        } => ModelError::Shape {
            table: name,
            expected,
            actual,
        },
        ModelError::NotStochastic { column, sum, .. } => ModelError::NotStochastic {
            table: name,
            column,
            sum,
        },
        ModelError::InvalidEntry { entry, value, .. } => ModelError::InvalidEntry {
            table: name,
            entry,
            value,
        },
        other => other,
    }
}

fn into_array<T, const N: usize>(items: Vec<T>) -> Result<[T; N], ModelError> {
    let len = items.len();
    items.try_into().map_err(|_| ModelError::Shape {
        table: "model".to_string(),
        expected: format!("{} tables", N),
        actual: format!("{} tables", len),
    })
}

/// The default generative model.
pub fn default_model() -> GenerativeModel {
    match ModelBuilder::default().build() {
        Ok(model) => model,
        // The default tables are valid by construction.
        Err(e) => unreachable!("default generative model is invalid: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aif_math::{argmax, is_distribution};

    #[test]
    fn test_aligned_observation_mapping() {
        // 5 coupling states onto 3 tool outcomes: 0,1,1,2,2
        let mapped: Vec<usize> = (0..5)
            .map(|s| aligned_observation(Channel::ToolOutcome, s))
            .collect();
        assert_eq!(mapped, vec![0, 1, 1, 2, 2]);
        // Same cardinality is the identity.
        for s in 0..5 {
            assert_eq!(aligned_observation(Channel::Energy, s), s);
        }
    }

    #[test]
    fn test_default_likelihood_fidelity() {
        let model = default_model();
        let a = model.likelihood(Channel::Energy);
        for s in 0..5 {
            let col = a.column(s);
            assert!(is_distribution(&col, 1e-9));
            assert_eq!(col[s], A_FIDELITY);
            assert!((col[(s + 1) % 5] - 0.075).abs() < 1e-12);
        }
    }

    #[test]
    fn test_default_transitions_are_stochastic() {
        let model = default_model();
        for factor in Factor::ALL {
            let b = model.transition(factor);
            for current in 0..factor.cardinality() {
                for action in Action::ALL {
                    let col = b.column(current, action.index());
                    assert!(is_distribution(&col, 1e-9), "{factor} {current} {action}");
                }
            }
        }
    }

    #[test]
    fn test_idle_is_identity_like() {
        let model = default_model();
        let b = model.transition(Factor::Viability);
        for current in 0..5 {
            assert!((b.probability(current, current, Action::Idle.index()) - B_STAY).abs() < 1e-12);
        }
    }

    #[test]
    fn test_rest_raises_viability() {
        let model = default_model();
        let b = model.transition(Factor::Viability);
        let rest = Action::Rest.index();
        // Base column 0.7 stay + 4 x 0.075, override assigns 0.6 to c+1.
        let expected_up = 0.6 / (0.7 + 0.6 + 3.0 * 0.075);
        assert!((b.probability(3, 2, rest) - expected_up).abs() < 1e-12);
        // Top state has nowhere to go; column unchanged.
        assert!((b.probability(4, 4, rest) - B_STAY).abs() < 1e-12);
    }

    #[test]
    fn test_explore_targets_volatile() {
        let model = default_model();
        let b = model.transition(Factor::WorldState);
        let explore = Action::Explore.index();
        let volatile = Factor::WorldState.state_index("volatile").unwrap();
        let col = b.column(0, explore);
        assert_eq!(argmax(&col), Some(0));
        assert!(col[volatile] > col[2]);
        // Already volatile: untouched.
        assert!((b.probability(volatile, volatile, explore) - B_STAY).abs() < 1e-12);
    }

    #[test]
    fn test_default_priors() {
        let model = default_model();
        assert_eq!(model.prior(Factor::Viability), &[1.0 / 6.0, 1.0 / 6.0, 2.0 / 6.0, 1.0 / 6.0, 1.0 / 6.0]);
        assert_eq!(argmax(model.prior(Factor::WorldState)), Some(0));
        assert_eq!(argmax(model.prior(Factor::Coupling)), Some(1));
        assert_eq!(argmax(model.prior(Factor::GoalProgress)), Some(1));
    }

    #[test]
    fn test_builds_are_bit_identical() {
        assert_eq!(default_model(), default_model());
    }

    #[test]
    fn test_builder_overrides() {
        let model = ModelBuilder::new()
            .likelihood_fidelity(0.99)
            .prior(Factor::GoalProgress, vec![0.0, 0.0, 0.0, 1.0])
            .build()
            .unwrap();
        assert_eq!(model.likelihood(Channel::Task).row(3)[3], 0.99);
        assert_eq!(model.prior(Factor::GoalProgress), &[0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_builder_rejects_bad_parameters() {
        assert!(ModelBuilder::new().likelihood_fidelity(0.0).build().is_err());
        assert!(ModelBuilder::new().transition_stay(1.5).build().is_err());
        let err = ModelBuilder::new()
            .preferences(Channel::Phi, vec![1.0, 2.0])
            .build()
            .unwrap_err();
        assert!(matches!(err, ModelError::Shape { .. }));
    }
}
