//! Expected Free Energy policy inference.
//!
//! # Model
//!
//! For each action `a`, given beliefs `q`:
//! - Predicted states: `q_f^a = normalize(B_f[·][·][a] · q_f)`
//! - Expected observations: `o_c^a = A_c · q_{f(c)}^a`
//! - Ambiguity: `Σ_c H(o_c^a)`
//! - Risk: `−Σ_c o_c^a · C_c`
//! - `G(a) = ambiguity + risk`
//!
//! The policy is `softmax(−G, temperature)`: lower free energy, higher
//! probability.
//!
//! # Explainability
//!
//! The output keeps the per-action ambiguity/risk split alongside the totals.

use aif_math::{argmax, dot, entropy, softmax};
use serde::Serialize;

use crate::inference::Beliefs;
use crate::model::{Action, Channel, Factor, GenerativeModel};

/// Free-energy breakdown for a single action.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionEvaluation {
    /// The action being evaluated.
    pub action: Action,
    /// Expected observation entropy summed over channels.
    pub ambiguity: f64,
    /// Negative expected log-preference summed over channels.
    pub risk: f64,
    /// `ambiguity + risk`.
    pub efe: f64,
    /// Policy probability assigned to the action.
    pub probability: f64,
}

/// Result of policy inference.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolicyInference {
    /// Expected free energy per action, indexed by [`Action::index`].
    pub efe: Vec<f64>,
    /// Action probabilities, indexed by [`Action::index`].
    pub policy: Vec<f64>,
    /// Per-action breakdown in action order.
    pub breakdown: Vec<ActionEvaluation>,
}

impl PolicyInference {
    /// Action with the highest policy probability (lowest EFE).
    pub fn best_action(&self) -> Action {
        argmax(&self.policy)
            .and_then(Action::from_index)
            .unwrap_or(Action::Idle)
    }

    /// Probability of `action` under the policy.
    pub fn probability(&self, action: Action) -> f64 {
        self.policy.get(action.index()).copied().unwrap_or(0.0)
    }
}

/// Beliefs one step ahead under `action`.
pub fn predict_states(model: &GenerativeModel, beliefs: &Beliefs, action: Action) -> Beliefs {
    let mut predicted = beliefs.clone();
    for factor in Factor::ALL {
        let q = model.transition(factor).predict(beliefs.factor(factor), action);
        predicted.set(factor, q);
    }
    predicted
}

/// Ambiguity and risk of taking `action` from `beliefs`.
///
/// Returns `(ambiguity, risk)`.
pub fn free_energy_terms(model: &GenerativeModel, beliefs: &Beliefs, action: Action) -> (f64, f64) {
    let predicted = predict_states(model, beliefs, action);
    let mut ambiguity = 0.0;
    let mut risk = 0.0;
    for channel in Channel::ALL {
        let expected = model
            .likelihood(channel)
            .predict(predicted.factor(channel.factor()));
        ambiguity += entropy(&expected);
        risk -= dot(&expected, model.preferences(channel));
    }
    (ambiguity, risk)
}

/// Evaluate every action and form the softmax policy.
///
/// Deterministic: identical inputs give bit-identical outputs.
pub fn infer_policies(
    model: &GenerativeModel,
    beliefs: &Beliefs,
    temperature: f64,
) -> PolicyInference {
    let terms: Vec<(f64, f64)> = Action::ALL
        .iter()
        .map(|&action| free_energy_terms(model, beliefs, action))
        .collect();

    let efe: Vec<f64> = terms.iter().map(|(ambiguity, risk)| ambiguity + risk).collect();
    let neg_efe: Vec<f64> = efe.iter().map(|g| -g).collect();
    let policy = softmax(&neg_efe, temperature);

    let breakdown = Action::ALL
        .iter()
        .zip(&terms)
        .zip(efe.iter().zip(&policy))
        .map(|((&action, &(ambiguity, risk)), (&g, &p))| ActionEvaluation {
            action,
            ambiguity,
            risk,
            efe: g,
            probability: p,
        })
        .collect();

    PolicyInference {
        efe,
        policy,
        breakdown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::BELIEF_TOLERANCE;
    use crate::model::{default_model, ModelBuilder};
    use aif_math::is_distribution;

    #[test]
    fn test_policy_is_distribution() {
        let model = default_model();
        let beliefs = Beliefs::from_prior(&model);
        let out = infer_policies(&model, &beliefs, 1.0);
        assert_eq!(out.efe.len(), Action::COUNT);
        assert!(is_distribution(&out.policy, 1e-9));
        assert_eq!(out.breakdown.len(), Action::COUNT);
        for eval in &out.breakdown {
            assert!(eval.ambiguity >= 0.0);
            assert!((eval.efe - (eval.ambiguity + eval.risk)).abs() < 1e-12);
        }
    }

    #[test]
    fn test_predicted_states_valid() {
        let model = default_model();
        let beliefs = Beliefs::from_prior(&model);
        for action in Action::ALL {
            let predicted = predict_states(&model, &beliefs, action);
            assert!(predicted.is_valid(BELIEF_TOLERANCE), "{action}");
        }
    }

    #[test]
    fn test_lower_efe_gets_more_mass() {
        let model = default_model();
        let beliefs = Beliefs::from_prior(&model);
        let out = infer_policies(&model, &beliefs, 1.0);
        let best = out.best_action();
        let min_efe = out.efe.iter().cloned().fold(f64::INFINITY, f64::min);
        assert_eq!(out.efe[best.index()], min_efe);
        for action in Action::ALL {
            assert!(out.probability(best) >= out.probability(action));
        }
    }

    #[test]
    fn test_identical_dynamics_give_uniform_policy() {
        let model = ModelBuilder::new().without_action_effects().build().unwrap();
        let beliefs = Beliefs::from_prior(&model);
        let out = infer_policies(&model, &beliefs, 1.0);
        for p in &out.policy {
            assert!((p - 1.0 / Action::COUNT as f64).abs() < 1e-12);
        }
    }

    #[test]
    fn test_rest_preferred_when_exhausted() {
        let model = default_model();
        let beliefs = Beliefs::new([
            vec![0.9, 0.1, 0.0, 0.0, 0.0],
            model.prior(Factor::WorldState).to_vec(),
            model.prior(Factor::Coupling).to_vec(),
            model.prior(Factor::GoalProgress).to_vec(),
        ])
        .unwrap();
        let out = infer_policies(&model, &beliefs, 1.0);
        assert!(out.efe[Action::Rest.index()] < out.efe[Action::Idle.index()]);
        assert!(out.efe[Action::Rest.index()] < out.efe[Action::Explore.index()]);
    }

    #[test]
    fn test_temperature_sharpens() {
        let model = default_model();
        let beliefs = Beliefs::from_prior(&model);
        let warm = infer_policies(&model, &beliefs, 1.0);
        let cold = infer_policies(&model, &beliefs, 0.1);
        let best = warm.best_action();
        assert_eq!(cold.best_action(), best);
        assert!(cold.probability(best) > warm.probability(best));
    }

    #[test]
    fn test_deterministic() {
        let model = default_model();
        let beliefs = Beliefs::from_prior(&model);
        let a = infer_policies(&model, &beliefs, 1.0);
        let b = infer_policies(&model, &beliefs, 1.0);
        assert_eq!(a, b);
        for (x, y) in a.efe.iter().zip(&b.efe) {
            assert_eq!(x.to_bits(), y.to_bits());
        }
    }
}
