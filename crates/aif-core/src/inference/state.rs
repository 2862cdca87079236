//! Mean-field state inference.
//!
//! Each factor is updated independently:
//!
//! ```text
//! ll[f]      = Σ_{channels c on f} log A_c[o_c]      (coherence also feeds viability)
//! q_f'       = softmax(ll[f] + log q_f)
//! ```
//!
//! The update is repeated with the previous posterior as the prior for a
//! configurable number of extra passes. Surprise is measured against the
//! final posterior: `Σ_c −log (A_c · q_{f(c)})[o_c]`.

use aif_math::{log_sum_exp, safe_log, softmax};

use super::beliefs::{Beliefs, Observation};
use crate::error::Result;
use crate::model::{Channel, Factor, GenerativeModel, NUM_FACTORS};

/// Output of one state-inference call.
#[derive(Debug, Clone, PartialEq)]
pub struct StateInference {
    /// Posterior beliefs after the final pass.
    pub beliefs: Beliefs,
    /// Surprise of the observation under the posterior, in nats.
    pub surprise: f64,
    /// Factor-wise log evidence `Σ_f log Σ_s exp(ll[f][s]) q_f[s]` under the
    /// incoming beliefs. Diagnostic only.
    pub log_evidence: f64,
    /// Number of update passes performed.
    pub passes: u32,
}

/// Accumulated log-likelihood per factor. The observation must be valid.
fn log_likelihoods(model: &GenerativeModel, obs: &Observation) -> [Vec<f64>; NUM_FACTORS] {
    let mut ll = Factor::ALL.map(|f| vec![0.0; f.cardinality()]);
    for channel in Channel::ALL {
        let row = model.likelihood(channel).row(obs.get(channel));
        let targets = std::iter::once(channel.factor()).chain(channel.cross_factor());
        for factor in targets {
            for (acc, &p) in ll[factor.index()].iter_mut().zip(row) {
                *acc += safe_log(p);
            }
        }
    }
    ll
}

/// Update `prior` with `obs`, running `1 + iterations` mean-field passes.
pub fn infer_states(
    model: &GenerativeModel,
    prior: &Beliefs,
    obs: &Observation,
    iterations: u32,
) -> Result<StateInference> {
    obs.validate()?;

    let ll = log_likelihoods(model, obs);
    let mut posterior = prior.clone();
    let mut log_evidence = 0.0;

    for pass in 0..=iterations {
        for factor in Factor::ALL {
            let logits: Vec<f64> = ll[factor.index()]
                .iter()
                .zip(posterior.factor(factor))
                .map(|(l, &q)| l + safe_log(q))
                .collect();
            if pass == 0 {
                log_evidence += log_sum_exp(&logits);
            }
            posterior.set(factor, softmax(&logits, 1.0));
        }
    }

    let surprise = surprise_unchecked(model, &posterior, obs);
    Ok(StateInference {
        beliefs: posterior,
        surprise,
        log_evidence,
        passes: iterations + 1,
    })
}

/// Surprise of `obs` under `beliefs`, in nats.
pub fn surprise(model: &GenerativeModel, beliefs: &Beliefs, obs: &Observation) -> Result<f64> {
    obs.validate()?;
    Ok(surprise_unchecked(model, beliefs, obs))
}

fn surprise_unchecked(model: &GenerativeModel, beliefs: &Beliefs, obs: &Observation) -> f64 {
    Channel::ALL
        .iter()
        .map(|&channel| {
            let expected = model
                .likelihood(channel)
                .predict(beliefs.factor(channel.factor()));
            -safe_log(expected[obs.get(channel)])
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::inference::BELIEF_TOLERANCE;
    use crate::model::{default_model, ModelBuilder};
    use aif_math::{argmax, EPSILON};

    #[test]
    fn test_posterior_is_valid() {
        let model = default_model();
        let prior = Beliefs::from_prior(&model);
        let out = infer_states(&model, &prior, &Observation::new(0, 2, 0, 1, 3), 4).unwrap();
        assert!(out.beliefs.is_valid(BELIEF_TOLERANCE));
        assert_eq!(out.passes, 5);
        assert!(out.surprise >= 0.0);
        assert!(out.log_evidence.is_finite());
    }

    #[test]
    fn test_single_pass_matches_bayes_rule() {
        let model = default_model();
        let prior = Beliefs::from_prior(&model);
        let obs = Observation::new(4, 0, 1, 2, 0);
        let out = infer_states(&model, &prior, &obs, 0).unwrap();

        // goal_progress only sees the task channel.
        let row = model.likelihood(Channel::Task).row(0);
        let d = model.prior(Factor::GoalProgress);
        let joint: Vec<f64> = row.iter().zip(d).map(|(l, p)| l * p).collect();
        let z: f64 = joint.iter().sum();
        for (q, j) in out.beliefs.factor(Factor::GoalProgress).iter().zip(&joint) {
            assert!((q - j / z).abs() < 1e-12);
        }
    }

    #[test]
    fn test_coherence_feeds_viability() {
        let model = default_model();
        let prior = Beliefs::from_prior(&model);
        // Energy says "medium" (2); coherence says "optimal" (4).
        let low_coherence = infer_states(&model, &prior, &Observation::new(2, 0, 1, 2, 1), 0).unwrap();
        let high_coherence = infer_states(&model, &prior, &Observation::new(2, 0, 1, 4, 1), 0).unwrap();
        let v_low = low_coherence.beliefs.factor(Factor::Viability)[4];
        let v_high = high_coherence.beliefs.factor(Factor::Viability)[4];
        assert!(v_high > v_low);
    }

    #[test]
    fn test_iterations_sharpen_toward_observation() {
        let model = default_model();
        let prior = Beliefs::from_prior(&model);
        let obs = Observation::new(4, 3, 2, 4, 3);
        let one = infer_states(&model, &prior, &obs, 0).unwrap();
        let many = infer_states(&model, &prior, &obs, 8).unwrap();
        let q1 = one.beliefs.factor(Factor::GoalProgress)[3];
        let q8 = many.beliefs.factor(Factor::GoalProgress)[3];
        assert!(q8 > q1);
        assert_eq!(argmax(many.beliefs.factor(Factor::Viability)), Some(4));
    }

    #[test]
    fn test_rejects_out_of_range() {
        let model = default_model();
        let prior = Beliefs::from_prior(&model);
        let err = infer_states(&model, &prior, &Observation::new(0, 4, 0, 0, 0), 0).unwrap_err();
        assert!(matches!(
            err,
            Error::ObservationOutOfRange {
                channel: Channel::Phi,
                ..
            }
        ));
    }

    #[test]
    fn test_surprise_of_impossible_observation_hits_floor() {
        // Fidelity 1.0 makes off-aligned observations impossible.
        let model = ModelBuilder::new().likelihood_fidelity(1.0).build().unwrap();
        let beliefs = Beliefs::new([
            vec![1.0, 0.0, 0.0, 0.0, 0.0],
            vec![1.0, 0.0, 0.0, 0.0],
            vec![1.0, 0.0, 0.0, 0.0, 0.0],
            vec![1.0, 0.0, 0.0, 0.0],
        ])
        .unwrap();
        let s = surprise(&model, &beliefs, &Observation::new(0, 0, 0, 0, 3)).unwrap();
        assert!((s - (-EPSILON.ln())).abs() < 1e-9);
    }
}
