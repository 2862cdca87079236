//! Dirichlet pseudo-counts for categorical likelihood learning.
//!
//! The model uses:
//! - Prior: `p = (p_1..p_K) ~ Dirichlet(α_1..α_K)`
//! - Observation of category `i` with weight `w`: `α_i ← α_i + w`
//! - Point estimate: the posterior mean `α_i / Σ_j α_j`
//!
//! A likelihood column `P(o | s)` backed by these counts stays a valid
//! distribution after every update.

use serde::{Deserialize, Serialize};

/// Concentration parameters of a Dirichlet distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirichletParams {
    /// Concentration parameters (all must be > 0)
    pub alpha: Vec<f64>,
}

impl DirichletParams {
    /// Create new Dirichlet parameters with validation.
    ///
    /// Returns None if any parameter is non-positive, NaN, or if the vector is empty.
    pub fn new(alpha: Vec<f64>) -> Option<Self> {
        if alpha.is_empty() {
            return None;
        }
        for &a in &alpha {
            if a.is_nan() || a <= 0.0 {
                return None;
            }
        }
        Some(Self { alpha })
    }

    /// Counts whose mean reproduces `mean`, scaled to total `concentration`.
    ///
    /// Zero entries are lifted to the [`EPSILON`](super::stable::EPSILON)
    /// floor so every α stays positive.
    pub fn from_mean(mean: &[f64], concentration: f64) -> Option<Self> {
        if concentration.is_nan() || concentration <= 0.0 {
            return None;
        }
        let alpha = mean
            .iter()
            .map(|&p| (p * concentration).max(super::stable::EPSILON))
            .collect();
        Self::new(alpha)
    }

    /// Number of categories K.
    pub fn k(&self) -> usize {
        self.alpha.len()
    }

    /// Sum of all concentration parameters: α_0 = Σ_i α_i.
    pub fn concentration(&self) -> f64 {
        self.alpha.iter().sum()
    }

    /// Mean of the Dirichlet distribution: E[p_i] = α_i / α_0.
    pub fn mean(&self) -> Vec<f64> {
        let sum = self.concentration();
        self.alpha.iter().map(|a| a / sum).collect()
    }

    /// Add `weight` pseudo-observations to category `i`.
    ///
    /// Returns false (and leaves the counts untouched) for an out-of-range
    /// index or a weight that is negative or NaN.
    pub fn observe(&mut self, i: usize, weight: f64) -> bool {
        if i >= self.alpha.len() || weight.is_nan() || weight < 0.0 {
            return false;
        }
        self.alpha[i] += weight;
        true
    }
}
