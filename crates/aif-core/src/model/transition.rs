//! State transition tensors (B).

use aif_math::normalize;
use serde::Serialize;

use super::{Action, ModelError, STOCHASTIC_TOLERANCE};

/// `P(next | current, action)` for one factor, indexed `[next][current][action]`.
///
/// The shape is fixed at construction: `n x n x actions`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TransitionTensor {
    data: Vec<Vec<Vec<f64>>>,
}

impl TransitionTensor {
    /// Build from `data[next][current][action]`.
    ///
    /// Every `(current, action)` column over `next` must sum to 1.
    pub fn new(data: Vec<Vec<Vec<f64>>>) -> Result<Self, ModelError> {
        let table = "B";
        let n = data.len();
        let num_actions = data
            .first()
            .and_then(|plane| plane.first())
            .map(Vec::len)
            .unwrap_or(0);
        if n == 0 || num_actions == 0 {
            return Err(ModelError::Shape {
                table: table.to_string(),
                expected: "non-empty tensor".to_string(),
                actual: format!("{}x?x{}", n, num_actions),
            });
        }

        for (next, plane) in data.iter().enumerate() {
            if plane.len() != n {
                return Err(ModelError::Shape {
                    table: table.to_string(),
                    expected: format!("{} current states", n),
                    actual: format!("{} in next state {}", plane.len(), next),
                });
            }
            for (current, cell) in plane.iter().enumerate() {
                if cell.len() != num_actions {
                    return Err(ModelError::Shape {
                        table: table.to_string(),
                        expected: format!("{} actions", num_actions),
                        actual: format!("{} at [{}][{}]", cell.len(), next, current),
                    });
                }
                for (action, &p) in cell.iter().enumerate() {
                    if !p.is_finite() || p < 0.0 {
                        return Err(ModelError::InvalidEntry {
                            table: table.to_string(),
                            entry: format!("[{}][{}][{}]", next, current, action),
                            value: p,
                        });
                    }
                }
            }
        }

        let tensor = Self { data };
        for current in 0..n {
            for action in 0..num_actions {
                let sum: f64 = tensor.column(current, action).iter().sum();
                if (sum - 1.0).abs() > STOCHASTIC_TOLERANCE {
                    let label = Action::from_index(action)
                        .map(|a| a.name().to_string())
                        .unwrap_or_else(|| action.to_string());
                    return Err(ModelError::NotStochastic {
                        table: table.to_string(),
                        column: format!("current {} action {}", current, label),
                        sum,
                    });
                }
            }
        }
        Ok(tensor)
    }

    pub fn num_states(&self) -> usize {
        self.data.len()
    }

    pub fn num_actions(&self) -> usize {
        self.data
            .first()
            .and_then(|plane| plane.first())
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// `P(next | current, action)`.
    pub fn probability(&self, next: usize, current: usize, action: usize) -> f64 {
        self.data[next][current][action]
    }

    /// Next-state distribution from `current` under `action`.
    pub fn column(&self, current: usize, action: usize) -> Vec<f64> {
        self.data.iter().map(|plane| plane[current][action]).collect()
    }

    /// Predicted next-state distribution `normalize(Σ_c B[·][c][a] q[c])`.
    pub fn predict(&self, q: &[f64], action: Action) -> Vec<f64> {
        let a = action.index();
        let predicted: Vec<f64> = self
            .data
            .iter()
            .map(|plane| {
                plane
                    .iter()
                    .zip(q)
                    .map(|(cell, &qc)| cell[a] * qc)
                    .sum()
            })
            .collect();
        normalize(&predicted)
    }
}
