//! Observation likelihood matrices (A).

use aif_math::{mat_vec, normalize_in_place};
use serde::Serialize;

use super::{ModelError, STOCHASTIC_TOLERANCE};

/// `P(o | s)` for one channel, stored row-major as `rows[o][s]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct LikelihoodMatrix {
    rows: Vec<Vec<f64>>,
}

impl LikelihoodMatrix {
    /// Build from `rows[o][s]`, requiring a rectangular, non-negative table
    /// whose every column is a distribution.
    pub fn new(rows: Vec<Vec<f64>>) -> Result<Self, ModelError> {
        let table = "A";
        let num_states = rows.first().map(Vec::len).unwrap_or(0);
        if rows.is_empty() || num_states == 0 {
            return Err(ModelError::Shape {
                table: table.to_string(),
                expected: "non-empty matrix".to_string(),
                actual: format!("{}x{}", rows.len(), num_states),
            });
        }
        if let Some((o, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != num_states) {
            return Err(ModelError::Shape {
                table: table.to_string(),
                expected: format!("{} columns in every row", num_states),
                actual: format!("{} columns in row {}", row.len(), o),
            });
        }

        for (o, row) in rows.iter().enumerate() {
            for (s, &p) in row.iter().enumerate() {
                if !p.is_finite() || p < 0.0 {
                    return Err(ModelError::InvalidEntry {
                        table: table.to_string(),
                        entry: format!("[{}][{}]", o, s),
                        value: p,
                    });
                }
            }
        }

        let matrix = Self { rows };
        for s in 0..num_states {
            let sum: f64 = matrix.column(s).iter().sum();
            if (sum - 1.0).abs() > STOCHASTIC_TOLERANCE {
                return Err(ModelError::NotStochastic {
                    table: table.to_string(),
                    column: format!("state {}", s),
                    sum,
                });
            }
        }
        Ok(matrix)
    }

    /// Number of observation values (rows).
    pub fn num_observations(&self) -> usize {
        self.rows.len()
    }

    /// Number of hidden states (columns).
    pub fn num_states(&self) -> usize {
        self.rows.first().map(Vec::len).unwrap_or(0)
    }

    /// Likelihood of observing value `o`, as a vector over states.
    pub fn row(&self, o: usize) -> &[f64] {
        &self.rows[o]
    }

    /// Observation distribution given state `s`.
    pub fn column(&self, s: usize) -> Vec<f64> {
        self.rows.iter().map(|row| row[s]).collect()
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// Expected observation distribution `A · q`.
    pub fn predict(&self, q: &[f64]) -> Vec<f64> {
        mat_vec(&self.rows, q)
    }

    /// Replace column `s` with `column`, renormalized.
    pub(crate) fn set_column(&mut self, s: usize, column: &[f64]) {
        let mut column = column.to_vec();
        normalize_in_place(&mut column);
        for (row, p) in self.rows.iter_mut().zip(column) {
            row[s] = p;
        }
    }

    /// Add `amount` to cell `[o][s]` and renormalize that column.
    pub(crate) fn reinforce(&mut self, o: usize, s: usize, amount: f64) {
        let mut column = self.column(s);
        column[o] += amount;
        self.set_column(s, &column);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_by_two() -> LikelihoodMatrix {
        LikelihoodMatrix::new(vec![vec![0.9, 0.2], vec![0.1, 0.8]]).unwrap()
    }

    #[test]
    fn test_accepts_column_stochastic() {
        let a = two_by_two();
        assert_eq!(a.num_observations(), 2);
        assert_eq!(a.num_states(), 2);
        assert_eq!(a.row(1), &[0.1, 0.8]);
        assert_eq!(a.column(0), vec![0.9, 0.1]);
    }

    #[test]
    fn test_rejects_row_stochastic_only() {
        // Rows sum to 1 but columns do not.
        let err = LikelihoodMatrix::new(vec![vec![0.5, 0.5], vec![0.9, 0.1]]).unwrap_err();
        assert!(matches!(err, ModelError::NotStochastic { .. }));
    }

    #[test]
    fn test_rejects_ragged_and_negative() {
        assert!(matches!(
            LikelihoodMatrix::new(vec![vec![1.0, 1.0], vec![0.0]]),
            Err(ModelError::Shape { .. })
        ));
        assert!(matches!(
            LikelihoodMatrix::new(vec![vec![1.2, 1.0], vec![-0.2, 0.0]]),
            Err(ModelError::InvalidEntry { .. })
        ));
        assert!(matches!(
            LikelihoodMatrix::new(Vec::new()),
            Err(ModelError::Shape { .. })
        ));
    }

    #[test]
    fn test_predict() {
        let a = two_by_two();
        let p = a.predict(&[0.5, 0.5]);
        assert!((p[0] - 0.55).abs() < 1e-12);
        assert!((p[1] - 0.45).abs() < 1e-12);
    }

    #[test]
    fn test_reinforce_keeps_column_normalized() {
        let mut a = two_by_two();
        a.reinforce(1, 0, 0.5);
        let col = a.column(0);
        assert!((col.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!((col[1] - 0.6 / 1.5).abs() < 1e-12);
        // Other column untouched.
        assert_eq!(a.column(1), vec![0.2, 0.8]);
    }
}
