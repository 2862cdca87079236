//! Categorical distribution primitives.
//!
//! These functions are the numerical contract shared by state inference,
//! policy inference and learning:
//! - `softmax` subtracts the maximum logit before exponentiating
//! - `normalize` falls back to a uniform distribution when the mass is zero
//! - `entropy` and `kl_divergence` skip terms at or below [`EPSILON`]
//!
//! All functions are pure and allocation is limited to the returned vector.

use super::stable::EPSILON;

/// Uniform distribution over `n` categories. Empty for `n == 0`.
pub fn uniform(n: usize) -> Vec<f64> {
    if n == 0 {
        return Vec::new();
    }
    vec![1.0 / n as f64; n]
}

/// Temperature-scaled softmax.
///
/// Computes `exp((x_i - max) / temperature)` and normalizes. A temperature
/// that is not strictly positive and finite degenerates to the greedy limit:
/// all mass is shared by the maximal logits. NaN logits carry no mass.
pub fn softmax(logits: &[f64], temperature: f64) -> Vec<f64> {
    if logits.is_empty() {
        return Vec::new();
    }

    let max = logits
        .iter()
        .cloned()
        .filter(|x| !x.is_nan())
        .fold(f64::NEG_INFINITY, f64::max);

    if max == f64::NEG_INFINITY {
        return uniform(logits.len());
    }

    if max == f64::INFINITY || !(temperature > 0.0 && temperature.is_finite()) {
        let mask: Vec<f64> = logits
            .iter()
            .map(|&x| if x == max { 1.0 } else { 0.0 })
            .collect();
        return normalize(&mask);
    }

    let exps: Vec<f64> = logits
        .iter()
        .map(|&x| {
            if x.is_nan() {
                0.0
            } else {
                ((x - max) / temperature).exp()
            }
        })
        .collect();
    normalize(&exps)
}

/// Divide by the total mass.
///
/// A zero (or non-finite) total yields a uniform distribution rather than an
/// error.
pub fn normalize(probs: &[f64]) -> Vec<f64> {
    let sum: f64 = probs.iter().sum();
    if sum == 0.0 || !sum.is_finite() {
        return uniform(probs.len());
    }
    probs.iter().map(|&p| p / sum).collect()
}

/// Normalize in place. Same degenerate-case policy as [`normalize`].
pub fn normalize_in_place(probs: &mut [f64]) {
    let sum: f64 = probs.iter().sum();
    if sum == 0.0 || !sum.is_finite() {
        let n = probs.len();
        for p in probs.iter_mut() {
            *p = 1.0 / n as f64;
        }
        return;
    }
    for p in probs.iter_mut() {
        *p /= sum;
    }
}

/// Shannon entropy in nats.
pub fn entropy(probs: &[f64]) -> f64 {
    -probs
        .iter()
        .filter(|&&p| p > EPSILON)
        .map(|&p| p * p.ln())
        .sum::<f64>()
}

/// KL divergence `D(p || q)` in nats.
///
/// Terms where either `p[i]` or `q[i]` is at or below [`EPSILON`] are
/// skipped. Extra entries of the longer slice are ignored.
pub fn kl_divergence(p: &[f64], q: &[f64]) -> f64 {
    p.iter()
        .zip(q.iter())
        .filter(|(&pi, &qi)| pi > EPSILON && qi > EPSILON)
        .map(|(&pi, &qi)| pi * (pi / qi).ln())
        .sum()
}

/// Dot product over the common prefix of `a` and `b`.
pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Matrix-vector product `M · v` for a row-major matrix.
///
/// Each output entry is `dot(row, v)`.
pub fn mat_vec(matrix: &[Vec<f64>], vector: &[f64]) -> Vec<f64> {
    matrix.iter().map(|row| dot(row, vector)).collect()
}

/// Index of the largest entry. Ties resolve to the lowest index; NaN
/// entries are never selected. `None` for empty or all-NaN input.
pub fn argmax(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

/// Whether `probs` is a valid distribution: non-empty, all entries finite
/// and non-negative, total within `tol` of one.
pub fn is_distribution(probs: &[f64], tol: f64) -> bool {
    if probs.is_empty() {
        return false;
    }
    if probs.iter().any(|&p| !p.is_finite() || p < 0.0) {
        return false;
    }
    let sum: f64 = probs.iter().sum();
    (sum - 1.0).abs() <= tol
}
