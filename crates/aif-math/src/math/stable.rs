//! Numerically stable primitives for log-domain categorical math.

/// Probability floor used by every logarithm of a probability.
///
/// Entropy and KL terms at or below this value contribute nothing.
pub const EPSILON: f64 = 1e-10;

/// `ln(max(x, EPSILON))`.
///
/// NaN input is treated as zero mass.
#[inline]
pub fn safe_log(x: f64) -> f64 {
    if x.is_nan() {
        return EPSILON.ln();
    }
    x.max(EPSILON).ln()
}

/// Stable log(sum(exp(values))).
///
/// Returns NEG_INFINITY for empty input or all -inf inputs.
pub fn log_sum_exp(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NEG_INFINITY;
    }
    if values.iter().any(|v| v.is_nan()) {
        return f64::NAN;
    }
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if max == f64::NEG_INFINITY {
        return f64::NEG_INFINITY;
    }
    if max == f64::INFINITY {
        return f64::INFINITY;
    }
    let mut sum = 0.0;
    for v in values {
        sum += (*v - max).exp();
    }
    max + sum.ln()
}
