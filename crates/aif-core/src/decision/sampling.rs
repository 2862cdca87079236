//! Inverse-CDF sampling from a categorical policy.

use rand::Rng;

/// Draw an index from `probs` using `rng`.
///
/// Walks the cumulative sum and returns the first index whose cumulative
/// mass exceeds a uniform draw in `[0, 1)`. When rounding leaves the total
/// below the draw, the last index with non-zero mass is returned. `None`
/// only when there is no such index.
pub fn sample_index<R: Rng + ?Sized>(probs: &[f64], rng: &mut R) -> Option<usize> {
    let r: f64 = rng.random();
    let mut cumulative = 0.0;
    for (i, &p) in probs.iter().enumerate() {
        if p.is_nan() || p <= 0.0 {
            continue;
        }
        cumulative += p;
        if cumulative > r {
            return Some(i);
        }
    }
    probs.iter().rposition(|&p| p > 0.0)
}
