//! Training loss.
//!
//! The engine trains on half sum-of-squared-error. It is summed over output units,
//! not averaged: `L = 0.5 * sum((pred - target)^2)`.
//!
//! Typical use:
//!
//! - run `network.forward(...)`
//! - write `d_output` via `half_sse_backward`
//! - run `network.backward(...)`

/// Half sum-of-squared-error.
///
/// Shape contract: `pred.len() == target.len()`.
#[inline]
pub fn half_sse(pred: &[f32], target: &[f32]) -> f32 {
    assert_eq!(
        pred.len(),
        target.len(),
        "pred len {} does not match target len {}",
        pred.len(),
        target.len()
    );

    let mut sum_sq = 0.0_f32;
    for (p, t) in pred.iter().zip(target) {
        let diff = p - t;
        sum_sq = diff.mul_add(diff, sum_sq);
    }
    0.5 * sum_sq
}

/// Half-SSE loss + gradient w.r.t. `pred`.
///
/// Writes `d_pred[i] = pred[i] - target[i]` and returns the loss.
#[inline]
pub fn half_sse_backward(pred: &[f32], target: &[f32], d_pred: &mut [f32]) -> f32 {
    assert_eq!(
        pred.len(),
        target.len(),
        "pred len {} does not match target len {}",
        pred.len(),
        target.len()
    );
    assert_eq!(
        pred.len(),
        d_pred.len(),
        "pred len {} does not match d_pred len {}",
        pred.len(),
        d_pred.len()
    );

    let mut sum_sq = 0.0_f32;
    for i in 0..pred.len() {
        let diff = pred[i] - target[i];
        sum_sq = diff.mul_add(diff, sum_sq);
        d_pred[i] = diff;
    }
    0.5 * sum_sq
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_when_equal() {
        let pred = [1.0_f32, -2.0, 0.5];
        assert_eq!(half_sse(&pred, &pred), 0.0);
    }

    #[test]
    fn is_not_divided_by_output_width() {
        let pred = [1.0_f32, 3.0];
        let target = [2.0_f32, 1.0];
        let mut d_pred = [0.0_f32; 2];
        let loss = half_sse_backward(&pred, &target, &mut d_pred);

        // 0.5 * (1 + 4)
        assert!((loss - 2.5).abs() < 1e-6);
        assert!((half_sse(&pred, &target) - loss).abs() < 1e-6);
        assert_eq!(d_pred, [-1.0, 2.0]);
    }
}
