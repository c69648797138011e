//! Metrics.
//!
//! Metrics are evaluation helpers; they never participate in backprop.

/// Decision threshold applied to the raw network output.
///
/// The same threshold is used whatever the activation, so a tanh network
/// (range `[-1, 1]`) is still split at 0.5.
pub const DECISION_THRESHOLD: f32 = 0.5;

/// Binary class for a single raw output.
///
/// Strictly greater than [`DECISION_THRESHOLD`] is class 1; an output of exactly
/// 0.5 is class 0.
#[inline]
pub fn binary_class(output: f32) -> f32 {
    if output > DECISION_THRESHOLD { 1.0 } else { 0.0 }
}

/// Whether `output` classifies to exactly the target label.
///
/// Targets are compared as labels: only `0.0` and `1.0` can ever match.
#[inline]
pub fn is_correct(output: f32, target: f32) -> bool {
    binary_class(output) == target
}
