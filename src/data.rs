//! Contiguous dataset storage.
//!
//! The engine consumes datasets by reference and never mutates them. `Dataset`
//! provides validated, row-major storage for feature/target matrices so every
//! sample is guaranteed to share one input and one target width.

use rand::Rng;
use rand::seq::SliceRandom;

use crate::{Error, Result};

/// A supervised dataset: inputs (X) and targets (Y).
///
/// Stored as contiguous buffers with row-major layout:
/// - `inputs.len() == len * input_dim`
/// - `targets.len() == len * target_dim`
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    inputs: Vec<f32>,
    targets: Vec<f32>,
    len: usize,
    input_dim: usize,
    target_dim: usize,
}

impl Dataset {
    /// Build a dataset from flat buffers.
    ///
    /// `inputs` is `(len, input_dim)` and `targets` is `(len, target_dim)`.
    /// Empty buffers give an empty dataset of the stated widths.
    pub fn from_flat(
        inputs: Vec<f32>,
        targets: Vec<f32>,
        input_dim: usize,
        target_dim: usize,
    ) -> Result<Self> {
        if input_dim == 0 {
            return Err(Error::InvalidData("input_dim must be > 0".to_owned()));
        }
        if target_dim == 0 {
            return Err(Error::InvalidData("target_dim must be > 0".to_owned()));
        }
        if !inputs.len().is_multiple_of(input_dim) {
            return Err(Error::InvalidData(format!(
                "inputs length {} is not divisible by input_dim {}",
                inputs.len(),
                input_dim
            )));
        }

        let len = inputs.len() / input_dim;
        if targets.len() != len * target_dim {
            return Err(Error::InvalidData(format!(
                "targets length {} does not match len * target_dim ({} * {})",
                targets.len(),
                len,
                target_dim
            )));
        }

        Ok(Self {
            inputs,
            targets,
            len,
            input_dim,
            target_dim,
        })
    }

    /// An empty dataset with the given widths.
    pub fn empty(input_dim: usize, target_dim: usize) -> Result<Self> {
        Self::from_flat(Vec::new(), Vec::new(), input_dim, target_dim)
    }

    /// Build a dataset from per-sample rows.
    ///
    /// This is a convenience constructor (it copies into contiguous storage).
    pub fn from_rows(inputs: &[Vec<f32>], targets: &[Vec<f32>]) -> Result<Self> {
        if inputs.len() != targets.len() {
            return Err(Error::InvalidData(format!(
                "inputs/targets length mismatch: {} vs {}",
                inputs.len(),
                targets.len()
            )));
        }
        if inputs.is_empty() {
            return Err(Error::InvalidData(
                "cannot infer widths from zero rows; use Dataset::empty".to_owned(),
            ));
        }

        let input_dim = inputs[0].len();
        let target_dim = targets[0].len();
        let mut inputs_flat = Vec::with_capacity(inputs.len() * input_dim);
        let mut targets_flat = Vec::with_capacity(targets.len() * target_dim);

        for (i, (x, y)) in inputs.iter().zip(targets).enumerate() {
            if x.len() != input_dim {
                return Err(Error::InvalidData(format!(
                    "input row {i} has len {}, expected {input_dim}",
                    x.len()
                )));
            }
            if y.len() != target_dim {
                return Err(Error::InvalidData(format!(
                    "target row {i} has len {}, expected {target_dim}",
                    y.len()
                )));
            }
            inputs_flat.extend_from_slice(x);
            targets_flat.extend_from_slice(y);
        }

        Self::from_flat(inputs_flat, targets_flat, input_dim, target_dim)
    }

    #[inline]
    /// Returns the number of samples.
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    /// Returns true if there are no samples.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    /// Returns the per-sample input dimension.
    pub fn input_dim(&self) -> usize {
        self.input_dim
    }

    #[inline]
    /// Returns the per-sample target dimension.
    pub fn target_dim(&self) -> usize {
        self.target_dim
    }

    #[inline]
    /// Returns the `idx`-th input row (shape: `(input_dim,)`).
    ///
    /// Panics if `idx >= len`.
    pub fn input(&self, idx: usize) -> &[f32] {
        let start = idx * self.input_dim;
        &self.inputs[start..start + self.input_dim]
    }

    #[inline]
    /// Returns the `idx`-th target row (shape: `(target_dim,)`).
    ///
    /// Panics if `idx >= len`.
    pub fn target(&self, idx: usize) -> &[f32] {
        let start = idx * self.target_dim;
        &self.targets[start..start + self.target_dim]
    }

    /// Iterate `(input, target)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&[f32], &[f32])> + '_ {
        (0..self.len).map(|idx| (self.input(idx), self.target(idx)))
    }

    /// Copy the samples at `indices` (in that order) into a new dataset.
    ///
    /// Panics if any index is out of bounds.
    pub fn select(&self, indices: &[usize]) -> Self {
        let mut inputs = Vec::with_capacity(indices.len() * self.input_dim);
        let mut targets = Vec::with_capacity(indices.len() * self.target_dim);
        for &idx in indices {
            inputs.extend_from_slice(self.input(idx));
            targets.extend_from_slice(self.target(idx));
        }
        Self {
            inputs,
            targets,
            len: indices.len(),
            input_dim: self.input_dim,
            target_dim: self.target_dim,
        }
    }

    /// Shuffle and split into `(train, test)`.
    ///
    /// `train` receives `max(1, floor(len * train_fraction))` samples (capped at
    /// `len`); the remainder goes to `test`.
    pub fn split<R: Rng + ?Sized>(&self, train_fraction: f32, rng: &mut R) -> Result<(Self, Self)> {
        if !(train_fraction.is_finite() && train_fraction > 0.0 && train_fraction <= 1.0) {
            return Err(Error::InvalidConfig(format!(
                "train_fraction must be in (0, 1], got {train_fraction}"
            )));
        }
        if self.is_empty() {
            return Err(Error::EmptyDataset);
        }

        let mut idx: Vec<usize> = (0..self.len).collect();
        idx.shuffle(rng);

        let n_train = ((self.len as f32 * train_fraction).floor() as usize).clamp(1, self.len);
        let (train_idx, test_idx) = idx.split_at(n_train);
        Ok((self.select(train_idx), self.select(test_idx)))
    }
}
