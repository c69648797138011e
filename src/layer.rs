//! A single dense (fully connected) layer.

use rand::Rng;
use rand_distr::StandardNormal;

use crate::activation::ActivationFn;
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    in_dim: usize,
    out_dim: usize,
    /// Row-major matrix with shape (out_dim, in_dim).
    weights: Vec<f32>,
    biases: Vec<f32>,
}

impl Layer {
    /// He-scaled initialization.
    ///
    /// Weights are drawn from a standard normal and scaled by `sqrt(2 / in_dim)`.
    /// Biases start at zero.
    pub fn new_with_rng<R: Rng + ?Sized>(in_dim: usize, out_dim: usize, rng: &mut R) -> Result<Self> {
        if in_dim == 0 || out_dim == 0 {
            return Err(Error::InvalidConfig(format!(
                "layer dims must be > 0, got in_dim={in_dim} out_dim={out_dim}"
            )));
        }

        let scale = (2.0 / in_dim as f32).sqrt();
        let weights = (0..in_dim * out_dim)
            .map(|_| rng.sample::<f32, _>(StandardNormal) * scale)
            .collect();
        let biases = vec![0.0; out_dim];

        Ok(Self {
            in_dim,
            out_dim,
            weights,
            biases,
        })
    }

    /// Build a layer from explicit parameters.
    ///
    /// `weights` is row-major `(out_dim, in_dim)`.
    pub fn from_parts(
        in_dim: usize,
        out_dim: usize,
        weights: Vec<f32>,
        biases: Vec<f32>,
    ) -> Result<Self> {
        if in_dim == 0 || out_dim == 0 {
            return Err(Error::InvalidConfig(format!(
                "layer dims must be > 0, got in_dim={in_dim} out_dim={out_dim}"
            )));
        }
        if weights.len() != in_dim * out_dim {
            return Err(Error::DimensionMismatch {
                what: "layer weights length",
                expected: in_dim * out_dim,
                got: weights.len(),
            });
        }
        if biases.len() != out_dim {
            return Err(Error::DimensionMismatch {
                what: "layer biases length",
                expected: out_dim,
                got: biases.len(),
            });
        }
        if weights.iter().chain(&biases).any(|v| !v.is_finite()) {
            return Err(Error::InvalidData(
                "layer parameters must be finite".to_owned(),
            ));
        }

        Ok(Self {
            in_dim,
            out_dim,
            weights,
            biases,
        })
    }

    #[inline]
    pub fn in_dim(&self) -> usize {
        self.in_dim
    }

    #[inline]
    pub fn out_dim(&self) -> usize {
        self.out_dim
    }

    #[inline]
    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    #[inline]
    pub fn biases(&self) -> &[f32] {
        &self.biases
    }

    #[cfg(test)]
    pub(crate) fn weights_mut(&mut self) -> &mut [f32] {
        &mut self.weights
    }

    #[cfg(test)]
    pub(crate) fn biases_mut(&mut self) -> &mut [f32] {
        &mut self.biases
    }

    /// Forward pass for a single sample.
    ///
    /// Computes:
    /// - `s = W * inputs + b`
    /// - `outputs = act(s)`
    ///
    /// Shape contract:
    /// - `inputs.len() == self.in_dim`
    /// - `outputs.len() == self.out_dim`
    #[inline]
    pub fn forward(&self, act: ActivationFn, inputs: &[f32], outputs: &mut [f32]) {
        debug_assert_eq!(inputs.len(), self.in_dim);
        debug_assert_eq!(outputs.len(), self.out_dim);

        for o in 0..self.out_dim {
            let row = &self.weights[o * self.in_dim..(o + 1) * self.in_dim];
            let mut sum = self.biases[o];
            for (w, x) in row.iter().zip(inputs) {
                sum = w.mul_add(*x, sum);
            }
            outputs[o] = act.forward(sum);
        }
    }

    /// Backward pass for a single sample.
    ///
    /// Accumulate semantics for parameter gradients:
    /// - `d_weights += d_s * inputs^T`
    /// - `d_biases += d_s`
    ///
    /// `d_inputs` is overwritten with `W^T d_s`, the error signal handed to the
    /// previous layer (before its own activation derivative).
    ///
    /// Inputs:
    /// - `inputs`: the same inputs passed to `forward`
    /// - `outputs`: the outputs previously produced by `forward` (post-activation)
    /// - `d_outputs`: upstream gradient dL/d(outputs)
    #[allow(clippy::too_many_arguments)]
    #[inline]
    pub fn backward(
        &self,
        act: ActivationFn,
        inputs: &[f32],
        outputs: &[f32],
        d_outputs: &[f32],
        d_inputs: &mut [f32],
        d_weights: &mut [f32],
        d_biases: &mut [f32],
    ) {
        debug_assert_eq!(inputs.len(), self.in_dim);
        debug_assert_eq!(outputs.len(), self.out_dim);
        debug_assert_eq!(d_outputs.len(), self.out_dim);
        debug_assert_eq!(d_inputs.len(), self.in_dim);
        debug_assert_eq!(d_weights.len(), self.weights.len());
        debug_assert_eq!(d_biases.len(), self.out_dim);

        d_inputs.fill(0.0);

        for o in 0..self.out_dim {
            let d_s = d_outputs[o] * act.grad_from_output(outputs[o]);
            d_biases[o] += d_s;

            let row = o * self.in_dim;
            for i in 0..self.in_dim {
                d_weights[row + i] = d_s.mul_add(inputs[i], d_weights[row + i]);
                d_inputs[i] = self.weights[row + i].mul_add(d_s, d_inputs[i]);
            }
        }
    }

    /// `param -= lr * d_param` for every weight and bias.
    #[inline]
    pub fn sgd_step(&mut self, d_weights: &[f32], d_biases: &[f32], lr: f32) {
        debug_assert_eq!(d_weights.len(), self.weights.len());
        debug_assert_eq!(d_biases.len(), self.biases.len());

        for (w, g) in self.weights.iter_mut().zip(d_weights) {
            *w -= lr * g;
        }
        for (b, g) in self.biases.iter_mut().zip(d_biases) {
            *b -= lr * g;
        }
    }
}
