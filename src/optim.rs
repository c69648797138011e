//! Optimizers.
//!
//! This module provides allocation-free-per-step optimizers that update a `Network`
//! given a set of averaged `Gradients`.
//!
//! Design notes:
//! - Optimizer *state* (Adam moments and step counter) lives outside the network.
//! - The engine owns the optimizer state and rebuilds it on every reset.

use crate::{Error, Gradients, Network, Result};

pub const DEFAULT_BETA1: f32 = 0.9;
pub const DEFAULT_BETA2: f32 = 0.999;
pub const DEFAULT_EPS: f32 = 1e-8;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
/// Parameter-update rule.
pub enum Optimizer {
    /// Plain SGD: `param -= lr * g`.
    #[default]
    Sgd,
    /// Adam (bias-corrected, one global step counter).
    Adam {
        #[cfg_attr(feature = "serde", serde(default = "default_beta1"))]
        beta1: f32,
        #[cfg_attr(feature = "serde", serde(default = "default_beta2"))]
        beta2: f32,
        #[cfg_attr(feature = "serde", serde(default = "default_eps"))]
        eps: f32,
    },
}

#[cfg(feature = "serde")]
fn default_beta1() -> f32 {
    DEFAULT_BETA1
}

#[cfg(feature = "serde")]
fn default_beta2() -> f32 {
    DEFAULT_BETA2
}

#[cfg(feature = "serde")]
fn default_eps() -> f32 {
    DEFAULT_EPS
}

impl Optimizer {
    /// Adam with the usual defaults (0.9, 0.999, 1e-8).
    pub const fn adam() -> Self {
        Optimizer::Adam {
            beta1: DEFAULT_BETA1,
            beta2: DEFAULT_BETA2,
            eps: DEFAULT_EPS,
        }
    }

    /// Lowercase name (`"sgd"` / `"adam"`).
    pub fn name(self) -> &'static str {
        match self {
            Optimizer::Sgd => "sgd",
            Optimizer::Adam { .. } => "adam",
        }
    }

    /// Validate optimizer hyperparameters.
    pub fn validate(self) -> Result<()> {
        match self {
            Optimizer::Sgd => Ok(()),
            Optimizer::Adam { beta1, beta2, eps } => {
                if !(beta1.is_finite() && (0.0..1.0).contains(&beta1)) {
                    return Err(Error::InvalidConfig(format!(
                        "adam beta1 must be finite and in [0,1), got {beta1}"
                    )));
                }
                if !(beta2.is_finite() && (0.0..1.0).contains(&beta2)) {
                    return Err(Error::InvalidConfig(format!(
                        "adam beta2 must be finite and in [0,1), got {beta2}"
                    )));
                }
                if !(eps.is_finite() && eps > 0.0) {
                    return Err(Error::InvalidConfig(format!(
                        "adam eps must be finite and > 0, got {eps}"
                    )));
                }
                Ok(())
            }
        }
    }

    /// Allocate zeroed optimizer state for `network`.
    pub fn state(self, network: &Network) -> Result<OptimizerState> {
        self.validate()?;

        match self {
            Optimizer::Sgd => Ok(OptimizerState::Sgd),
            Optimizer::Adam { beta1, beta2, eps } => {
                let (mw, mb) = zeros_like_params(network);
                let (vw, vb) = zeros_like_params(network);
                Ok(OptimizerState::Adam {
                    beta1,
                    beta2,
                    eps,
                    t: 0,
                    beta1_pow: 1.0,
                    beta2_pow: 1.0,
                    m_weights: mw,
                    m_biases: mb,
                    v_weights: vw,
                    v_biases: vb,
                })
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
/// Owned optimizer state.
pub enum OptimizerState {
    /// Plain SGD (no state).
    #[default]
    Sgd,
    /// Adam state.
    Adam {
        beta1: f32,
        beta2: f32,
        eps: f32,
        t: u64,
        beta1_pow: f32,
        beta2_pow: f32,
        m_weights: Vec<Vec<f32>>,
        m_biases: Vec<Vec<f32>>,
        v_weights: Vec<Vec<f32>>,
        v_biases: Vec<Vec<f32>>,
    },
}

impl OptimizerState {
    /// Number of updates applied so far (always 0 for SGD).
    pub fn step_count(&self) -> u64 {
        match self {
            OptimizerState::Sgd => 0,
            OptimizerState::Adam { t, .. } => *t,
        }
    }

    /// Apply one optimizer step from already-averaged gradients.
    ///
    /// Adam overwrites `grads` with its update direction.
    pub fn step(&mut self, network: &mut Network, grads: &mut Gradients, lr: f32) {
        assert!(lr.is_finite() && lr > 0.0, "lr must be finite and > 0");

        match self {
            OptimizerState::Sgd => {
                network.sgd_step(grads, lr);
            }
            OptimizerState::Adam {
                beta1,
                beta2,
                eps,
                t,
                beta1_pow,
                beta2_pow,
                m_weights,
                m_biases,
                v_weights,
                v_biases,
            } => {
                // One shared t per step, however many samples were in the batch.
                *t += 1;
                *beta1_pow *= *beta1;
                *beta2_pow *= *beta2;

                let one_minus_beta1 = 1.0 - *beta1;
                let one_minus_beta2 = 1.0 - *beta2;
                let corr1 = 1.0 - *beta1_pow;
                let corr2 = 1.0 - *beta2_pow;

                for layer_idx in 0..network.num_layers() {
                    adam_update(
                        grads.d_weights_mut(layer_idx),
                        &mut m_weights[layer_idx],
                        &mut v_weights[layer_idx],
                        (*beta1, one_minus_beta1, corr1),
                        (*beta2, one_minus_beta2, corr2),
                        *eps,
                    );
                    adam_update(
                        grads.d_biases_mut(layer_idx),
                        &mut m_biases[layer_idx],
                        &mut v_biases[layer_idx],
                        (*beta1, one_minus_beta1, corr1),
                        (*beta2, one_minus_beta2, corr2),
                        *eps,
                    );
                }

                network.sgd_step(grads, lr);
            }
        }
    }
}

/// Update moments in place and overwrite `g` with `m_hat / (sqrt(v_hat) + eps)`.
#[inline]
fn adam_update(
    g: &mut [f32],
    m: &mut [f32],
    v: &mut [f32],
    (beta1, one_minus_beta1, corr1): (f32, f32, f32),
    (beta2, one_minus_beta2, corr2): (f32, f32, f32),
    eps: f32,
) {
    debug_assert_eq!(g.len(), m.len());
    debug_assert_eq!(g.len(), v.len());

    for i in 0..g.len() {
        let gi = g[i];
        m[i] = beta1 * m[i] + one_minus_beta1 * gi;
        v[i] = beta2 * v[i] + one_minus_beta2 * (gi * gi);

        let m_hat = m[i] / corr1;
        let v_hat = v[i] / corr2;
        g[i] = m_hat / (v_hat.sqrt() + eps);
    }
}

fn zeros_like_params(network: &Network) -> (Vec<Vec<f32>>, Vec<Vec<f32>>) {
    let ws = network
        .layers()
        .iter()
        .map(|layer| vec![0.0; layer.weights().len()])
        .collect();
    let bs = network
        .layers()
        .iter()
        .map(|layer| vec![0.0; layer.biases().len()])
        .collect();
    (ws, bs)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::{Activation, Layer};

    fn unit_network(w: f32, b: f32) -> Network {
        let layer = Layer::from_parts(1, 1, vec![w], vec![b]).unwrap();
        Network::from_layers(vec![layer], Activation::Tanh).unwrap()
    }

    fn params(network: &Network) -> (f32, f32) {
        let layer = network.layer(0).unwrap();
        (layer.weights()[0], layer.biases()[0])
    }

    fn step_with_grad(opt: &mut OptimizerState, network: &mut Network, g: f32, lr: f32) {
        let mut grads = network.gradients();
        grads.d_weights_mut(0)[0] = g;
        grads.d_biases_mut(0)[0] = g;
        opt.step(network, &mut grads, lr);
    }

    #[test]
    fn optimizer_validation_rejects_bad_hyperparams() {
        assert!(Optimizer::Sgd.validate().is_ok());
        assert!(Optimizer::adam().validate().is_ok());
        for (beta1, beta2, eps) in [
            (1.0, 0.999, 1e-8),
            (0.9, 1.0, 1e-8),
            (-0.1, 0.999, 1e-8),
            (0.9, 0.999, 0.0),
            (0.9, 0.999, f32::NAN),
        ] {
            assert!(Optimizer::Adam { beta1, beta2, eps }.validate().is_err());
        }
    }

    #[test]
    fn sgd_subtracts_scaled_gradient() {
        let mut network = unit_network(1.0, 2.0);
        let mut grads = network.gradients();
        grads.d_weights_mut(0)[0] = 3.0;
        grads.d_biases_mut(0)[0] = 4.0;

        let mut opt = Optimizer::Sgd.state(&network).unwrap();
        opt.step(&mut network, &mut grads, 0.1);

        let (w, b) = params(&network);
        assert!((w - (1.0 - 0.1 * 3.0)).abs() < 1e-6);
        assert!((b - (2.0 - 0.1 * 4.0)).abs() < 1e-6);
        assert_eq!(opt.step_count(), 0);
    }

    #[test]
    fn adam_first_step_matches_expected_direction_for_unit_grad() {
        let mut network = unit_network(1.0, 1.0);
        let mut opt = Optimizer::Adam {
            beta1: 0.9,
            beta2: 0.999,
            eps: 1.0,
        }
        .state(&network)
        .unwrap();
        step_with_grad(&mut opt, &mut network, 1.0, 0.1);

        // With eps=1.0 and unit grad, the first bias-corrected step has update 1/(1+eps) = 0.5.
        let (w, b) = params(&network);
        assert!((w - (1.0 - 0.1 * 0.5)).abs() < 1e-6);
        assert!((b - (1.0 - 0.1 * 0.5)).abs() < 1e-6);
        assert_eq!(opt.step_count(), 1);
    }

    #[test]
    fn adam_bias_correction_depends_on_step_count() {
        let lr = 0.1_f32;
        let (beta1, beta2) = (0.9_f64, 0.999_f64);

        // t = 1: m_hat = g and v_hat = g^2, so the step is lr * g / (|g| + eps).
        let mut first = unit_network(0.0, 0.0);
        let mut opt = Optimizer::adam().state(&first).unwrap();
        step_with_grad(&mut opt, &mut first, 1.0, lr);
        let update_t1 = -params(&first).0;
        assert!((update_t1 - lr).abs() < 1e-5, "update_t1={update_t1}");
        // Without correction this would be (1 - beta1) / sqrt(1 - beta2) ~= 3.16 * lr.
        assert!(update_t1 < 1.5 * lr);

        // t = 100: 99 zero-gradient steps leave the parameters alone but advance t.
        let mut later = unit_network(0.0, 0.0);
        let mut opt = Optimizer::adam().state(&later).unwrap();
        for _ in 0..99 {
            step_with_grad(&mut opt, &mut later, 0.0, lr);
        }
        assert_eq!(params(&later), (0.0, 0.0));
        step_with_grad(&mut opt, &mut later, 1.0, lr);
        assert_eq!(opt.step_count(), 100);
        let update_t100 = -params(&later).0;

        let m_hat = (1.0 - beta1) / (1.0 - beta1.powi(100));
        let v_hat = (1.0 - beta2) / (1.0 - beta2.powi(100));
        let expected = lr as f64 * m_hat / (v_hat.sqrt() + 1e-8);
        assert!(
            (update_t100 as f64 - expected).abs() < 1e-4,
            "update_t100={update_t100} expected={expected}"
        );
        assert!((update_t1 - update_t100).abs() > 1e-3);
    }

    #[test]
    fn adam_state_is_shaped_like_parameters() {
        let layer0 = Layer::from_parts(2, 3, vec![0.0; 6], vec![0.0; 3]).unwrap();
        let layer1 = Layer::from_parts(3, 1, vec![0.0; 3], vec![0.0]).unwrap();
        let network = Network::from_layers(vec![layer0, layer1], Activation::ReLU).unwrap();

        match Optimizer::adam().state(&network).unwrap() {
            OptimizerState::Adam {
                t,
                m_weights,
                v_biases,
                ..
            } => {
                assert_eq!(t, 0);
                assert_eq!(m_weights.iter().map(Vec::len).collect::<Vec<_>>(), [6, 3]);
                assert_eq!(v_biases.iter().map(Vec::len).collect::<Vec<_>>(), [3, 1]);
                assert!(m_weights.iter().flatten().all(|&x| x == 0.0));
            }
            OptimizerState::Sgd => panic!("expected adam state"),
        }
    }
}
