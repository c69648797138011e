//! Read-only engine snapshots.
//!
//! `EngineState` is an owned copy of everything a viewer needs to draw the
//! network: architecture, a few activation traces, parameters, loss history and
//! (optionally) test metrics. Taking a snapshot never mutates the engine.
//!
//! With the `serde` feature the snapshot can be encoded as JSON. The encoding is a
//! convenience for display layers and carries no format version.

use crate::{Activation, Layer, Network};

/// Number of leading dataset inputs traced through the network in a snapshot.
pub const TRACE_SAMPLES: usize = 5;

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LayerParams {
    pub in_dim: usize,
    pub out_dim: usize,
    /// Row-major (out_dim, in_dim).
    pub weights: Vec<f32>,
    pub biases: Vec<f32>,
}

impl LayerParams {
    /// Weight from input `k` into output `j`.
    #[inline]
    pub fn weight(&self, j: usize, k: usize) -> f32 {
        self.weights[j * self.in_dim + k]
    }
}

impl From<&Layer> for LayerParams {
    fn from(layer: &Layer) -> Self {
        Self {
            in_dim: layer.in_dim(),
            out_dim: layer.out_dim(),
            weights: layer.weights().to_vec(),
            biases: layer.biases().to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EngineState {
    /// Layer widths `[n0, ..., nL]`.
    pub layers: Vec<usize>,
    pub activation: Activation,
    /// One entry per traced input: every layer's activations (input first),
    /// concatenated.
    pub activations: Vec<Vec<f32>>,
    pub params: Vec<LayerParams>,
    pub loss_history: Vec<f32>,
    pub step_history: Vec<u64>,
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub test_loss: Option<f32>,
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub test_acc: Option<f32>,
}

/// Flattened activation trace for one input.
pub(crate) fn trace(network: &Network, input: &[f32]) -> Vec<f32> {
    network.activations(input).into_iter().flatten().collect()
}

pub(crate) fn params(network: &Network) -> Vec<LayerParams> {
    network.layers().iter().map(LayerParams::from).collect()
}

#[cfg(feature = "serde")]
impl EngineState {
    pub fn to_json_string(&self) -> crate::Result<String> {
        serde_json::to_string(self)
            .map_err(|e| crate::Error::InvalidData(format!("failed to serialize snapshot: {e}")))
    }

    pub fn to_json_string_pretty(&self) -> crate::Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| crate::Error::InvalidData(format!("failed to serialize snapshot: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_network() -> Network {
        let l0 = Layer::from_parts(2, 2, vec![1.0, 0.0, 0.0, 1.0], vec![0.0, 0.0]).unwrap();
        let l1 = Layer::from_parts(2, 1, vec![1.0, 1.0], vec![0.5]).unwrap();
        Network::from_layers(vec![l0, l1], Activation::ReLU).unwrap()
    }

    #[test]
    fn trace_concatenates_input_and_layers() {
        let net = tiny_network();
        // hidden = relu([0.25, -1.0]) = [0.25, 0]; out = 0.25 + 0 + 0.5
        assert_eq!(trace(&net, &[0.25, -1.0]), vec![0.25, -1.0, 0.25, 0.0, 0.75]);
    }

    #[test]
    fn params_copy_layout() {
        let p = params(&tiny_network());
        assert_eq!(p.len(), 2);
        assert_eq!(p[0].weight(1, 1), 1.0);
        assert_eq!(p[0].weight(0, 1), 0.0);
        assert_eq!(p[1].biases, vec![0.5]);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn json_omits_missing_test_metrics() {
        let state = EngineState {
            layers: vec![2, 1],
            activation: Activation::Tanh,
            activations: vec![],
            params: params(&tiny_network()),
            loss_history: vec![0.5],
            step_history: vec![0],
            test_loss: None,
            test_acc: None,
        };
        let json = state.to_json_string().unwrap();
        assert!(!json.contains("test_loss"));
        assert!(json.contains("\"activation\":\"tanh\""));

        let with_metrics = EngineState {
            test_loss: Some(0.25),
            test_acc: Some(1.0),
            ..state
        };
        let json = with_metrics.to_json_string().unwrap();
        assert!(json.contains("\"test_loss\":0.25"));
        let back: EngineState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, with_metrics);
    }
}
