//! Training engine for a small dense feed-forward network.
//!
//! `mlp-playground` holds the parameters of a stack of fully connected layers that
//! share one activation function (tanh or ReLU, applied at every layer including
//! the output), runs forward inference, computes gradients by backpropagation and
//! applies plain SGD or Adam updates. It is the numeric core behind an
//! interactive "watch a network learn XOR" demo: a driver repeatedly calls
//! [`Engine::train_step`] and reads [`Engine::state`] to draw the network.
//!
//! # Panics vs `Result`
//!
//! Two layers of API:
//!
//! - Low-level hot path (panics on misuse):
//!   - [`Network::forward`], [`Network::backward`], [`Layer::forward`],
//!     [`Layer::backward`]
//!     Shape mismatches are programmer error and panic via `assert!`.
//!
//! - [`Engine`] (shape-checked):
//!   - `reset`, `predict`, `train_step`, `evaluate`, `evaluate_accuracy`
//!     These validate inputs and return [`Result`]; a rejected call never leaves
//!     the engine partially updated.
//!
//! # Data layout and shapes
//!
//! - Scalars are `f32`.
//! - [`Dataset`] stores samples contiguously in row-major layout.
//! - Layer weights are row-major with shape `(out_dim, in_dim)`.
//!
//! # Quick start
//!
//! ```rust
//! use mlp_playground::{Activation, Engine, EngineConfig, Optimizer, datasets};
//!
//! # fn main() -> mlp_playground::Result<()> {
//! let config = EngineConfig {
//!     layers: vec![2, 8, 8, 1],
//!     activation: Activation::Tanh,
//!     learning_rate: 0.1,
//!     batch_size: 4,
//!     optimizer: Optimizer::adam(),
//! };
//! let mut engine = Engine::with_seed(config, 0)?;
//! let xor = datasets::xor();
//!
//! for _ in 0..100 {
//!     engine.train_step(&xor)?;
//! }
//! let state = engine.state(Some(&xor));
//! assert_eq!(state.loss_history.len(), 100);
//! assert!(state.test_loss.is_some());
//! # Ok(())
//! # }
//! ```

pub mod activation;
pub mod config;
pub mod data;
pub mod datasets;
pub mod engine;
pub mod error;
pub mod history;
pub mod layer;
pub mod loss;
pub mod metrics;
pub mod network;
pub mod optim;
pub mod snapshot;

pub use activation::{Activation, ActivationFn};
pub use config::EngineConfig;
pub use data::Dataset;
pub use datasets::DatasetKind;
pub use engine::Engine;
pub use error::{Error, Result};
pub use history::History;
pub use layer::Layer;
pub use network::{Gradients, Network, Scratch, Trainer};
pub use optim::{Optimizer, OptimizerState};
pub use snapshot::{EngineState, LayerParams};
