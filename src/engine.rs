//! The training engine.
//!
//! `Engine` owns everything that changes while training: parameters, optimizer
//! state, reusable forward/backward buffers, loss history and the random source
//! used for initialization and batch sampling.
//!
//! Every public operation validates its input before touching state, so a
//! rejected call leaves the engine exactly as it was. The engine does no
//! locking: callers that share one instance across threads must serialize
//! `reset`/`train_step` themselves (`predict`/`evaluate` only read).

use log::{debug, trace, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::snapshot::{self, EngineState, TRACE_SAMPLES};
use crate::{
    Dataset, EngineConfig, Error, History, Network, OptimizerState, Result, Trainer, loss,
    metrics,
};

#[derive(Debug)]
pub struct Engine<R = StdRng> {
    config: EngineConfig,
    network: Network,
    optimizer: OptimizerState,
    trainer: Trainer,
    history: History,
    // Permutation of 0..len of the last dataset trained on.
    batch_order: Vec<usize>,
    rng: R,
}

impl Engine<StdRng> {
    /// Build an engine seeded from OS entropy.
    pub fn new(config: EngineConfig) -> Result<Self> {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Build an engine with a deterministic seed.
    pub fn with_seed(config: EngineConfig, seed: u64) -> Result<Self> {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> Engine<R> {
    /// Build an engine drawing all randomness (initialization and batch
    /// sampling) from `rng`.
    pub fn with_rng(config: EngineConfig, mut rng: R) -> Result<Self> {
        let (network, optimizer, trainer) = build(&config, &mut rng)?;
        log_reset(&config);
        Ok(Self {
            config,
            network,
            optimizer,
            trainer,
            history: History::new(),
            batch_order: Vec::new(),
            rng,
        })
    }

    /// Reinitialize every piece of owned state from `config`.
    ///
    /// Parameters are redrawn, optimizer moments and step counter are zeroed and
    /// the loss history is cleared. On error nothing changes.
    pub fn reset(&mut self, config: EngineConfig) -> Result<()> {
        let (network, optimizer, trainer) = build(&config, &mut self.rng)?;
        log_reset(&config);

        self.config = config;
        self.network = network;
        self.optimizer = optimizer;
        self.trainer = trainer;
        self.history.clear();
        Ok(())
    }

    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[inline]
    pub fn network(&self) -> &Network {
        &self.network
    }

    #[inline]
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Adam's shared step counter `t` (always 0 under SGD).
    #[inline]
    pub fn optimizer_steps(&self) -> u64 {
        self.optimizer.step_count()
    }

    /// Run one sample through the network and return the output layer.
    pub fn predict(&self, input: &[f32]) -> Result<Vec<f32>> {
        if input.len() != self.network.input_dim() {
            return Err(Error::DimensionMismatch {
                what: "input length",
                expected: self.network.input_dim(),
                got: input.len(),
            });
        }

        let mut scratch = self.network.scratch();
        Ok(self.network.forward(input, &mut scratch).to_vec())
    }

    /// Full activation sequence for one input (input first, output last).
    pub fn activations(&self, input: &[f32]) -> Result<Vec<Vec<f32>>> {
        if input.len() != self.network.input_dim() {
            return Err(Error::DimensionMismatch {
                what: "input length",
                expected: self.network.input_dim(),
                got: input.len(),
            });
        }
        Ok(self.network.activations(input))
    }

    /// One training step: sample a batch, backprop, apply one optimizer update.
    ///
    /// The batch holds `min(batch_size, data.len())` distinct samples drawn
    /// uniformly at random; successive steps draw independently, so there is no
    /// epoch structure. Gradients and loss are averaged over the batch.
    ///
    /// Returns the average batch loss, which is also appended to the history.
    /// Buffers are reused, so steps on a same-sized dataset do not allocate
    /// beyond the history entry.
    pub fn train_step(&mut self, data: &Dataset) -> Result<f32> {
        self.check_dataset(data)?;

        if self.batch_order.len() != data.len() {
            self.batch_order.clear();
            self.batch_order.extend(0..data.len());
        }
        let batch_size = self.config.batch_size.min(data.len());
        let (batch, _) = self.batch_order.partial_shuffle(&mut self.rng, batch_size);

        self.trainer.grads.zero();
        let mut total_loss = 0.0_f32;

        for &idx in batch.iter() {
            let input = data.input(idx);
            let target = data.target(idx);

            self.network.forward(input, &mut self.trainer.scratch);
            total_loss += loss::half_sse_backward(
                self.trainer.scratch.output(),
                target,
                self.trainer.grads.d_output_mut(),
            );
            self.network
                .backward(input, &self.trainer.scratch, &mut self.trainer.grads);
        }

        let inv_batch = 1.0 / batch_size as f32;
        self.trainer.grads.scale(inv_batch);
        self.optimizer.step(
            &mut self.network,
            &mut self.trainer.grads,
            self.config.learning_rate,
        );

        let avg_loss = total_loss * inv_batch;
        let step = self.history.push(avg_loss);
        trace!("step {step}: batch={batch_size} loss={avg_loss}");

        Ok(avg_loss)
    }

    /// Mean half-SSE over every sample in `data`.
    pub fn evaluate(&self, data: &Dataset) -> Result<f32> {
        self.check_dataset(data)?;

        let mut scratch = self.network.scratch();
        let mut total = 0.0_f32;
        for (input, target) in data.iter() {
            self.network.forward(input, &mut scratch);
            total += loss::half_sse(scratch.output(), target);
        }
        Ok(total / data.len() as f32)
    }

    /// Fraction of samples whose thresholded output equals the target label.
    ///
    /// Requires a single output unit. The threshold is 0.5 for every activation
    /// and an output of exactly 0.5 counts as class 0 (see [`metrics::binary_class`]).
    pub fn evaluate_accuracy(&self, data: &Dataset) -> Result<f32> {
        if self.network.output_dim() != 1 {
            return Err(Error::DimensionMismatch {
                what: "output width for binary accuracy",
                expected: 1,
                got: self.network.output_dim(),
            });
        }
        self.check_dataset(data)?;

        let mut scratch = self.network.scratch();
        let mut correct = 0_usize;
        for (input, target) in data.iter() {
            let out = self.network.forward(input, &mut scratch);
            if metrics::is_correct(out[0], target[0]) {
                correct += 1;
            }
        }
        Ok(correct as f32 / data.len() as f32)
    }

    /// Read-only snapshot of the engine.
    ///
    /// With a reference dataset, the first few inputs are traced through the
    /// network and test loss/accuracy are filled in. Metrics that cannot be
    /// computed for that dataset are left as `None`; this never fails.
    pub fn state(&self, data: Option<&Dataset>) -> EngineState {
        let mut activations = Vec::new();
        let mut test_loss = None;
        let mut test_acc = None;

        if let Some(data) = data {
            if data.input_dim() == self.network.input_dim() {
                activations = (0..data.len().min(TRACE_SAMPLES))
                    .map(|idx| snapshot::trace(&self.network, data.input(idx)))
                    .collect();
            }

            match self.evaluate(data) {
                Ok(l) => test_loss = Some(l),
                Err(e) => warn!("snapshot omits test loss: {e}"),
            }
            match self.evaluate_accuracy(data) {
                Ok(a) => test_acc = Some(a),
                Err(e) => warn!("snapshot omits test accuracy: {e}"),
            }
        }

        EngineState {
            layers: self.network.sizes(),
            activation: self.network.activation(),
            activations,
            params: snapshot::params(&self.network),
            loss_history: self.history.losses().to_vec(),
            step_history: self.history.steps().to_vec(),
            test_loss,
            test_acc,
        }
    }

    fn check_dataset(&self, data: &Dataset) -> Result<()> {
        if data.is_empty() {
            return Err(Error::EmptyDataset);
        }
        if data.input_dim() != self.network.input_dim() {
            return Err(Error::DimensionMismatch {
                what: "dataset input width",
                expected: self.network.input_dim(),
                got: data.input_dim(),
            });
        }
        if data.target_dim() != self.network.output_dim() {
            return Err(Error::DimensionMismatch {
                what: "dataset target width",
                expected: self.network.output_dim(),
                got: data.target_dim(),
            });
        }
        Ok(())
    }
}

fn build<R: Rng + ?Sized>(
    config: &EngineConfig,
    rng: &mut R,
) -> Result<(Network, OptimizerState, Trainer)> {
    config.validate()?;

    let network = Network::new_with_rng(&config.layers, config.activation, rng)?;
    let optimizer = config.optimizer.state(&network)?;
    let trainer = network.trainer();
    Ok((network, optimizer, trainer))
}

fn log_reset(config: &EngineConfig) {
    debug!(
        "engine reset: layers={:?} activation={} optimizer={} lr={} batch_size={}",
        config.layers,
        config.activation.name(),
        config.optimizer.name(),
        config.learning_rate,
        config.batch_size
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::{Activation, Layer, Optimizer};

    fn single_unit_engine(activation: Activation, weight: f32, bias: f32) -> Engine {
        let config = EngineConfig {
            layers: vec![1, 1],
            activation,
            learning_rate: 0.1,
            batch_size: 1,
            optimizer: Optimizer::Sgd,
        };
        let mut engine = Engine::with_seed(config, 0).unwrap();
        let layer = Layer::from_parts(1, 1, vec![weight], vec![bias]).unwrap();
        engine.network = Network::from_layers(vec![layer], activation).unwrap();
        engine
    }

    fn labelled(points: &[(f32, f32)]) -> Dataset {
        let xs = points.iter().map(|&(x, _)| vec![x]).collect::<Vec<_>>();
        let ys = points.iter().map(|&(_, y)| vec![y]).collect::<Vec<_>>();
        Dataset::from_rows(&xs, &ys).unwrap()
    }

    #[test]
    fn accuracy_counts_forced_predictions() {
        // x=0 -> 0.4 (class 0), x=1 -> 0.6 (class 1).
        let engine = single_unit_engine(Activation::ReLU, 0.2, 0.4);
        assert!((engine.predict(&[0.0]).unwrap()[0] - 0.4).abs() < 1e-6);
        assert!((engine.predict(&[1.0]).unwrap()[0] - 0.6).abs() < 1e-6);

        let data = labelled(&[(0.0, 0.0), (1.0, 1.0), (0.0, 0.0), (1.0, 1.0)]);
        assert_eq!(engine.evaluate_accuracy(&data).unwrap(), 1.0);
    }

    #[test]
    fn accuracy_tie_at_threshold_is_class_zero() {
        let engine = single_unit_engine(Activation::ReLU, 0.0, 0.5);
        assert_eq!(engine.predict(&[3.0]).unwrap(), vec![0.5]);

        assert_eq!(engine.evaluate_accuracy(&labelled(&[(3.0, 0.0)])).unwrap(), 1.0);
        assert_eq!(engine.evaluate_accuracy(&labelled(&[(3.0, 1.0)])).unwrap(), 0.0);
    }

    #[test]
    fn tanh_outputs_use_the_same_half_threshold() {
        // tanh(0.4) ~= 0.38: positive, but still class 0 under the 0.5 threshold.
        let engine = single_unit_engine(Activation::Tanh, 0.0, 0.4);
        let data = labelled(&[(0.0, 1.0), (1.0, 0.0)]);
        assert_eq!(engine.evaluate_accuracy(&data).unwrap(), 0.5);
    }

    #[test]
    fn sgd_step_matches_manual_update() {
        let config = EngineConfig {
            layers: vec![2, 3, 1],
            activation: Activation::Tanh,
            learning_rate: 0.05,
            batch_size: 8,
            optimizer: Optimizer::Sgd,
        };
        let mut engine = Engine::with_seed(config, 42).unwrap();
        let data = Dataset::from_rows(&[vec![0.3, -0.2]], &[vec![1.0]]).unwrap();

        let before = engine.network().clone();
        let mut trainer = before.trainer();
        before.forward(data.input(0), &mut trainer.scratch);
        let expected_loss = loss::half_sse_backward(
            trainer.scratch.output(),
            data.target(0),
            trainer.grads.d_output_mut(),
        );
        before.backward(data.input(0), &trainer.scratch, &mut trainer.grads);

        let got_loss = engine.train_step(&data).unwrap();
        assert!((got_loss - expected_loss).abs() < 1e-6);

        for l in 0..before.num_layers() {
            let old = before.layer(l).unwrap();
            let new = engine.network().layer(l).unwrap();
            for (p, (w0, w1)) in old.weights().iter().zip(new.weights()).enumerate() {
                let expected = w0 - 0.05 * trainer.grads.d_weights(l)[p];
                assert!((w1 - expected).abs() < 1e-6);
            }
            for (p, (b0, b1)) in old.biases().iter().zip(new.biases()).enumerate() {
                let expected = b0 - 0.05 * trainer.grads.d_biases(l)[p];
                assert!((b1 - expected).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn batch_gradients_are_averaged_not_summed() {
        let config = EngineConfig {
            layers: vec![2, 4, 1],
            activation: Activation::Tanh,
            learning_rate: 0.5,
            batch_size: 2,
            optimizer: Optimizer::Sgd,
        };
        let one = Dataset::from_rows(&[vec![0.5, 0.5]], &[vec![-0.5]]).unwrap();
        let two = one.select(&[0, 0]);

        let mut a = Engine::with_seed(config.clone(), 3).unwrap();
        let mut b = Engine::with_seed(config, 3).unwrap();
        let loss_a = a.train_step(&one).unwrap();
        let loss_b = b.train_step(&two).unwrap();

        assert!((loss_a - loss_b).abs() < 1e-6);
        for (la, lb) in a.network().layers().iter().zip(b.network().layers()) {
            for (wa, wb) in la.weights().iter().zip(lb.weights()) {
                assert!((wa - wb).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn batches_hold_distinct_samples_and_vary_across_steps() {
        // Same input, distinct targets: each sample has its own loss, so the
        // reported batch loss identifies which sample was drawn.
        let config = EngineConfig {
            layers: vec![1, 1],
            activation: Activation::Tanh,
            learning_rate: 0.01,
            batch_size: 1,
            optimizer: Optimizer::Sgd,
        };
        let targets = [0.1, 0.35, 0.6, 0.85];
        let data = labelled(&targets.map(|t| (0.0, t)));
        let mut engine = Engine::with_seed(config, 13).unwrap();

        let mut seen = [false; 4];
        for _ in 0..40 {
            let per_sample: Vec<f32> = (0..4)
                .map(|i| engine.evaluate(&data.select(&[i])).unwrap())
                .collect();
            let loss = engine.train_step(&data).unwrap();
            let drawn = per_sample
                .iter()
                .position(|&l| (l - loss).abs() < 1e-7)
                .expect("batch loss matches one sample");
            seen[drawn] = true;
        }
        assert!(seen.iter().filter(|&&s| s).count() > 1, "{seen:?}");

        // A batch the size of the dataset uses every sample exactly once.
        let mut full = Engine::with_seed(
            EngineConfig {
                batch_size: 4,
                ..engine.config().clone()
            },
            13,
        )
        .unwrap();
        for _ in 0..10 {
            let expected = full.evaluate(&data).unwrap();
            let loss = full.train_step(&data).unwrap();
            assert!((loss - expected).abs() < 1e-6, "{loss} vs {expected}");

            let mut order = full.batch_order.clone();
            order.sort_unstable();
            assert_eq!(order, vec![0, 1, 2, 3]);
        }
    }

    #[test]
    fn adam_counter_advances_once_per_step() {
        let config = EngineConfig {
            layers: vec![2, 3, 1],
            batch_size: 4,
            ..EngineConfig::default()
        };
        let mut engine = Engine::with_seed(config, 1).unwrap();
        let data = crate::datasets::spiral(16);

        for _ in 0..3 {
            engine.train_step(&data).unwrap();
        }
        assert_eq!(engine.optimizer_steps(), 3);
        assert_eq!(engine.history().len(), 3);

        engine.reset(engine.config().clone()).unwrap();
        assert_eq!(engine.optimizer_steps(), 0);
    }

    #[test]
    fn rejected_train_step_leaves_state_untouched() {
        let mut engine = Engine::with_seed(EngineConfig::default(), 5).unwrap();
        engine.train_step(&crate::datasets::xor()).unwrap();
        let before = engine.network().clone();

        let wide = Dataset::from_flat(vec![0.0; 6], vec![0.0; 2], 3, 1).unwrap();
        assert!(matches!(
            engine.train_step(&wide),
            Err(Error::DimensionMismatch { .. })
        ));
        let two_targets = Dataset::from_flat(vec![0.0; 4], vec![0.0; 4], 2, 2).unwrap();
        assert!(engine.train_step(&two_targets).is_err());
        assert_eq!(
            engine.train_step(&Dataset::empty(2, 1).unwrap()),
            Err(Error::EmptyDataset)
        );

        assert_eq!(engine.network().layers(), before.layers());
        assert_eq!(engine.history().len(), 1);
        assert_eq!(engine.optimizer_steps(), 1);
    }
}
