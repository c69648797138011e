//! Engine configuration.
//!
//! A configuration is applied as a whole through `Engine::reset`; there is no
//! partial reconfiguration.

#[cfg(feature = "serde")]
use std::path::Path;

use crate::{Activation, Error, Optimizer, Result};

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EngineConfig {
    /// Layer widths `[n0, n1, ..., nL]`, input and output included.
    pub layers: Vec<usize>,
    pub activation: Activation,
    pub learning_rate: f32,
    /// Samples per train step, clamped to the dataset size at use time.
    pub batch_size: usize,
    pub optimizer: Optimizer,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            layers: vec![2, 8, 8, 1],
            activation: Activation::Tanh,
            learning_rate: 0.1,
            batch_size: 4,
            optimizer: Optimizer::adam(),
        }
    }
}

impl EngineConfig {
    /// Validate every field.
    pub fn validate(&self) -> Result<()> {
        if self.layers.len() < 2 {
            return Err(Error::InvalidConfig(format!(
                "layers must include input and output widths, got {:?}",
                self.layers
            )));
        }
        if self.layers.contains(&0) {
            return Err(Error::InvalidConfig(format!(
                "all layer widths must be > 0, got {:?}",
                self.layers
            )));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "learning_rate must be finite and > 0, got {}",
                self.learning_rate
            )));
        }
        if self.batch_size == 0 {
            return Err(Error::InvalidConfig("batch_size must be > 0".to_owned()));
        }
        self.optimizer.validate()
    }

    #[inline]
    pub fn input_dim(&self) -> usize {
        self.layers.first().copied().unwrap_or(0)
    }

    #[inline]
    pub fn output_dim(&self) -> usize {
        self.layers.last().copied().unwrap_or(0)
    }
}

#[cfg(feature = "serde")]
impl EngineConfig {
    /// Parse and validate a configuration from JSON.
    ///
    /// Missing fields fall back to [`EngineConfig::default`].
    pub fn from_json_str(s: &str) -> Result<Self> {
        let cfg: EngineConfig = serde_json::from_str(s)
            .map_err(|e| Error::InvalidData(format!("failed to parse config json: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load a configuration from a JSON file.
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let p = path.as_ref();
        let s = std::fs::read_to_string(p)
            .map_err(|e| Error::InvalidData(format!("failed to read {}: {e}", p.display())))?;
        Self::from_json_str(&s)
    }

    pub fn to_json_string_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| Error::InvalidData(format!("failed to serialize config: {e}")))
    }
}
