//! # Network Configuration
//!
//! A declarative description of a multilayer perceptron: input width, one
//! entry per layer, and the seed used to initialize weights.
//!
//! ```rust
//! use tapegrad_nn::{Activation, MlpConfig};
//!
//! let config = MlpConfig::from_json(r#"{
//!     "inputs": 2,
//!     "seed": 42,
//!     "layers": [
//!         { "width": 3, "activation": "tanh" },
//!         { "width": 1, "activation": "linear" }
//!     ]
//! }"#).unwrap();
//!
//! assert_eq!(config, MlpConfig::new(2, 42)
//!     .with_layer(3, Activation::Tanh)
//!     .with_layer(1, Activation::Linear));
//! ```

use serde::{Deserialize, Serialize};

use crate::activation::Activation;
use crate::error::NnError;

/// One layer of an [`MlpConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerConfig {
    /// Number of neurons.
    pub width: usize,
    /// Activation shared by every neuron of the layer.
    #[serde(default)]
    pub activation: Activation,
}

/// Shape and initialization of a multilayer perceptron.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MlpConfig {
    /// Width of the input vector.
    pub inputs: usize,
    /// Layers from input to output.
    pub layers: Vec<LayerConfig>,
    /// Seed for weight initialization.
    #[serde(default)]
    pub seed: u64,
}

impl MlpConfig {
    /// Start a configuration with no layers.
    pub fn new(inputs: usize, seed: u64) -> Self {
        Self {
            inputs,
            layers: Vec::new(),
            seed,
        }
    }

    /// Append a layer.
    pub fn with_layer(mut self, width: usize, activation: Activation) -> Self {
        self.layers.push(LayerConfig { width, activation });
        self
    }

    /// Parse and validate a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self, NnError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Pretty-printed JSON form.
    pub fn to_json(&self) -> Result<String, NnError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check that the network has inputs, layers, and no empty layer.
    pub fn validate(&self) -> Result<(), NnError> {
        if self.inputs == 0 {
            return Err(NnError::NoInputs);
        }
        if self.layers.is_empty() {
            return Err(NnError::EmptyNetwork);
        }
        if let Some(index) = self.layers.iter().position(|layer| layer.width == 0) {
            return Err(NnError::EmptyLayer { index });
        }
        Ok(())
    }

    /// Output width of the last layer (0 if there are no layers).
    pub fn output_width(&self) -> usize {
        self.layers.last().map_or(0, |layer| layer.width)
    }

    /// Total number of weights and biases the network will have.
    pub fn parameter_count(&self) -> usize {
        let mut fan_in = self.inputs;
        let mut total = 0;
        for layer in &self.layers {
            total += layer.width * (fan_in + 1);
            fan_in = layer.width;
        }
        total
    }
}
