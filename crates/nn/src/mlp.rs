//! # Multilayer Perceptron
//!
//! A feed-forward stack of [`Layer`]s. Running the network records a fresh
//! expression on the tape for every call; the weight and bias leaves are
//! shared by all of them, so gradients from a [`Mlp::loss`] node flow back
//! into the same parameters regardless of how many times the network ran.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tapegrad_engine::{Node, Tape};
use tracing::debug;

use crate::config::{LayerConfig, MlpConfig};
use crate::error::NnError;
use crate::layer::Layer;

#[derive(Debug, Clone)]
pub struct Mlp {
    layers: Vec<Layer>,
}

impl Mlp {
    /// Build a randomly initialized network.
    pub fn new<R: Rng>(
        tape: &mut Tape,
        inputs: usize,
        layers: &[LayerConfig],
        rng: &mut R,
    ) -> Result<Self, NnError> {
        if inputs == 0 {
            return Err(NnError::NoInputs);
        }
        if let Some(index) = layers.iter().position(|layer| layer.width == 0) {
            return Err(NnError::EmptyLayer { index });
        }

        let mut fan_in = inputs;
        let mut built = Vec::with_capacity(layers.len());
        for layer in layers {
            built.push(Layer::new(tape, fan_in, layer.width, layer.activation, rng));
            fan_in = layer.width;
        }
        Self::from_layers(built)
    }

    /// Build a network from a configuration, seeding initialization from
    /// `config.seed`.
    pub fn from_config(tape: &mut Tape, config: &MlpConfig) -> Result<Self, NnError> {
        config.validate()?;
        let mut rng = StdRng::seed_from_u64(config.seed);
        Self::new(tape, config.inputs, &config.layers, &mut rng)
    }

    /// Assemble a network from existing layers.
    ///
    /// Each layer's input width must equal the previous layer's output width.
    pub fn from_layers(layers: Vec<Layer>) -> Result<Self, NnError> {
        if layers.is_empty() {
            return Err(NnError::EmptyNetwork);
        }
        for (index, pair) in layers.windows(2).enumerate() {
            let (prev, next) = (&pair[0], &pair[1]);
            if next.input_width() != prev.output_width() {
                return Err(NnError::LayerMismatch {
                    index: index + 1,
                    expected: prev.output_width(),
                    got: next.input_width(),
                });
            }
        }

        let mlp = Self { layers };
        debug!(
            inputs = mlp.input_width(),
            widths = ?mlp.widths(),
            parameters = mlp.parameter_count(),
            "network built"
        );
        Ok(mlp)
    }

    /// Record the network over input nodes, threading each layer's outputs
    /// into the next.
    pub fn forward(&self, tape: &mut Tape, inputs: &[Node]) -> Result<Vec<Node>, NnError> {
        let mut activations = inputs.to_vec();
        for layer in &self.layers {
            activations = layer.forward(tape, &activations)?;
        }
        Ok(activations)
    }

    /// Record the network over constant inputs.
    pub fn run(&self, tape: &mut Tape, inputs: &[f64]) -> Result<Vec<Node>, NnError> {
        self.check_inputs(inputs.len())?;
        let inputs: Vec<Node> = inputs.iter().map(|&x| tape.leaf(x)).collect();
        self.forward(tape, &inputs)
    }

    /// Run the network and read back the output values.
    pub fn predict(&self, tape: &mut Tape, inputs: &[f64]) -> Result<Vec<f64>, NnError> {
        let outputs = self.run(tape, inputs)?;
        Ok(outputs.into_iter().map(|out| tape.value(out)).collect())
    }

    /// Record `Σ (outputᵢ - targetᵢ)²` and return the scalar loss node.
    ///
    /// Call [`Tape::backward`] on the result to fill in parameter gradients.
    pub fn loss(&self, tape: &mut Tape, inputs: &[f64], targets: &[f64]) -> Result<Node, NnError> {
        if targets.len() != self.output_width() {
            return Err(NnError::TargetWidth {
                expected: self.output_width(),
                got: targets.len(),
            });
        }

        let outputs = self.run(tape, inputs)?;
        let squares: Vec<Node> = outputs
            .into_iter()
            .zip(targets)
            .map(|(out, &target)| {
                let negated = tape.leaf(-target);
                let diff = tape.add(out, negated);
                tape.mul(diff, diff)
            })
            .collect();

        // output_width is at least one, so the sum always exists
        let loss = tape.sum(squares).ok_or(NnError::EmptyNetwork)?;
        debug!(loss = tape.value(loss), "loss recorded");
        Ok(loss)
    }

    /// Every weight and bias leaf: layer by layer, neuron by neuron, weights
    /// before bias.
    pub fn params(&self) -> Vec<Node> {
        self.layers.iter().flat_map(Layer::params).collect()
    }

    /// Current gradients of [`Mlp::params`], in the same order.
    pub fn gradients(&self, tape: &Tape) -> Vec<f64> {
        self.params().into_iter().map(|p| tape.grad(p)).collect()
    }

    pub fn parameter_count(&self) -> usize {
        self.layers
            .iter()
            .map(|layer| layer.output_width() * (layer.input_width() + 1))
            .sum()
    }

    pub fn input_width(&self) -> usize {
        self.layers.first().map_or(0, Layer::input_width)
    }

    pub fn output_width(&self) -> usize {
        self.layers.last().map_or(0, Layer::output_width)
    }

    /// Output width of every layer.
    pub fn widths(&self) -> Vec<usize> {
        self.layers.iter().map(Layer::output_width).collect()
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    fn check_inputs(&self, got: usize) -> Result<(), NnError> {
        if got != self.input_width() {
            return Err(NnError::InputWidth {
                expected: self.input_width(),
                got,
            });
        }
        Ok(())
    }
}
