//! A single neuron: `activation(Σ wᵢ·xᵢ + b)`.

use rand::Rng;
use tapegrad_engine::{Node, Tape};

use crate::activation::Activation;
use crate::error::NnError;

/// Weights and bias are leaves on the tape the neuron was created with.
#[derive(Debug, Clone)]
pub struct Neuron {
    weights: Vec<Node>,
    bias: Node,
    activation: Activation,
}

impl Neuron {
    /// Create a neuron with `inputs` weights drawn uniformly from `[-1, 1)`
    /// and a zero bias.
    pub fn new<R: Rng>(tape: &mut Tape, inputs: usize, activation: Activation, rng: &mut R) -> Self {
        let weights = (0..inputs)
            .map(|_| tape.leaf(rng.random_range(-1.0..1.0)))
            .collect();
        let bias = tape.leaf(0.0);
        Self {
            weights,
            bias,
            activation,
        }
    }

    /// Create a neuron with explicit parameter values.
    pub fn from_parameters(
        tape: &mut Tape,
        weights: &[f64],
        bias: f64,
        activation: Activation,
    ) -> Self {
        let weights = weights.iter().map(|&w| tape.leaf(w)).collect();
        let bias = tape.leaf(bias);
        Self {
            weights,
            bias,
            activation,
        }
    }

    /// Record `activation(Σ wᵢ·xᵢ + b)` over input nodes.
    pub fn forward(&self, tape: &mut Tape, inputs: &[Node]) -> Result<Node, NnError> {
        if inputs.len() != self.weights.len() {
            return Err(NnError::InputWidth {
                expected: self.weights.len(),
                got: inputs.len(),
            });
        }

        let products: Vec<Node> = self
            .weights
            .iter()
            .zip(inputs)
            .map(|(&w, &x)| tape.mul(w, x))
            .collect();
        let pre_activation = match tape.sum(products) {
            Some(weighted) => tape.add(weighted, self.bias),
            None => self.bias,
        };

        Ok(self.activation.apply(tape, pre_activation))
    }

    /// Record the neuron over constant inputs, each becoming a fresh leaf.
    pub fn run(&self, tape: &mut Tape, inputs: &[f64]) -> Result<Node, NnError> {
        let inputs: Vec<Node> = inputs.iter().map(|&x| tape.leaf(x)).collect();
        self.forward(tape, &inputs)
    }

    /// Number of inputs this neuron accepts.
    pub fn input_width(&self) -> usize {
        self.weights.len()
    }

    pub fn weights(&self) -> &[Node] {
        &self.weights
    }

    pub fn bias(&self) -> Node {
        self.bias
    }

    pub fn activation(&self) -> Activation {
        self.activation
    }

    /// Weights followed by the bias.
    pub fn params(&self) -> Vec<Node> {
        let mut params = self.weights.clone();
        params.push(self.bias);
        params
    }
}
