//! A fully connected layer of neurons sharing input width and activation.

use rand::Rng;
use tapegrad_engine::{Node, Tape};

use crate::activation::Activation;
use crate::error::NnError;
use crate::neuron::Neuron;

#[derive(Debug, Clone)]
pub struct Layer {
    neurons: Vec<Neuron>,
    inputs: usize,
}

impl Layer {
    /// Create `outputs` randomly initialized neurons over `inputs` inputs.
    pub fn new<R: Rng>(
        tape: &mut Tape,
        inputs: usize,
        outputs: usize,
        activation: Activation,
        rng: &mut R,
    ) -> Self {
        let neurons = (0..outputs)
            .map(|_| Neuron::new(tape, inputs, activation, rng))
            .collect();
        Self { neurons, inputs }
    }

    /// Assemble a layer from existing neurons.
    ///
    /// Fails if `neurons` is empty or the neurons disagree on input width or
    /// activation.
    pub fn from_neurons(neurons: Vec<Neuron>) -> Result<Self, NnError> {
        let first = neurons.first().ok_or(NnError::NoNeurons)?;
        let (inputs, activation) = (first.input_width(), first.activation());

        for neuron in &neurons[1..] {
            if neuron.input_width() != inputs {
                return Err(NnError::NeuronWidth {
                    expected: inputs,
                    got: neuron.input_width(),
                });
            }
            if neuron.activation() != activation {
                return Err(NnError::ActivationMismatch {
                    expected: activation,
                    got: neuron.activation(),
                });
            }
        }

        Ok(Self { neurons, inputs })
    }

    /// Record every neuron over the same input nodes, in order.
    pub fn forward(&self, tape: &mut Tape, inputs: &[Node]) -> Result<Vec<Node>, NnError> {
        if inputs.len() != self.inputs {
            return Err(NnError::InputWidth {
                expected: self.inputs,
                got: inputs.len(),
            });
        }
        self.neurons
            .iter()
            .map(|neuron| neuron.forward(tape, inputs))
            .collect()
    }

    /// Record the layer over constant inputs.
    pub fn run(&self, tape: &mut Tape, inputs: &[f64]) -> Result<Vec<Node>, NnError> {
        let inputs: Vec<Node> = inputs.iter().map(|&x| tape.leaf(x)).collect();
        self.forward(tape, &inputs)
    }

    pub fn input_width(&self) -> usize {
        self.inputs
    }

    pub fn output_width(&self) -> usize {
        self.neurons.len()
    }

    pub fn neurons(&self) -> &[Neuron] {
        &self.neurons
    }

    /// All parameters, neuron by neuron.
    pub fn params(&self) -> Vec<Node> {
        self.neurons.iter().flat_map(Neuron::params).collect()
    }
}
