//! Activation functions applied at the output of a neuron.

use std::fmt;

use serde::{Deserialize, Serialize};
use tapegrad_engine::{Node, Tape};

/// Slope of [`Activation::LeakyRelu`] for negative inputs.
pub const LEAKY_SLOPE: f64 = 0.01;

/// Nonlinearity wrapped around a neuron's weighted sum.
///
/// Serializes in lowercase (`"tanh"`, `"relu"`, `"leaky_relu"`, ...) for
/// configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    #[default]
    Tanh,
    Sigmoid,
    Relu,
    /// `x` for positive inputs, `0.01·x` otherwise. Recorded as
    /// `relu(x) - 0.01·relu(-x)` from existing tape operations.
    #[serde(rename = "leaky_relu")]
    LeakyRelu,
    /// Identity; the weighted sum is returned unchanged.
    Linear,
}

impl Activation {
    /// Record this activation on the tape around `input`.
    ///
    /// `Linear` records nothing and returns `input` itself.
    pub fn apply(self, tape: &mut Tape, input: Node) -> Node {
        match self {
            Activation::Tanh => tape.tanh(input),
            Activation::Sigmoid => tape.sigmoid(input),
            Activation::Relu => tape.relu(input),
            Activation::LeakyRelu => {
                let positive = tape.relu(input);
                let minus_one = tape.leaf(-1.0);
                let negated = tape.mul(input, minus_one);
                let negative = tape.relu(negated);
                let slope = tape.leaf(-LEAKY_SLOPE);
                let leak = tape.mul(negative, slope);
                tape.add(positive, leak)
            }
            Activation::Linear => input,
        }
    }
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Activation::Tanh => "tanh",
            Activation::Sigmoid => "sigmoid",
            Activation::Relu => "relu",
            Activation::LeakyRelu => "leaky_relu",
            Activation::Linear => "linear",
        };
        f.write_str(name)
    }
}
