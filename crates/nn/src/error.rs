//! Error types for network construction and evaluation.

use thiserror::Error;

use crate::activation::Activation;

/// Errors raised by neurons, layers and networks.
///
/// Width problems are caller mistakes the network can detect before it
/// touches the tape, so they are reported instead of panicking.
#[derive(Debug, Error)]
pub enum NnError {
    /// Input slice length differs from the layer's input width.
    #[error("expected {expected} inputs, got {got}")]
    InputWidth { expected: usize, got: usize },

    /// Target slice length differs from the network's output width.
    #[error("expected {expected} targets, got {got}")]
    TargetWidth { expected: usize, got: usize },

    /// Adjacent layers don't agree on width.
    #[error("layer {index} takes {got} inputs but the previous layer produces {expected}")]
    LayerMismatch {
        index: usize,
        expected: usize,
        got: usize,
    },

    /// Neurons of one layer disagree on input width.
    #[error("neuron takes {got} inputs but the layer's first neuron takes {expected}")]
    NeuronWidth { expected: usize, got: usize },

    /// Neurons of one layer disagree on activation.
    #[error("neuron uses {got} but the layer's first neuron uses {expected}")]
    ActivationMismatch {
        expected: Activation,
        got: Activation,
    },

    /// A layer assembled from an empty list of neurons.
    #[error("a layer needs at least one neuron")]
    NoNeurons,

    /// A network needs at least one layer.
    #[error("network has no layers")]
    EmptyNetwork,

    /// Every layer needs at least one neuron.
    #[error("layer {index} has no neurons")]
    EmptyLayer { index: usize },

    /// A network needs at least one input.
    #[error("network must take at least one input")]
    NoInputs,

    /// Configuration could not be parsed or printed.
    #[error("invalid network configuration: {0}")]
    Config(#[from] serde_json::Error),
}
