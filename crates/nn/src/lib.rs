//! # tapegrad-nn - Multilayer Perceptrons on a Scalar Tape
//!
//! Neurons, layers and feed-forward networks whose parameters are leaves on a
//! [`tapegrad_engine::Tape`]. Every call to `run` records a new expression
//! over those leaves; [`Mlp::loss`] records a squared-error scalar whose
//! backward pass fills in a gradient for every weight and bias.
//!
//! Updating parameters is left to the caller: [`Mlp::params`] and
//! [`Mlp::gradients`] hand out the leaves and their gradients in the same
//! order.
//!
//! ## Modules
//!
//! - [`activation`]: Nonlinearities applied at each neuron's output
//! - [`neuron`]: Weighted sum plus bias, wrapped in an activation
//! - [`layer`]: Neurons sharing an input vector
//! - [`mlp`]: Layer stacks, loss and parameter access
//! - [`config`]: Serializable network shapes
//! - [`error`]: Width and configuration errors
//!
//! ## Example
//!
//! ```rust
//! use tapegrad_engine::Tape;
//! use tapegrad_nn::{Activation, Mlp, MlpConfig};
//!
//! let config = MlpConfig::new(2, 7)
//!     .with_layer(3, Activation::Tanh)
//!     .with_layer(1, Activation::Linear);
//!
//! let mut tape = Tape::new();
//! let mlp = Mlp::from_config(&mut tape, &config).unwrap();
//!
//! let loss = mlp.loss(&mut tape, &[0.5, -1.0], &[1.0]).unwrap();
//! tape.backward(loss);
//!
//! let grads = mlp.gradients(&tape);
//! assert_eq!(grads.len(), mlp.parameter_count());
//! assert!(grads.iter().all(|g| g.is_finite()));
//! ```

pub mod activation;
pub mod config;
pub mod error;
pub mod layer;
pub mod mlp;
pub mod neuron;

pub use activation::Activation;
pub use config::{LayerConfig, MlpConfig};
pub use error::NnError;
pub use layer::Layer;
pub use mlp::Mlp;
pub use neuron::Neuron;
