//! # tapegrad-engine - Scalar Reverse-Mode Autodiff
//!
//! This crate records scalar computations on a [`Tape`] and differentiates
//! them in reverse mode.
//!
//! ## Core Concepts
//!
//! - **Tape**: an arena (petgraph `DiGraph`) of nodes; edges run from an
//!   operand to the node that consumes it
//! - **Node**: a `Copy` handle into the tape; sharing a handle shares the
//!   subexpression
//! - **Forward**: recompute values under a root, operands first
//! - **Backward**: seed the root with 1 and accumulate `∂root/∂n` into every
//!   node in reverse topological order, so shared nodes collect every
//!   contribution before passing theirs on
//!
//! ## Modules
//!
//! - [`ops`]: The closed set of operations with value and gradient rules
//! - [`tape`]: Arena, handles, construction and accessors
//! - `forward`: Forward evaluation and topological ordering
//! - `backward`: Gradient propagation and numerical gradient checking
//! - [`error`]: Recoverable API errors
//!
//! ## Example
//!
//! ```rust
//! use tapegrad_engine::Tape;
//!
//! let mut tape = Tape::new();
//! let a = tape.labeled(1.0, "a");
//! let b = tape.labeled(2.0, "b");
//! let ab = tape.mul(a, b);
//! let out = tape.tanh(ab);
//!
//! tape.forward(out);
//! tape.backward(out);
//!
//! let local = 1.0 - 2.0f64.tanh().powi(2);
//! assert!((tape.grad(a) - 2.0 * local).abs() < 1e-12);
//! assert!((tape.grad(b) - 1.0 * local).abs() < 1e-12);
//! ```

mod backward;
pub mod error;
mod forward;
pub mod ops;
pub mod tape;

// Re-export key types
pub use error::{EngineError, GradCheckError};
pub use ops::Op;
pub use tape::{Node, Tape};
