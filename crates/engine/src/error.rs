//! # Error Types
//!
//! The engine has almost no failure modes: numeric domain problems surface
//! as `inf`/`NaN` values, and handles from another tape are a contract
//! violation that panics. What remains are misuses a caller can recover
//! from, such as assigning a value to a derived node.

use thiserror::Error;

/// Recoverable misuse of the tape API.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    /// Only leaves may have their value assigned directly.
    #[error("node #{node} is derived by `{op}` and cannot be assigned a value")]
    NotALeaf { node: usize, op: String },
}

/// Failure reported by [`Tape::grad_check`](crate::Tape::grad_check).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GradCheckError {
    /// Analytical and numerical gradients disagree beyond tolerance.
    #[error(
        "gradient mismatch at node #{node}: analytical={analytical}, numerical={numerical}, diff={diff}"
    )]
    Mismatch {
        node: usize,
        analytical: f64,
        numerical: f64,
        diff: f64,
    },

    /// A node passed as a perturbation target could not be perturbed.
    #[error(transparent)]
    Engine(#[from] EngineError),
}
