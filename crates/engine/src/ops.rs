//! # Scalar Operations
//!
//! This module defines `Op`, the closed set of operations a tape node can
//! record. Each operation knows how to:
//!
//! - Compute its value from operand values (forward rule)
//! - Compute the local partial derivative for each operand (backward rule)
//!
//! ## Operations
//!
//! | Op | Arity | Forward | ∂out/∂a | ∂out/∂b |
//! |----|-------|---------|---------|---------|
//! | Add | 2 | a + b | 1 | 1 |
//! | Mul | 2 | a · b | b | a |
//! | Div | 2 | a / b | 1/b | −a/b² |
//! | Pow | 2 | aᵇ | b·aᵇ⁻¹ | aᵇ·ln a |
//! | Tanh | 1 | tanh a | 1 − tanh² a | |
//! | Sigmoid | 1 | 1/(1+e⁻ᵃ) | s(1 − s) | |
//! | Relu | 1 | max(0, a) | a > 0 ? 1 : 0 | |
//!
//! Invalid operands (division by zero, `ln` of a non-positive base) are not
//! errors: they yield `inf`/`NaN` exactly as IEEE-754 arithmetic does.

use std::fmt;

/// Operation recorded on a tape node.
///
/// `Leaf` marks a node with no operands whose value is supplied by the
/// caller. Every other variant derives its value from one or two operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    /// Caller-supplied value, no operands
    Leaf,

    /// a + b
    Add,

    /// a * b
    Mul,

    /// a / b
    Div,

    /// a raised to the power b
    Pow,

    /// Hyperbolic tangent
    Tanh,

    /// Logistic sigmoid: 1 / (1 + e^-a)
    Sigmoid,

    /// Rectified linear unit: max(0, a)
    Relu,
}

impl Op {
    /// Every operation, leaves first.
    pub const ALL: [Op; 8] = [
        Op::Leaf,
        Op::Add,
        Op::Mul,
        Op::Div,
        Op::Pow,
        Op::Tanh,
        Op::Sigmoid,
        Op::Relu,
    ];

    /// Number of operands this operation consumes.
    pub fn arity(self) -> usize {
        match self {
            Op::Leaf => 0,
            Op::Add | Op::Mul | Op::Div | Op::Pow => 2,
            Op::Tanh | Op::Sigmoid | Op::Relu => 1,
        }
    }

    /// True for `Leaf`.
    pub fn is_leaf(self) -> bool {
        self == Op::Leaf
    }

    /// Compute this operation's value from its operand values.
    ///
    /// # Panics
    ///
    /// Panics if `operands.len()` differs from [`Op::arity`], or if called
    /// on `Leaf` (leaves have no value rule).
    pub fn forward(self, operands: &[f64]) -> f64 {
        assert_eq!(
            operands.len(),
            self.arity(),
            "{:?} requires {} operands, got {}",
            self,
            self.arity(),
            operands.len()
        );

        match self {
            Op::Leaf => panic!("leaf nodes have no value rule"),
            Op::Add => operands[0] + operands[1],
            Op::Mul => operands[0] * operands[1],
            Op::Div => operands[0] / operands[1],
            Op::Pow => operands[0].powf(operands[1]),
            Op::Tanh => tanh(operands[0]),
            Op::Sigmoid => sigmoid(operands[0]),
            Op::Relu => relu(operands[0]),
        }
    }

    /// Local partial derivatives `∂out/∂operand[i]`, evaluated at `operands`.
    ///
    /// The result always has two slots; only the first [`Op::arity`] entries
    /// are meaningful; the rest are zero.
    ///
    /// # Panics
    ///
    /// Same contract as [`Op::forward`].
    pub fn local_gradients(self, operands: &[f64]) -> [f64; 2] {
        assert_eq!(
            operands.len(),
            self.arity(),
            "{:?} requires {} operands, got {}",
            self,
            self.arity(),
            operands.len()
        );

        match self {
            Op::Leaf => panic!("leaf nodes have no gradient rule"),

            Op::Add => [1.0, 1.0],

            Op::Mul => {
                let (a, b) = (operands[0], operands[1]);
                [b, a]
            }

            Op::Div => {
                let (a, b) = (operands[0], operands[1]);
                [1.0 / b, -a / (b * b)]
            }

            Op::Pow => {
                // ∂/∂b is non-finite for a <= 0
                let (a, b) = (operands[0], operands[1]);
                [b * a.powf(b - 1.0), a.powf(b) * a.ln()]
            }

            Op::Tanh => {
                let t = tanh(operands[0]);
                [1.0 - t * t, 0.0]
            }

            Op::Sigmoid => {
                let s = sigmoid(operands[0]);
                [s * (1.0 - s), 0.0]
            }

            Op::Relu => [if operands[0] > 0.0 { 1.0 } else { 0.0 }, 0.0],
        }
    }

    /// Short tag used by diagnostics (`+`, `*`, `tanh`, ...). Empty for leaves.
    pub fn symbol(self) -> &'static str {
        match self {
            Op::Leaf => "",
            Op::Add => "+",
            Op::Mul => "*",
            Op::Div => "/",
            Op::Pow => "^",
            Op::Tanh => "tanh",
            Op::Sigmoid => "sigmoid",
            Op::Relu => "relu",
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Hyperbolic tangent.
pub fn tanh(x: f64) -> f64 {
    x.tanh()
}

/// Logistic sigmoid, evaluated without overflowing `exp` for large |x|.
pub fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// Rectified linear unit.
pub fn relu(x: f64) -> f64 {
    if x > 0.0 {
        x
    } else {
        0.0
    }
}
