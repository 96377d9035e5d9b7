//! # Backward Pass - Reverse-Mode Autodiff
//!
//! The backward pass seeds the root with gradient 1 and pushes gradients
//! from consumers to operands using each operation's local derivative:
//!
//! ```text
//! operand.grad += consumer.grad * ∂consumer/∂operand
//! ```
//!
//! A node may feed several consumers (or both slots of one consumer), so
//! its gradient is only complete once *every* consumer has contributed.
//! Nodes are therefore processed in reverse topological order, computed once
//! per call: by the time a node distributes its gradient, all of its
//! consumers under the root have already been processed.
//!
//! ## Example
//!
//! ```rust
//! use tapegrad_engine::Tape;
//!
//! // d = a + b, e = d * c, f = e + d  (d is shared)
//! let mut tape = Tape::new();
//! let a = tape.leaf(1.0);
//! let b = tape.leaf(2.0);
//! let c = tape.leaf(3.0);
//! let d = tape.add(a, b);
//! let e = tape.mul(d, c);
//! let f = tape.add(e, d);
//!
//! tape.backward(f);
//!
//! assert_eq!(tape.grad(d), 4.0); // c from e, plus 1 from f
//! assert_eq!(tape.grad(c), 3.0);
//! assert_eq!(tape.grad(a), 4.0);
//! ```

use tracing::{debug, trace};

use crate::error::{EngineError, GradCheckError};
use crate::tape::{Node, Tape};

impl Tape {
    /// Compute `∂root/∂n` for every node `n` under `root`.
    ///
    /// Gradients of the subtree are zeroed first, so repeated calls do not
    /// accumulate across passes. Values are used as they currently stand;
    /// run [`Tape::forward`] first if leaves changed since the last pass.
    pub fn backward(&mut self, root: Node) {
        let root = self.check(root);
        let order = self.post_order(root);

        for &index in &order {
            self.graph[index].grad = 0.0;
        }
        self.graph[root].grad = 1.0;

        // Reverse post-order: consumers before operands
        for &index in order.iter().rev() {
            let op = self.graph[index].op;
            if op.is_leaf() {
                continue;
            }

            let upstream = self.graph[index].grad;
            let operands = self.operands_of(index);
            let operands = &operands[..op.arity()];
            let values = self.values_of(operands);
            let local = op.local_gradients(&values[..op.arity()]);

            for (slot, &operand) in operands.iter().enumerate() {
                let contribution = upstream * local[slot];
                self.graph[operand].grad += contribution;
                trace!(
                    from = index.index(),
                    to = operand.index(),
                    slot,
                    contribution,
                    "gradient propagated"
                );
            }
        }

        debug!(
            root = root.index(),
            visited = order.len(),
            "backward pass complete"
        );
    }

    /// Central-difference estimate of `∂root/∂wrt`.
    ///
    /// Uses `(f(x + h) - f(x - h)) / 2h` with forward passes over `root`,
    /// then restores `wrt` and re-evaluates. `wrt` must be a leaf.
    /// Gradients are not touched.
    pub fn numerical_gradient(
        &mut self,
        root: Node,
        wrt: Node,
        h: f64,
    ) -> Result<f64, EngineError> {
        let original = self.value(wrt);

        self.set_value(wrt, original + h)?;
        self.forward(root);
        let f_plus = self.value(root);

        self.set_value(wrt, original - h)?;
        self.forward(root);
        let f_minus = self.value(root);

        self.set_value(wrt, original)?;
        self.forward(root);

        Ok((f_plus - f_minus) / (2.0 * h))
    }

    /// Check analytical gradients against numerical ones.
    ///
    /// Runs [`Tape::backward`] on `root` and compares the gradient of each
    /// leaf in `leaves` with [`Tape::numerical_gradient`]. A leaf fails when
    /// both the absolute and the relative difference exceed `tolerance`.
    ///
    /// On success the tape holds the gradients of this backward pass.
    pub fn grad_check(
        &mut self,
        root: Node,
        leaves: &[Node],
        h: f64,
        tolerance: f64,
    ) -> Result<(), GradCheckError> {
        self.backward(root);
        let analytical: Vec<f64> = leaves.iter().map(|&leaf| self.grad(leaf)).collect();

        for (&leaf, &analytical) in leaves.iter().zip(&analytical) {
            let numerical = self.numerical_gradient(root, leaf, h)?;
            let diff = (numerical - analytical).abs();
            let scale = analytical.abs().max(numerical.abs()).max(1.0);

            if diff / scale > tolerance && diff > tolerance {
                return Err(GradCheckError::Mismatch {
                    node: leaf.index(),
                    analytical,
                    numerical,
                    diff,
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;

    #[test]
    fn test_backward_simple_add() {
        let mut tape = Tape::new();
        let x = tape.leaf(1.0);
        let y = tape.leaf(4.0);
        let z = tape.add(x, y);

        tape.backward(z);

        assert_eq!(tape.grad(z), 1.0);
        assert_eq!(tape.grad(x), 1.0);
        assert_eq!(tape.grad(y), 1.0);
    }

    #[test]
    fn test_backward_mul() {
        let mut tape = Tape::new();
        let x = tape.leaf(2.0);
        let y = tape.leaf(5.0);
        let z = tape.mul(x, y);

        tape.backward(z);

        // ∂z/∂x = y, ∂z/∂y = x
        assert_eq!(tape.grad(x), 5.0);
        assert_eq!(tape.grad(y), 2.0);
    }

    #[test]
    fn test_backward_relu_gate() {
        let mut tape = Tape::new();
        let inputs = [-2.0, 0.0, 1.0];
        let expected = [0.0, 0.0, 1.0];

        for (input, want) in inputs.into_iter().zip(expected) {
            let x = tape.leaf(input);
            let y = tape.relu(x);
            tape.backward(y);
            assert_eq!(tape.grad(x), want, "relu'({})", input);
        }
    }

    #[test]
    fn test_backward_chain_rule() {
        // a -> b = a * a -> c = tanh(b)
        let mut tape = Tape::new();
        let a = tape.leaf(0.5);
        let b = tape.mul(a, a);
        let c = tape.tanh(b);

        tape.backward(c);

        let dc_db = 1.0 - 0.25f64.tanh().powi(2);
        let db_da = 2.0 * 0.5;
        assert_abs_diff_eq!(tape.grad(b), dc_db, epsilon = 1e-15);
        assert_abs_diff_eq!(tape.grad(a), dc_db * db_da, epsilon = 1e-15);
    }

    #[test]
    fn test_backward_diamond() {
        let mut tape = Tape::new();
        let a = tape.leaf(1.0);
        let b = tape.leaf(2.0);
        let c = tape.leaf(3.0);
        let d = tape.add(a, b);
        let e = tape.mul(d, c);
        let f = tape.add(e, d);

        tape.backward(f);

        assert_eq!(tape.grad(f), 1.0);
        assert_eq!(tape.grad(e), 1.0);
        assert_eq!(tape.grad(d), 4.0);
        assert_eq!(tape.grad(c), 3.0);
        assert_eq!(tape.grad(a), 4.0);
        assert_eq!(tape.grad(b), 4.0);
    }

    #[test]
    fn test_backward_shared_operand_in_both_slots() {
        // y = x * x, dy/dx = 2x
        let mut tape = Tape::new();
        let x = tape.leaf(-3.0);
        let y = tape.mul(x, x);

        tape.backward(y);
        assert_eq!(tape.grad(x), -6.0);
    }

    #[test]
    fn test_backward_deep_sharing() {
        // Each level doubles the previous one: x_{k+1} = x_k + x_k.
        // A depth-first walk without ordering would visit the bottom 2^n
        // times; the gradient must still be exactly 2^n.
        let mut tape = Tape::new();
        let x = tape.leaf(1.0);
        let mut node = x;
        for _ in 0..40 {
            node = tape.add(node, node);
        }

        tape.backward(node);
        assert_eq!(tape.grad(x), 2f64.powi(40));
        assert_eq!(tape.topological_order(node).len(), 41);
    }

    #[test]
    fn test_backward_resets_between_calls() {
        let mut tape = Tape::new();
        let a = tape.leaf(1.5);
        let b = tape.leaf(-0.5);
        let d = tape.mul(a, b);
        let e = tape.add(d, a);
        let f = tape.sigmoid(e);

        tape.backward(f);
        let first: Vec<f64> = [a, b, d, e].iter().map(|&n| tape.grad(n)).collect();
        tape.backward(f);
        let second: Vec<f64> = [a, b, d, e].iter().map(|&n| tape.grad(n)).collect();

        assert_eq!(first, second);
    }

    #[test]
    fn test_backward_on_new_root_discards_old_contributions() {
        let mut tape = Tape::new();
        let a = tape.leaf(2.0);
        let b = tape.leaf(3.0);
        let p = tape.mul(a, b);
        let s = tape.add(a, b);

        tape.backward(p);
        assert_eq!(tape.grad(a), 3.0);

        tape.backward(s);
        assert_eq!(tape.grad(a), 1.0);
        assert_eq!(tape.grad(b), 1.0);
    }

    #[test]
    fn test_backward_uses_current_values() {
        let mut tape = Tape::new();
        let a = tape.leaf(1.0);
        let b = tape.leaf(1.0);
        let c = tape.mul(a, b);

        tape.set_value(b, 7.0).unwrap();
        tape.forward(c);
        tape.backward(c);
        assert_eq!(tape.grad(a), 7.0);
    }

    #[test]
    fn test_div_by_zero_gradient_is_non_finite() {
        let mut tape = Tape::new();
        let a = tape.leaf(1.0);
        let b = tape.leaf(0.0);
        let q = tape.div(a, b);

        tape.backward(q);
        assert!(tape.grad(a).is_infinite());
        assert!(!tape.grad(b).is_finite());
    }

    #[test]
    fn test_pow_negative_base_exponent_gradient_is_nan() {
        let mut tape = Tape::new();
        let base = tape.leaf(-2.0);
        let exp = tape.leaf(2.0);
        let p = tape.pow(base, exp);

        tape.backward(p);
        assert_eq!(tape.grad(base), -4.0);
        assert!(tape.grad(exp).is_nan());
    }

    #[test]
    fn test_numerical_gradient_restores_leaf() {
        let mut tape = Tape::new();
        let x = tape.leaf(0.7);
        let y = tape.tanh(x);
        let before = tape.value(y);

        let numerical = tape.numerical_gradient(y, x, 1e-5).unwrap();

        assert_abs_diff_eq!(numerical, 1.0 - 0.7f64.tanh().powi(2), epsilon = 1e-8);
        assert_eq!(tape.value(x), 0.7);
        assert_eq!(tape.value(y), before);
    }

    #[test]
    fn test_numerical_gradient_rejects_derived_node() {
        let mut tape = Tape::new();
        let x = tape.leaf(0.7);
        let y = tape.relu(x);
        let z = tape.mul(y, y);

        let err = tape.numerical_gradient(z, y, 1e-5).unwrap_err();
        assert!(matches!(err, EngineError::NotALeaf { .. }));
    }

    #[test]
    fn test_grad_check_every_operation() {
        let mut tape = Tape::new();
        let a = tape.leaf(1.3);
        let b = tape.leaf(-0.6);
        let c = tape.leaf(0.4);

        let add = tape.add(a, b);
        let mul = tape.mul(add, c);
        let div = tape.div(mul, b);
        let pow = tape.pow(a, c);
        let mixed = tape.add(div, pow);
        let t = tape.tanh(mixed);
        let s = tape.sigmoid(t);
        let r = tape.relu(s);
        let out = tape.mul(r, a);

        let result = tape.grad_check(out, &[a, b, c], 1e-6, 1e-6);
        assert!(result.is_ok(), "grad check failed: {:?}", result);
    }

    #[test]
    fn test_grad_check_reports_mismatch() {
        // relu is not differentiable at 0: the analytical rule says 0 while
        // the symmetric difference sees a slope of 1/2
        let mut tape = Tape::new();
        let x = tape.leaf(0.0);
        let y = tape.relu(x);

        let err = tape.grad_check(y, &[x], 1e-3, 1e-6).unwrap_err();
        match err {
            GradCheckError::Mismatch {
                node,
                analytical,
                numerical,
                ..
            } => {
                assert_eq!(node, x.index());
                assert_eq!(analytical, 0.0);
                assert_abs_diff_eq!(numerical, 0.5, epsilon = 1e-9);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn prop_binary_gradients_match_finite_differences(
            a in 0.2f64..3.0,
            b in prop_oneof![-3.0f64..-0.2, 0.2f64..3.0],
        ) {
            let mut tape = Tape::new();
            let x = tape.leaf(a);
            let y = tape.leaf(b);
            let sum = tape.add(x, y);
            let prod = tape.mul(sum, x);
            let quot = tape.div(prod, y);
            let power = tape.pow(x, y);
            let out = tape.add(quot, power);

            let result = tape.grad_check(out, &[x, y], 1e-6, 1e-5);
            prop_assert!(result.is_ok(), "{:?}", result);
        }

        #[test]
        fn prop_activation_gradients_match_finite_differences(
            v in prop_oneof![-4.0f64..-0.01, 0.01f64..4.0],
        ) {
            let mut tape = Tape::new();
            let x = tape.leaf(v);
            let t = tape.tanh(x);
            let s = tape.sigmoid(x);
            let r = tape.relu(x);
            let ts = tape.mul(t, s);
            let out = tape.add(ts, r);

            let result = tape.grad_check(out, &[x], 1e-6, 1e-5);
            prop_assert!(result.is_ok(), "{:?}", result);
        }

        #[test]
        fn prop_shared_node_gradient_is_sum_of_consumers(
            a in -5.0f64..5.0,
            b in -5.0f64..5.0,
            c in -5.0f64..5.0,
        ) {
            let mut tape = Tape::new();
            let x = tape.leaf(a);
            let y = tape.leaf(b);
            let z = tape.leaf(c);
            let d = tape.add(x, y);
            let e = tape.mul(d, z);
            let f = tape.add(e, d);

            tape.backward(f);

            prop_assert_eq!(tape.grad(d), c + 1.0);
            prop_assert_eq!(tape.grad(x), c + 1.0);
            prop_assert_eq!(tape.grad(z), a + b);
        }
    }
}
