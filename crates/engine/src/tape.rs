//! # The Tape
//!
//! A `Tape` is an arena of scalar nodes stored in a petgraph `DiGraph`.
//! Vertices hold each node's value, gradient, operation and label; edges run
//! from an operand to the node that consumes it and remember which operand
//! slot they fill.
//!
//! Client code never owns a node directly. Constructors return a [`Node`]
//! handle, which is `Copy` and can be used as an operand any number of times,
//! so shared subexpressions ("diamonds") are just handles used twice.
//!
//! ## Example
//!
//! ```rust
//! use tapegrad_engine::Tape;
//!
//! let mut tape = Tape::new();
//! let a = tape.labeled(2.0, "a");
//! let b = tape.labeled(-3.0, "b");
//! let c = tape.mul(a, b);
//! let d = tape.add(c, a); // `a` is used twice
//!
//! assert_eq!(tape.value(d), -4.0);
//! assert_eq!(tape.operands(d), vec![c, a]);
//! assert_eq!(tape.describe(a), "a()");
//! ```

use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

use crate::error::EngineError;
use crate::ops::Op;

static NEXT_TAPE_ID: AtomicU64 = AtomicU64::new(0);

/// Handle to a node on a [`Tape`].
///
/// A handle is only meaningful on the tape that created it; using it with
/// any other tape panics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Node {
    tape: u64,
    index: NodeIndex,
}

impl Node {
    /// Position of this node on its tape, in creation order.
    pub fn index(&self) -> usize {
        self.index.index()
    }
}

/// Per-node state stored as a vertex weight.
#[derive(Debug, Clone)]
pub(crate) struct NodeData {
    pub(crate) value: f64,
    pub(crate) grad: f64,
    pub(crate) op: Op,
    pub(crate) label: Option<String>,
}

/// Edge weight: which operand slot of the consumer this edge fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Operand {
    pub(crate) slot: usize,
}

/// Arena-backed computation graph of scalar nodes.
///
/// Cloning copies every node into a new, independent tape with its own id.
/// Handles from the original are rejected by the copy and vice versa.
#[derive(Debug)]
pub struct Tape {
    id: u64,
    pub(crate) graph: DiGraph<NodeData, Operand>,
}

impl Tape {
    /// Create an empty tape.
    pub fn new() -> Self {
        Self {
            id: NEXT_TAPE_ID.fetch_add(1, Ordering::Relaxed),
            graph: DiGraph::new(),
        }
    }

    /// Number of nodes recorded so far.
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    /// True if no node has been recorded.
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    // ------------------------------------------------------------------
    // Leaves
    // ------------------------------------------------------------------

    /// Record a leaf holding `value`.
    pub fn leaf(&mut self, value: f64) -> Node {
        self.push(Op::Leaf, &[], value, None)
    }

    /// Record a leaf holding `value` with a diagnostic label.
    pub fn labeled(&mut self, value: f64, label: impl Into<String>) -> Node {
        self.push(Op::Leaf, &[], value, Some(label.into()))
    }

    // ------------------------------------------------------------------
    // Operations
    // ------------------------------------------------------------------

    /// `a + b`
    pub fn add(&mut self, a: Node, b: Node) -> Node {
        self.record(Op::Add, &[a, b])
    }

    /// `a * b`
    pub fn mul(&mut self, a: Node, b: Node) -> Node {
        self.record(Op::Mul, &[a, b])
    }

    /// `a / b`
    pub fn div(&mut self, a: Node, b: Node) -> Node {
        self.record(Op::Div, &[a, b])
    }

    /// `a ^ b`
    pub fn pow(&mut self, a: Node, b: Node) -> Node {
        self.record(Op::Pow, &[a, b])
    }

    /// `tanh(a)`
    pub fn tanh(&mut self, a: Node) -> Node {
        self.record(Op::Tanh, &[a])
    }

    /// `sigmoid(a)`
    pub fn sigmoid(&mut self, a: Node) -> Node {
        self.record(Op::Sigmoid, &[a])
    }

    /// `max(0, a)`
    pub fn relu(&mut self, a: Node) -> Node {
        self.record(Op::Relu, &[a])
    }

    /// Left fold of `nodes` with [`Tape::add`]. `None` if `nodes` is empty.
    pub fn sum(&mut self, nodes: impl IntoIterator<Item = Node>) -> Option<Node> {
        let mut nodes = nodes.into_iter();
        let first = nodes.next()?;
        Some(nodes.fold(first, |acc, node| self.add(acc, node)))
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Current value of `node`.
    pub fn value(&self, node: Node) -> f64 {
        self.graph[self.check(node)].value
    }

    /// Gradient accumulated by the most recent backward pass.
    pub fn grad(&self, node: Node) -> f64 {
        self.graph[self.check(node)].grad
    }

    /// Operation that produced `node`.
    pub fn op(&self, node: Node) -> Op {
        self.graph[self.check(node)].op
    }

    /// Diagnostic label, if any.
    pub fn label(&self, node: Node) -> Option<&str> {
        self.graph[self.check(node)].label.as_deref()
    }

    /// Attach or replace the diagnostic label of any node.
    pub fn set_label(&mut self, node: Node, label: impl Into<String>) {
        let index = self.check(node);
        self.graph[index].label = Some(label.into());
    }

    /// True if the node's current value is neither infinite nor NaN.
    pub fn is_finite(&self, node: Node) -> bool {
        self.value(node).is_finite()
    }

    /// Assign the value of a leaf.
    ///
    /// Derived nodes get their value from forward evaluation and are
    /// rejected with [`EngineError::NotALeaf`].
    pub fn set_value(&mut self, node: Node, value: f64) -> Result<(), EngineError> {
        let index = self.check(node);
        let data = &mut self.graph[index];
        if !data.op.is_leaf() {
            return Err(EngineError::NotALeaf {
                node: index.index(),
                op: data.op.to_string(),
            });
        }
        data.value = value;
        Ok(())
    }

    /// Operands of `node` in call order.
    pub fn operands(&self, node: Node) -> Vec<Node> {
        let index = self.check(node);
        let arity = self.graph[index].op.arity();
        self.operands_of(index)[..arity]
            .iter()
            .map(|&index| Node {
                tape: self.id,
                index,
            })
            .collect()
    }

    /// `label(op)`, e.g. `e(*)` or `a()` for a labeled leaf.
    pub fn describe(&self, node: Node) -> String {
        let data = &self.graph[self.check(node)];
        format!("{}({})", data.label.as_deref().unwrap_or(""), data.op)
    }

    /// Render the subtree under `root`, operands first, one node per line.
    ///
    /// For debugging only; the format is not stable.
    pub fn render(&self, root: Node) -> String {
        let mut out = String::new();
        for index in self.post_order(self.check(root)) {
            let data = &self.graph[index];
            let arity = data.op.arity();
            let operands: Vec<String> = self.operands_of(index)[..arity]
                .iter()
                .map(|operand| format!("#{}", operand.index()))
                .collect();
            writeln!(
                out,
                "#{:<4} {:<12} value={:<12.6} grad={:<12.6} [{}]",
                index.index(),
                format!("{}({})", data.label.as_deref().unwrap_or(""), data.op),
                data.value,
                data.grad,
                operands.join(", ")
            )
            .expect("writing to a String cannot fail");
        }
        out
    }

    /// Reset every gradient on the tape to zero.
    pub fn zero_grad(&mut self) {
        for data in self.graph.node_weights_mut() {
            data.grad = 0.0;
        }
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Validate that `node` was created by this tape.
    pub(crate) fn check(&self, node: Node) -> NodeIndex {
        assert_eq!(node.tape, self.id, "node belongs to a different tape");
        node.index
    }

    pub(crate) fn handle(&self, index: NodeIndex) -> Node {
        Node {
            tape: self.id,
            index,
        }
    }

    /// Operand indices of `index` by slot. Slots past the arity hold
    /// `NodeIndex::end()`.
    pub(crate) fn operands_of(&self, index: NodeIndex) -> [NodeIndex; 2] {
        let mut operands = [NodeIndex::end(); 2];
        for edge in self.graph.edges_directed(index, Direction::Incoming) {
            operands[edge.weight().slot] = edge.source();
        }
        operands
    }

    /// Current values of the given operands, padded with zeros.
    pub(crate) fn values_of(&self, operands: &[NodeIndex]) -> [f64; 2] {
        let mut values = [0.0; 2];
        for (slot, &operand) in operands.iter().enumerate() {
            values[slot] = self.graph[operand].value;
        }
        values
    }

    fn record(&mut self, op: Op, operands: &[Node]) -> Node {
        let indices: Vec<NodeIndex> = operands.iter().map(|&n| self.check(n)).collect();
        let values = self.values_of(&indices);
        let value = op.forward(&values[..op.arity()]);
        self.push(op, &indices, value, None)
    }

    fn push(&mut self, op: Op, operands: &[NodeIndex], value: f64, label: Option<String>) -> Node {
        debug_assert_eq!(operands.len(), op.arity());
        let index = self.graph.add_node(NodeData {
            value,
            grad: 0.0,
            op,
            label,
        });
        for (slot, &operand) in operands.iter().enumerate() {
            self.graph.add_edge(operand, index, Operand { slot });
        }
        self.handle(index)
    }
}

impl Clone for Tape {
    fn clone(&self) -> Self {
        Self {
            id: NEXT_TAPE_ID.fetch_add(1, Ordering::Relaxed),
            graph: self.graph.clone(),
        }
    }
}

impl Default for Tape {
    fn default() -> Self {
        Self::new()
    }
}
