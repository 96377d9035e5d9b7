//! # Forward Evaluation
//!
//! Forward evaluation recomputes the value of every node under a root from
//! the current leaf values.
//!
//! ## Key Concepts
//!
//! - **Topological order**: operands are visited before the nodes that
//!   consume them (a depth-first post-order from the root)
//! - **Leaves are inputs**: their value is whatever the caller last assigned
//! - **Shared nodes are visited once**: recomputation is a pure function of
//!   operand values, so one visit per pass gives the same result as many
//!
//! ## Example
//!
//! ```rust
//! use tapegrad_engine::Tape;
//!
//! // y = relu(a + b)
//! let mut tape = Tape::new();
//! let a = tape.leaf(-1.0);
//! let b = tape.leaf(2.0);
//! let sum = tape.add(a, b);
//! let y = tape.relu(sum);
//! assert_eq!(tape.value(y), 1.0);
//!
//! // Change an input and re-evaluate
//! tape.set_value(a, -5.0).unwrap();
//! tape.forward(y);
//! assert_eq!(tape.value(y), 0.0);
//! ```

use petgraph::graph::NodeIndex;
use petgraph::visit::{DfsPostOrder, Reversed};
use tracing::debug;

use crate::tape::{Node, Tape};

impl Tape {
    /// Recompute every node reachable from `root`, operands first.
    ///
    /// Leaves are left untouched. Afterwards each derived node under `root`
    /// is consistent with its operation and its operands' values.
    pub fn forward(&mut self, root: Node) {
        let root = self.check(root);
        let order = self.post_order(root);

        for &index in &order {
            let op = self.graph[index].op;
            if op.is_leaf() {
                continue;
            }
            let operands = self.operands_of(index);
            let values = self.values_of(&operands[..op.arity()]);
            self.graph[index].value = op.forward(&values[..op.arity()]);
        }

        debug!(
            root = root.index(),
            visited = order.len(),
            "forward pass complete"
        );
    }

    /// Nodes reachable from `root`, each listed after all of its operands.
    ///
    /// `root` is always last. Reversing the sequence gives the order in
    /// which the backward pass distributes gradients.
    pub fn topological_order(&self, root: Node) -> Vec<Node> {
        let root = self.check(root);
        self.post_order(root)
            .into_iter()
            .map(|index| self.handle(index))
            .collect()
    }

    /// Depth-first post-order over operand edges starting at `root`.
    ///
    /// Edges point operand → consumer, so the walk follows them reversed.
    /// `DfsPostOrder` keeps an explicit stack and a visited set: every node
    /// appears exactly once, after everything it depends on.
    pub(crate) fn post_order(&self, root: NodeIndex) -> Vec<NodeIndex> {
        let operands_first = Reversed(&self.graph);
        let mut dfs = DfsPostOrder::new(operands_first, root);
        let mut order = Vec::new();
        while let Some(index) = dfs.next(operands_first) {
            order.push(index);
        }
        order
    }
}
