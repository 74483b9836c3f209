use petgraph::graph::NodeIndex;

use crate::combinator::Combinator;
use crate::engine::clamp_unit;

/// Utility combined lazily from two other nodes.
///
/// The node cycles between two states for its whole lifetime: clean, where
/// the cached value is valid, and dirty, where it must be recomputed on the
/// next read.
pub(crate) struct DerivedState {
    name: Box<str>,
    combinator: Combinator,
    operand_a: NodeIndex,
    operand_b: NodeIndex,
    dirty: bool,
    value: f64,
}

impl DerivedState {
    /// Creates a clean node whose cache holds the combination of the current
    /// operand utilities.
    pub(crate) fn new(
        name: Box<str>,
        combinator: Combinator,
        (operand_a, operand_b): (NodeIndex, NodeIndex),
        (x, y): (f64, f64),
    ) -> Self {
        let mut node = Self {
            name,
            combinator,
            operand_a,
            operand_b,
            dirty: true,
            value: 0.0,
        };
        node.combine(x, y);
        node
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn value(&self) -> f64 {
        self.value
    }

    pub(crate) fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub(crate) fn operands(&self) -> (NodeIndex, NodeIndex) {
        (self.operand_a, self.operand_b)
    }

    /// Returns `false` when the node was already dirty, so propagation stops.
    pub(crate) fn notify_dirty(&mut self) -> bool {
        if self.dirty {
            return false;
        }
        self.dirty = true;
        true
    }

    /// Runs the combinator over fresh operand utilities and marks the node
    /// clean again.
    pub(crate) fn combine(&mut self, x: f64, y: f64) -> f64 {
        self.value = clamp_unit(self.combinator.apply(x, y));
        self.dirty = false;
        self.value
    }
}
