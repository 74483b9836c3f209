//! Node internals of the utility graph.
//!
//! A [`Node`] is either a [`SourceState`], fed directly by the host, or a
//! [`DerivedState`], combining two other nodes. Nodes never own each other:
//! they live as weights inside the arena owned by [`System`](crate::System)
//! and refer to one another through [`NodeIndex`] values only.
//!
//! ## Freshness
//!
//! * Source nodes are **eager**: an update normalizes, judges and caches the
//!   new utility immediately.
//! * Derived nodes are **lazy**: an ancestor update only flips them to dirty,
//!   and the combinator runs again on the next read.
//!
//! Every cached value is clamped to `[0, 1]` before it is stored.

mod derived;
mod source;

use std::fmt::Display;

use petgraph::graph::NodeIndex;

pub(crate) use crate::engine::derived::DerivedState;
pub(crate) use crate::engine::source::SourceState;

/// Output floor substituted for an exact zero by `nonzero` source nodes.
pub const NONZERO_FLOOR: f64 = 1e-9;

/// Clamps a raw curve or combinator output into the unit interval.
#[inline]
pub(crate) fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Opaque handle to a node owned by a [`System`](crate::System).
///
/// A `NodeRef` carries identity only. It stays valid for the whole lifetime
/// of the system that issued it, since nodes are never removed.
///
/// A handle is just an arena position and does not remember its issuing
/// system. Passing it to another system either fails with
/// [`UnknownRef`](crate::UtilityError::UnknownRef), when the position is out
/// of range, or silently addresses whichever node sits at that position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeRef(pub(crate) NodeIndex);

impl NodeRef {
    /// Position of the node in the arena.
    pub fn index(&self) -> usize {
        self.0.index()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Source,
    Derived,
}

impl Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeKind::Source => write!(f, "source"),
            NodeKind::Derived => write!(f, "derived"),
        }
    }
}

pub(crate) enum Node {
    Source(SourceState),
    Derived(DerivedState),
}

impl Node {
    pub(crate) fn name(&self) -> &str {
        match self {
            Node::Source(node) => node.name(),
            Node::Derived(node) => node.name(),
        }
    }

    pub(crate) fn kind(&self) -> NodeKind {
        match self {
            Node::Source(_) => NodeKind::Source,
            Node::Derived(_) => NodeKind::Derived,
        }
    }

    /// Last cached utility, regardless of freshness.
    pub(crate) fn cached(&self) -> f64 {
        match self {
            Node::Source(node) => node.value(),
            Node::Derived(node) => node.value(),
        }
    }

    pub(crate) fn is_dirty(&self) -> bool {
        match self {
            Node::Source(_) => false,
            Node::Derived(node) => node.is_dirty(),
        }
    }

    /// Marks the node stale. Returns `true` only when the mark is new, which
    /// is the signal to keep propagating towards its dependents.
    pub(crate) fn notify_dirty(&mut self) -> bool {
        match self {
            Node::Source(_) => false,
            Node::Derived(node) => node.notify_dirty(),
        }
    }
}
