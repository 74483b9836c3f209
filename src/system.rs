use std::collections::HashMap;
use std::fmt::Display;

use petgraph::Direction;
use petgraph::Graph;
use petgraph::graph::NodeIndex;

use crate::combinator::Combinator;
use crate::curve::Curve;
use crate::engine::{DerivedState, Node, NodeKind, NodeRef, SourceState};
use crate::error::UtilityError;

/// Utility theory based decision making system.
///
/// `System` owns every utility node in an arena and is the only entry point
/// for registering, updating and evaluating them. Nodes are addressed by
/// case-insensitive names; a name, once bound, is never rebound or removed.
///
/// # Example
///
/// ```rust
/// use utility_graph::{Combinator, Curve, System};
///
/// let mut system = System::new();
/// system.register_source("hp", Curve::linear(1.0, 0.0), false)?;
/// system.register_source("ammo", Curve::linear(1.0, 0.0), false)?;
/// system.register_derived("aggression", Combinator::multiplicative(1.0, 0.0), "hp", "ammo")?;
///
/// system.set_range("hp", 0.0, 100.0)?;
/// system.set_range("ammo", 0.0, 50.0)?;
/// system.update("hp", 50.0)?;
/// system.update("ammo", 25.0)?;
///
/// assert_eq!(system.evaluate("aggression")?, 0.25);
/// # Ok::<(), utility_graph::UtilityError>(())
/// ```
///
/// # Concurrency
///
/// Reads mutate caches, so every operation takes `&mut self`. Hosts sharing
/// a system between threads must guard the whole system with one lock.
#[derive(Default)]
pub struct System {
    /// Arena of nodes; an edge `a -> b` means `b` reads `a`.
    pub(crate) graph: Graph<Node, ()>,
    /// Lowercased name to node lookup.
    names: HashMap<Box<str>, NodeIndex>,
}

fn key(name: &str) -> Box<str> {
    name.to_lowercase().into_boxed_str()
}

impl System {
    /// Creates a new, empty system.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered utilities.
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains_key(&key(name))
    }

    /// Registered names, as spelled at registration, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.graph.node_weights().map(Node::name)
    }

    /// Looks up the handle of a registered utility.
    pub fn node(&self, name: &str) -> Option<NodeRef> {
        self.names.get(&key(name)).copied().map(NodeRef)
    }

    /// Name under which a handle was registered.
    pub fn name_of(&self, node: NodeRef) -> Option<&str> {
        self.graph.node_weight(node.0).map(Node::name)
    }

    pub fn kind(&self, name: &str) -> Result<NodeKind, UtilityError> {
        let index = self.lookup(name)?;
        Ok(self.graph[index].kind())
    }

    /// Whether a derived utility must be recomputed on its next read. Source
    /// utilities are never dirty.
    pub fn is_dirty(&self, name: &str) -> Result<bool, UtilityError> {
        let index = self.lookup(name)?;
        Ok(self.graph[index].is_dirty())
    }

    /// Current normalization window of a source utility.
    pub fn range(&self, name: &str) -> Result<(f64, f64), UtilityError> {
        let index = self.lookup(name)?;
        match &self.graph[index] {
            Node::Source(node) => Ok(node.range()),
            other => Err(wrong_kind(name, NodeKind::Source, other.kind())),
        }
    }

    fn lookup(&self, name: &str) -> Result<NodeIndex, UtilityError> {
        self.names
            .get(&key(name))
            .copied()
            .ok_or_else(|| UtilityError::UnknownName(name.into()))
    }

    pub(crate) fn ensure_vacant(&self, name: &str) -> Result<(), UtilityError> {
        if self.contains(name) {
            Err(UtilityError::DuplicateName(name.into()))
        } else {
            Ok(())
        }
    }

    fn source_mut(&mut self, name: &str) -> Result<(NodeIndex, &mut SourceState), UtilityError> {
        let index = self.lookup(name)?;
        match &mut self.graph[index] {
            Node::Source(node) => Ok((index, node)),
            other => Err(wrong_kind(name, NodeKind::Source, other.kind())),
        }
    }

    /// Registers a utility fed by external measurements.
    ///
    /// The source starts with the identity window `[0, 1]`. When `nonzero`
    /// is set, an output of exactly zero is replaced by
    /// [`NONZERO_FLOOR`](crate::NONZERO_FLOOR).
    pub fn register_source(
        &mut self,
        name: &str,
        curve: impl Into<Curve>,
        nonzero: bool,
    ) -> Result<NodeRef, UtilityError> {
        self.ensure_vacant(name)?;

        let node = SourceState::new(name.into(), curve.into(), nonzero);
        let index = self.graph.add_node(Node::Source(node));
        self.names.insert(key(name), index);

        tracing::debug!(name, nonzero, "registered source utility");
        Ok(NodeRef(index))
    }

    /// Registers a utility combining two already registered ones.
    ///
    /// Fails without touching the system if the name is taken or either
    /// operand is unknown.
    pub fn register_derived(
        &mut self,
        name: &str,
        combinator: impl Into<Combinator>,
        operand_a: &str,
        operand_b: &str,
    ) -> Result<NodeRef, UtilityError> {
        self.ensure_vacant(name)?;
        let unknown = |operand: &str| UtilityError::UnknownOperand {
            name: name.into(),
            operand: operand.into(),
        };
        let a = self.lookup(operand_a).map_err(|_| unknown(operand_a))?;
        let b = self.lookup(operand_b).map_err(|_| unknown(operand_b))?;

        let inputs = (self.evaluate_index(a), self.evaluate_index(b));
        let node = DerivedState::new(name.into(), combinator.into(), (a, b), inputs);
        let index = self.graph.add_node(Node::Derived(node));
        self.graph.update_edge(a, index, ());
        self.graph.update_edge(b, index, ());
        self.names.insert(key(name), index);

        tracing::debug!(name, operand_a, operand_b, "registered derived utility");
        Ok(NodeRef(index))
    }

    /// Sets the normalization window of a source utility. The new window only
    /// applies from the next update on.
    pub fn set_range(&mut self, name: &str, lo: f64, hi: f64) -> Result<(), UtilityError> {
        let (_, node) = self.source_mut(name)?;
        node.set_range(lo, hi);
        Ok(())
    }

    /// Feeds a raw measurement into a source utility and invalidates every
    /// derived utility reading it, directly or transitively.
    ///
    /// Returns the number of derived utilities that turned dirty because of
    /// this update. Utilities that were already dirty are neither counted nor
    /// traversed again.
    pub fn update(&mut self, name: &str, raw: f64) -> Result<usize, UtilityError> {
        let (index, node) = self.source_mut(name)?;
        let value = node.update(raw);
        let invalidated = self.propagate(index);

        tracing::trace!(name, raw, value, invalidated, "updated source utility");
        Ok(invalidated)
    }

    /// Marks all dependents of `origin` dirty, stopping at nodes that already
    /// were. Every node is traversed at most once per call.
    fn propagate(&mut self, origin: NodeIndex) -> usize {
        let mut invalidated = 0;
        let mut stack: Vec<NodeIndex> = self
            .graph
            .neighbors_directed(origin, Direction::Outgoing)
            .collect();

        while let Some(index) = stack.pop() {
            if !self.graph[index].notify_dirty() {
                continue;
            }
            invalidated += 1;
            stack.extend(self.graph.neighbors_directed(index, Direction::Outgoing));
        }

        invalidated
    }

    /// Returns the current utility of any registered node, recomputing stale
    /// derived utilities on the way.
    pub fn evaluate(&mut self, name: &str) -> Result<f64, UtilityError> {
        let index = self.lookup(name)?;
        Ok(self.evaluate_index(index))
    }

    /// Evaluates through a handle previously issued by this system.
    pub fn evaluate_ref(&mut self, node: NodeRef) -> Result<f64, UtilityError> {
        if node.index() >= self.graph.node_count() {
            return Err(UtilityError::UnknownRef(node.index()));
        }
        Ok(self.evaluate_index(node.0))
    }

    /// Evaluates each name in order. Fails on the first unknown name.
    pub fn evaluate_batch<S>(&mut self, names: &[S]) -> Result<Vec<f64>, UtilityError>
    where
        S: AsRef<str>,
    {
        names
            .iter()
            .map(|name| self.evaluate(name.as_ref()))
            .collect()
    }

    /// Brings a node up to date and returns its utility.
    ///
    /// Walks stale ancestors in post-order on an explicit stack, so the depth
    /// of the graph never translates into call depth. A dirty node is only
    /// combined once both of its operands are clean.
    pub(crate) fn evaluate_index(&mut self, index: NodeIndex) -> f64 {
        let mut stack = vec![index];

        while let Some(&top) = stack.last() {
            let (a, b) = match &self.graph[top] {
                Node::Derived(node) if node.is_dirty() => node.operands(),
                _ => {
                    stack.pop();
                    continue;
                }
            };

            let mut ready = true;
            for operand in [a, b] {
                if self.graph[operand].is_dirty() {
                    stack.push(operand);
                    ready = false;
                }
            }
            if !ready {
                continue;
            }

            stack.pop();
            let x = self.graph[a].cached();
            let y = self.graph[b].cached();
            if let Node::Derived(node) = &mut self.graph[top] {
                let value = node.combine(x, y);
                tracing::trace!(name = node.name(), value, "recomputed derived utility");
            }
        }

        self.graph[index].cached()
    }
}

fn wrong_kind(name: &str, expected: NodeKind, found: NodeKind) -> UtilityError {
    UtilityError::WrongNodeKind {
        name: name.into(),
        expected,
        found,
    }
}

impl std::fmt::Debug for System {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("System")
            .field("utilities", &self.names().collect::<Vec<_>>())
            .finish()
    }
}

/// Renders the dependency graph as a Mermaid diagram.
impl Display for System {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "graph LR")?;

        for index in self.graph.node_indices() {
            let node = &self.graph[index];
            let name = node.name().replace('"', "#quot;");
            match node.kind() {
                NodeKind::Source => writeln!(f, "    {}[\"{}\"]", index.index(), name)?,
                NodeKind::Derived => writeln!(f, "    {}((\"{}\"))", index.index(), name)?,
            }
        }

        for edge in self.graph.raw_edges() {
            writeln!(
                f,
                "    {} --> {}",
                edge.source().index(),
                edge.target().index()
            )?;
        }

        Ok(())
    }
}
