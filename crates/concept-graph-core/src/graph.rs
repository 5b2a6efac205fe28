//! Arena-backed concept graph.
//!
//! A `ConceptGraph` owns every node reachable from its root inside a
//! petgraph `StableDiGraph`. Edges are stored once in the arena, so an edge is
//! always visible from both its subject (outgoing) and its object (incoming)
//! and removing it updates both sides at once. Incoming edges are plain
//! handles used for lookups; nothing is owned through them.
//!
//! Cloning a graph deep-copies the arena. Node handles stay valid across a
//! clone, so a handle taken from the original addresses the counterpart node
//! inside the copy.

use std::collections::{HashMap, HashSet, VecDeque};

use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

use crate::error::{ConceptError, ConceptResult};
use crate::expr::{Comparison, ConceptExpr};
use crate::node::{ConceptNode, Edge, NodeCache, Slot};
use crate::primitives::{DataProperty, Literal, Numeric, PropertyExpr};

/// A rooted concept graph.
#[derive(Debug, Clone)]
pub struct ConceptGraph {
    pub(crate) graph: StableDiGraph<Slot, Edge>,
    root: NodeIndex,
}

/// Borrowed view of one edge.
#[derive(Debug, Clone, Copy)]
pub struct EdgeView<'g> {
    /// Edge handle.
    pub id: EdgeIndex,
    /// Node the edge leaves from.
    pub subject: NodeIndex,
    /// Node the edge points to.
    pub object: NodeIndex,
    /// Edge kind and label.
    pub edge: &'g Edge,
}

/// Borrowed view of one node inside a graph.
#[derive(Debug, Clone, Copy)]
pub struct NodeRef<'g> {
    pub(crate) graph: &'g ConceptGraph,
    pub(crate) index: NodeIndex,
    pub(crate) slot: &'g Slot,
}

impl<'g> NodeRef<'g> {
    /// Handle of this node.
    pub fn index(&self) -> NodeIndex {
        self.index
    }

    /// The graph this node lives in.
    pub fn graph(&self) -> &'g ConceptGraph {
        self.graph
    }

    /// The node itself.
    pub fn concept(&self) -> &'g ConceptNode {
        &self.slot.node
    }

    /// Outgoing edges in insertion order.
    pub fn out_edges(&self) -> Vec<EdgeView<'g>> {
        self.graph.edges_of(self.index, Direction::Outgoing)
    }

    /// Incoming edges in insertion order.
    pub fn in_edges(&self) -> Vec<EdgeView<'g>> {
        self.graph.edges_of(self.index, Direction::Incoming)
    }

    /// Whether the node has no outgoing edges.
    pub fn is_leaf(&self) -> bool {
        self.graph
            .graph
            .edges_directed(self.index, Direction::Outgoing)
            .next()
            .is_none()
    }

    /// View of another node of the same graph.
    pub(crate) fn sibling(&self, index: NodeIndex) -> ConceptResult<NodeRef<'g>> {
        self.graph.node(index)
    }
}

impl ConceptGraph {
    /// A graph consisting of a single root node.
    pub fn new(root: ConceptNode) -> Self {
        let mut graph = StableDiGraph::new();
        let root = graph.add_node(Slot::new(root));
        Self { graph, root }
    }

    /// The universal concept `⊤` in full form.
    pub fn universal() -> Self {
        Self::new(ConceptNode::universal())
    }

    /// The universal concept `⊤` in lightweight form.
    pub fn lightweight_universal() -> Self {
        Self::new(ConceptNode::lightweight_universal())
    }

    /// Build a full-form graph from a class expression.
    ///
    /// Top-level conjunction operands become conjuncts or edges, the first
    /// disjunction becomes the disjunct set, and every other operand is kept
    /// as an opaque label.
    pub fn from_expr(expr: &ConceptExpr) -> Self {
        let mut graph = Self::universal();
        let mut work = vec![(graph.root, expr)];

        while let Some((index, expr)) = work.pop() {
            let operands: Vec<&ConceptExpr> = match expr {
                ConceptExpr::And(ops) => ops.iter().collect(),
                other => vec![other],
            };

            for op in operands {
                match op {
                    ConceptExpr::Top => {}
                    ConceptExpr::Exists(p, filler) => {
                        let child =
                            graph.push_edge(index, Edge::Existential(p.clone()), ConceptNode::universal());
                        work.push((child, filler));
                    }
                    ConceptExpr::ForAll(p, filler) => {
                        let child =
                            graph.push_edge(index, Edge::Universal(p.clone()), ConceptNode::universal());
                        work.push((child, filler));
                    }
                    ConceptExpr::Data {
                        property,
                        comparison,
                        value,
                    } => {
                        let terminal = match value {
                            Literal::Numeric(n) => ConceptNode::Numeric(*n),
                            text => ConceptNode::Literal(text.clone()),
                        };
                        graph.push_edge(index, Edge::data(*comparison, property.clone()), terminal);
                    }
                    ConceptExpr::Or(ops) => {
                        let node = &mut graph.graph[index].node;
                        if node.disjuncts().is_empty() {
                            if let Some(disjuncts) = node.disjuncts_mut() {
                                disjuncts.extend(ops.iter().cloned());
                            }
                        } else if let Some(conjuncts) = node.conjuncts_mut() {
                            conjuncts.insert(op.clone());
                        }
                    }
                    other => {
                        if let Some(conjuncts) = graph.graph[index].node.conjuncts_mut() {
                            conjuncts.insert(other.clone());
                        }
                    }
                }
            }
        }

        graph
    }

    /// Handle of the root node.
    pub fn root(&self) -> NodeIndex {
        self.root
    }

    /// View of the root node.
    pub fn root_ref(&self) -> NodeRef<'_> {
        NodeRef {
            graph: self,
            index: self.root,
            slot: &self.graph[self.root],
        }
    }

    /// View of a node.
    pub fn node(&self, index: NodeIndex) -> ConceptResult<NodeRef<'_>> {
        let slot = self
            .graph
            .node_weight(index)
            .ok_or(ConceptError::UnknownNode { node: index })?;
        Ok(NodeRef {
            graph: self,
            index,
            slot,
        })
    }

    /// The node stored under a handle.
    pub fn concept(&self, index: NodeIndex) -> ConceptResult<&ConceptNode> {
        self.node(index).map(|n| n.concept())
    }

    /// Mutable access to a node. Clears every memoized cache of the graph,
    /// since any change can affect the metrics of all ancestors.
    pub fn concept_mut(&mut self, index: NodeIndex) -> ConceptResult<&mut ConceptNode> {
        if !self.graph.contains_node(index) {
            return Err(ConceptError::UnknownNode { node: index });
        }
        self.invalidate_caches();
        Ok(&mut self.graph[index].node)
    }

    /// Number of nodes held in the arena.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of edges held in the arena.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Outgoing edges of a node, in insertion order.
    pub fn out_edges(&self, index: NodeIndex) -> ConceptResult<Vec<EdgeView<'_>>> {
        self.node(index).map(|n| n.out_edges())
    }

    /// Incoming edges of a node, in insertion order.
    pub fn in_edges(&self, index: NodeIndex) -> ConceptResult<Vec<EdgeView<'_>>> {
        self.node(index).map(|n| n.in_edges())
    }

    fn edges_of(&self, index: NodeIndex, direction: Direction) -> Vec<EdgeView<'_>> {
        let mut edges: Vec<EdgeView<'_>> = self
            .graph
            .edges_directed(index, direction)
            .map(|e| EdgeView {
                id: e.id(),
                subject: e.source(),
                object: e.target(),
                edge: e.weight(),
            })
            .collect();
        edges.sort_by_key(|e| e.id);
        edges
    }

    /// Drop every memoized canonical expression and metric.
    pub fn invalidate_caches(&mut self) {
        for slot in self.graph.node_weights_mut() {
            slot.cache = NodeCache::default();
        }
    }

    // =========================================================================
    // Edges
    // =========================================================================

    /// Attach a new edge from `subject` to a freshly created `object` node and
    /// return the object's handle.
    pub fn add_edge(
        &mut self,
        subject: NodeIndex,
        edge: Edge,
        object: ConceptNode,
    ) -> ConceptResult<NodeIndex> {
        let subject_node = self.concept(subject)?;
        if subject_node.is_terminal() {
            return Err(ConceptError::NodeKindMismatch {
                node: subject,
                expected: "compound",
                found: subject_node.kind_name(),
            });
        }
        if edge.is_universal() && subject_node.is_lightweight() {
            return Err(ConceptError::NodeKindMismatch {
                node: subject,
                expected: "full",
                found: subject_node.kind_name(),
            });
        }
        let object_ok = match (&edge, &object) {
            (Edge::Existential(_) | Edge::Universal(_), o) => !o.is_terminal(),
            (Edge::Equal(_), o) => o.is_terminal(),
            (_, ConceptNode::Numeric(_)) => true,
            _ => false,
        };
        if !object_ok {
            return Err(ConceptError::NodeKindMismatch {
                node: subject,
                expected: if edge.is_data() { "terminal object" } else { "compound object" },
                found: object.kind_name(),
            });
        }

        self.invalidate_caches();
        Ok(self.push_edge(subject, edge, object))
    }

    /// `subject ⊓ ∃property.⊤`; returns the new `⊤` node.
    pub fn add_existential(
        &mut self,
        subject: NodeIndex,
        property: PropertyExpr,
    ) -> ConceptResult<NodeIndex> {
        let child = self.concept(subject)?.fresh_child();
        self.add_edge(subject, Edge::Existential(property), child)
    }

    /// `subject ⊓ ∀property.⊤`; returns the new `⊤` node.
    pub fn add_universal(
        &mut self,
        subject: NodeIndex,
        property: PropertyExpr,
    ) -> ConceptResult<NodeIndex> {
        self.add_edge(subject, Edge::Universal(property), ConceptNode::universal())
    }

    /// `subject ⊓ ∃property.(comparison value)`; returns the terminal.
    pub fn add_data_restriction(
        &mut self,
        subject: NodeIndex,
        comparison: Comparison,
        property: DataProperty,
        value: Numeric,
    ) -> ConceptResult<NodeIndex> {
        self.add_edge(subject, Edge::data(comparison, property), ConceptNode::Numeric(value))
    }

    /// Remove an edge (from both endpoints) together with any nodes that are
    /// no longer reachable from the root.
    pub fn remove_edge(&mut self, id: EdgeIndex) -> ConceptResult<Edge> {
        let edge = self
            .graph
            .remove_edge(id)
            .ok_or(ConceptError::UnknownEdge { edge: id })?;

        let keep: HashSet<NodeIndex> = self.reachable(self.root).into_iter().collect();
        let orphans: Vec<NodeIndex> = self
            .graph
            .node_indices()
            .filter(|n| !keep.contains(n))
            .collect();
        for n in orphans {
            self.graph.remove_node(n);
        }

        self.invalidate_caches();
        Ok(edge)
    }

    /// Replace the value held by a numeric terminal.
    pub fn set_threshold(&mut self, terminal: NodeIndex, value: Numeric) -> ConceptResult<()> {
        match self.concept_mut(terminal)? {
            ConceptNode::Numeric(n) => {
                *n = value;
                Ok(())
            }
            other => Err(ConceptError::NodeKindMismatch {
                node: terminal,
                expected: "numeric",
                found: other.kind_name(),
            }),
        }
    }

    pub(crate) fn push_edge(&mut self, subject: NodeIndex, edge: Edge, object: ConceptNode) -> NodeIndex {
        let child = self.graph.add_node(Slot::new(object));
        self.graph.add_edge(subject, child, edge);
        child
    }

    // =========================================================================
    // Labels
    // =========================================================================

    /// Add a conjunct. Returns `false` if it was already present.
    pub fn add_conjunct(&mut self, index: NodeIndex, label: ConceptExpr) -> ConceptResult<bool> {
        self.check_label_allowed(index, &label)?;
        let node = self.concept_mut(index)?;
        let found = node.kind_name();
        node.conjuncts_mut()
            .map(|set| set.insert(label))
            .ok_or(ConceptError::NodeKindMismatch {
                node: index,
                expected: "compound",
                found,
            })
    }

    /// Remove a conjunct. Returns `false` if it was absent.
    pub fn remove_conjunct(&mut self, index: NodeIndex, label: &ConceptExpr) -> ConceptResult<bool> {
        let node = self.concept_mut(index)?;
        let found = node.kind_name();
        node.conjuncts_mut()
            .map(|set| set.remove(label))
            .ok_or(ConceptError::NodeKindMismatch {
                node: index,
                expected: "compound",
                found,
            })
    }

    /// Swap one conjunct for another.
    pub fn replace_conjunct(
        &mut self,
        index: NodeIndex,
        old: &ConceptExpr,
        new: ConceptExpr,
    ) -> ConceptResult<()> {
        self.check_label_allowed(index, &new)?;
        self.remove_conjunct(index, old)?;
        self.add_conjunct(index, new)?;
        Ok(())
    }

    /// Replace the whole disjunct set of a full node.
    pub fn set_disjuncts(
        &mut self,
        index: NodeIndex,
        disjuncts: impl IntoIterator<Item = ConceptExpr>,
    ) -> ConceptResult<()> {
        let node = self.concept_mut(index)?;
        let found = node.kind_name();
        let set = node.disjuncts_mut().ok_or(ConceptError::NodeKindMismatch {
            node: index,
            expected: "full",
            found,
        })?;
        *set = disjuncts.into_iter().collect();
        Ok(())
    }

    fn check_label_allowed(&self, index: NodeIndex, label: &ConceptExpr) -> ConceptResult<()> {
        let node = self.concept(index)?;
        if node.is_lightweight() && !matches!(label, ConceptExpr::Atomic(_) | ConceptExpr::Top) {
            return Err(ConceptError::NodeKindMismatch {
                node: index,
                expected: "full",
                found: node.kind_name(),
            });
        }
        Ok(())
    }

    // =========================================================================
    // Traversal
    // =========================================================================

    /// Breadth-first enumeration of the compound nodes reachable from the
    /// root. Data edges (and the terminals behind them) are skipped.
    pub fn traverse(&self) -> Vec<NodeIndex> {
        self.bfs(self.root, false)
    }

    /// Breadth-first enumeration of every node reachable from `start`,
    /// terminals included.
    pub fn reachable(&self, start: NodeIndex) -> Vec<NodeIndex> {
        self.bfs(start, true)
    }

    fn bfs(&self, start: NodeIndex, include_data: bool) -> Vec<NodeIndex> {
        let mut order = Vec::new();
        if !self.graph.contains_node(start) {
            return order;
        }
        let mut seen = HashSet::from([start]);
        let mut queue = VecDeque::from([start]);

        while let Some(n) = queue.pop_front() {
            order.push(n);
            for e in self.edges_of(n, Direction::Outgoing) {
                if !include_data && e.edge.is_data() {
                    continue;
                }
                if seen.insert(e.object) {
                    queue.push_back(e.object);
                }
            }
        }

        order
    }

    /// Edge distance from the root to every reachable node.
    pub fn depths(&self) -> HashMap<NodeIndex, usize> {
        let mut depths = HashMap::from([(self.root, 0)]);
        let mut queue = VecDeque::from([self.root]);

        while let Some(n) = queue.pop_front() {
            let d = depths[&n];
            for e in self.edges_of(n, Direction::Outgoing) {
                if !depths.contains_key(&e.object) {
                    depths.insert(e.object, d + 1);
                    queue.push_back(e.object);
                }
            }
        }

        depths
    }

    /// Edge distance from the root to `index`, if reachable.
    pub fn depth_of(&self, index: NodeIndex) -> Option<usize> {
        self.depths().get(&index).copied()
    }

    /// First node (in traversal order) structurally equal to `target`, which
    /// may live in another graph.
    pub fn find(&self, target: NodeRef<'_>) -> Option<NodeIndex> {
        self.traverse().into_iter().find(|&n| {
            self.node(n)
                .map(|candidate| candidate.structurally_equal(&target))
                .unwrap_or(false)
        })
    }
}
