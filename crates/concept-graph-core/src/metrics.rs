//! Size, depth and syntactic length of concept graphs.
//!
//! Every metric is memoized per node and computed bottom-up over an explicit
//! post-order, so arbitrarily deep edge chains never recurse on the stack.

use std::collections::{HashMap, HashSet};

use petgraph::stable_graph::NodeIndex;
use tracing::warn;

use crate::error::{ConceptError, ConceptResult};
use crate::graph::{ConceptGraph, NodeRef};
use crate::node::Edge;

/// Length of a data restriction: property, comparison and value.
pub const DATA_EDGE_LENGTH: usize = 3;

/// Length contributed by a quantifier and its property, on top of the filler.
pub const QUANTIFIER_LENGTH: usize = 2;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    InProgress,
    Done,
}

impl ConceptGraph {
    /// Nodes reachable from `start` (terminals included), children before
    /// parents. Fails on a cycle.
    pub(crate) fn post_order(&self, start: NodeIndex) -> ConceptResult<Vec<NodeIndex>> {
        let mut order = Vec::new();
        let mut marks: HashMap<NodeIndex, Mark> = HashMap::new();
        let mut stack = vec![(start, false)];

        while let Some((n, expanded)) = stack.pop() {
            if expanded {
                marks.insert(n, Mark::Done);
                order.push(n);
                continue;
            }
            match marks.get(&n) {
                Some(Mark::Done) => continue,
                Some(Mark::InProgress) => return Err(ConceptError::Cycle { node: n }),
                None => {}
            }
            marks.insert(n, Mark::InProgress);
            stack.push((n, true));
            for e in self.node(n)?.out_edges().into_iter().rev() {
                match marks.get(&e.object) {
                    Some(Mark::Done) => {}
                    Some(Mark::InProgress) => return Err(ConceptError::Cycle { node: e.object }),
                    None => stack.push((e.object, false)),
                }
            }
        }

        Ok(order)
    }

    /// Syntactic length of the whole concept.
    pub fn length(&self) -> usize {
        self.root_ref().length()
    }

    /// Longest edge chain from the root.
    pub fn depth(&self) -> usize {
        self.root_ref().depth()
    }

    /// Number of reachable nodes.
    pub fn size(&self) -> usize {
        self.root_ref().size()
    }
}

impl<'g> NodeRef<'g> {
    /// Syntactic length of the concept rooted here.
    ///
    /// Each operand of the top-level conjunction costs its own length (an
    /// atom costs 1, a disjunction of `m` atoms `2m - 1`, an edge
    /// `2 + length(filler)`, a data restriction 3) and operands are joined by
    /// one connective each. A node with no operands is `⊤`, of length 1.
    pub fn length(&self) -> usize {
        if let Some(len) = self.slot.cache.length.get() {
            return *len;
        }
        self.fill_bottom_up(|n| n.slot.cache.length.get().copied(), |n, child| {
            let node = n.concept();
            if node.is_terminal() {
                return 1;
            }
            let mut operands = 0usize;
            let mut total = 0usize;

            for label in node.conjuncts() {
                operands += 1;
                total += label.length();
            }
            if !node.disjuncts().is_empty() {
                operands += 1;
                total += node.disjuncts().iter().map(|d| d.length()).sum::<usize>()
                    + node.disjuncts().len()
                    - 1;
            }
            for e in n.out_edges() {
                operands += 1;
                total += if e.edge.is_data() {
                    DATA_EDGE_LENGTH
                } else {
                    QUANTIFIER_LENGTH + child(e.object)
                };
            }

            if operands == 0 {
                1
            } else {
                total + operands - 1
            }
        }, |n, value| {
            let _ = n.slot.cache.length.set(value);
        })
    }

    /// Longest edge chain from this node to a leaf. Terminals have depth 0,
    /// so a data edge adds 1.
    pub fn depth(&self) -> usize {
        if let Some(depth) = self.slot.cache.depth.get() {
            return *depth;
        }
        self.fill_bottom_up(|n| n.slot.cache.depth.get().copied(), |n, child| {
            n.out_edges()
                .iter()
                .map(|e| 1 + child(e.object))
                .max()
                .unwrap_or(0)
        }, |n, value| {
            let _ = n.slot.cache.depth.set(value);
        })
    }

    /// Number of distinct nodes reachable from here, this node and terminals
    /// included.
    pub fn size(&self) -> usize {
        *self
            .slot
            .cache
            .size
            .get_or_init(|| self.graph.reachable(self.index).len())
    }

    /// Number of outgoing edges of each kind, as `(existential, universal, data)`.
    pub fn edge_counts(&self) -> (usize, usize, usize) {
        self.out_edges()
            .iter()
            .fold((0, 0, 0), |(ex, un, da), e| match e.edge {
                Edge::Existential(_) => (ex + 1, un, da),
                Edge::Universal(_) => (ex, un + 1, da),
                _ => (ex, un, da + 1),
            })
    }

    /// Whether this node denotes `⊤` on its own: no labels and no edges.
    pub fn is_universal(&self) -> bool {
        self.concept().has_empty_labels() && self.is_leaf()
    }

    /// Evaluate `compute` for every node below (and including) this one,
    /// children first, storing each value with `store`. Nodes whose value is
    /// already cached are not recomputed.
    fn fill_bottom_up(
        &self,
        cached: impl Fn(&NodeRef<'g>) -> Option<usize>,
        compute: impl Fn(&NodeRef<'g>, &dyn Fn(NodeIndex) -> usize) -> usize,
        store: impl Fn(&NodeRef<'g>, usize),
    ) -> usize {
        // A cyclic graph has no well-defined metric.
        let order = match self.graph.post_order(self.index) {
            Ok(order) => order,
            Err(e) => {
                warn!(node = ?self.index, error = %e, "metric_on_cyclic_graph");
                return 0;
            }
        };
        let mut values: HashMap<NodeIndex, usize> = HashMap::with_capacity(order.len());
        let mut seen = HashSet::with_capacity(order.len());

        for n in order {
            if !seen.insert(n) {
                continue;
            }
            let Ok(node) = self.sibling(n) else { continue };
            let value = match cached(&node) {
                Some(v) => v,
                None => {
                    let lookup = |c: NodeIndex| values.get(&c).copied().unwrap_or(0);
                    let v = compute(&node, &lookup);
                    store(&node, v);
                    v
                }
            };
            values.insert(n, value);
        }

        values.get(&self.index).copied().unwrap_or(0)
    }
}
