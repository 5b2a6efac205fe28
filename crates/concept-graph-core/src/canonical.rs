//! Canonical class expressions.
//!
//! The canonical form of a node is the conjunction of its conjuncts, the
//! disjunction of its disjuncts, and one restriction per outgoing edge built
//! from the child's canonical form. It is folded bottom-up and cached once
//! per node.

use petgraph::stable_graph::NodeIndex;

use crate::error::{ConceptError, ConceptResult};
use crate::expr::ConceptExpr;
use crate::graph::{ConceptGraph, NodeRef};
use crate::node::Edge;

impl ConceptGraph {
    /// Canonical expression of the root, folding the whole graph if needed.
    pub fn canonical_expr(&self) -> ConceptResult<&ConceptExpr> {
        self.root_ref().canonical_expr()
    }

    /// Fold a single node. Every conceptual child must already carry a
    /// canonical expression; otherwise this fails with
    /// [`ConceptError::MissingCanonical`].
    pub fn fold_node(&self, index: NodeIndex) -> ConceptResult<&ConceptExpr> {
        let node = self.node(index)?;
        if let Some(expr) = node.slot.cache.canonical.get() {
            return Ok(expr);
        }
        let concept = node.concept();
        if concept.is_terminal() {
            return Err(ConceptError::NodeKindMismatch {
                node: index,
                expected: "compound",
                found: concept.kind_name(),
            });
        }

        let mut operands: Vec<ConceptExpr> = concept.conjuncts().iter().cloned().collect();
        if !concept.disjuncts().is_empty() {
            operands.push(ConceptExpr::or(concept.disjuncts().iter().cloned()));
        }

        for e in node.out_edges() {
            let operand = match e.edge {
                Edge::Existential(p) => ConceptExpr::exists(p.clone(), self.child_canonical(index, e.object)?),
                Edge::Universal(p) => ConceptExpr::for_all(p.clone(), self.child_canonical(index, e.object)?),
                data => {
                    let terminal = self.concept(e.object)?;
                    let value = terminal.terminal_value().ok_or(ConceptError::NodeKindMismatch {
                        node: e.object,
                        expected: "terminal",
                        found: terminal.kind_name(),
                    })?;
                    match (data.data_property(), data.comparison()) {
                        (Some(property), Some(comparison)) => ConceptExpr::Data {
                            property: property.clone(),
                            comparison,
                            value,
                        },
                        _ => continue,
                    }
                }
            };
            operands.push(operand);
        }

        let _ = node.slot.cache.canonical.set(ConceptExpr::and(operands));
        node.slot
            .cache
            .canonical
            .get()
            .ok_or(ConceptError::MissingCanonical { node: index, child: index })
    }

    fn child_canonical(&self, parent: NodeIndex, child: NodeIndex) -> ConceptResult<ConceptExpr> {
        self.node(child)?
            .slot
            .cache
            .canonical
            .get()
            .cloned()
            .ok_or(ConceptError::MissingCanonical { node: parent, child })
    }
}

impl<'g> NodeRef<'g> {
    /// Canonical expression of the concept rooted at this node. Computed once;
    /// later calls return the same cached value.
    pub fn canonical_expr(&self) -> ConceptResult<&'g ConceptExpr> {
        if let Some(expr) = self.slot.cache.canonical.get() {
            return Ok(expr);
        }
        for n in self.graph.post_order(self.index)? {
            if self.graph.concept(n)?.is_terminal() {
                continue;
            }
            self.graph.fold_node(n)?;
        }
        self.graph.fold_node(self.index)
    }

    /// Canonical expression if one has already been computed.
    pub fn cached_canonical(&self) -> Option<&'g ConceptExpr> {
        self.slot.cache.canonical.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::PropertyExpr;

    fn atom(name: &str) -> ConceptExpr {
        ConceptExpr::atomic(name)
    }

    #[test]
    fn universal_node_folds_to_top() {
        let g = ConceptGraph::universal();
        assert_eq!(g.canonical_expr().unwrap(), &ConceptExpr::Top);
    }

    #[test]
    fn canonical_round_trips_expression() {
        let expr = ConceptExpr::and([
            atom("Person"),
            ConceptExpr::or([atom("A"), atom("B")]),
            ConceptExpr::exists(PropertyExpr::named("hasChild"), atom("Person")),
            ConceptExpr::for_all(PropertyExpr::named("likes"), ConceptExpr::Top),
        ]);
        let g = ConceptGraph::from_expr(&expr);
        assert_eq!(g.canonical_expr().unwrap(), &expr);
    }

    #[test]
    fn canonical_is_memoized() {
        let g = ConceptGraph::from_expr(&ConceptExpr::exists(PropertyExpr::named("r"), atom("A")));
        let first = g.canonical_expr().unwrap();
        let second = g.canonical_expr().unwrap();
        assert!(std::ptr::eq(first, second));
    }

    #[test]
    fn folding_parent_before_child_fails() {
        let mut g = ConceptGraph::universal();
        let root = g.root();
        let child = g.add_existential(root, PropertyExpr::named("r")).unwrap();

        let err = g.fold_node(root).unwrap_err();
        assert!(matches!(err, ConceptError::MissingCanonical { child: c, .. } if c == child));

        g.fold_node(child).unwrap();
        assert_eq!(
            g.fold_node(root).unwrap(),
            &ConceptExpr::exists(PropertyExpr::named("r"), ConceptExpr::Top)
        );
    }

    #[test]
    fn mutation_drops_cached_canonical() {
        let mut g = ConceptGraph::universal();
        assert_eq!(g.canonical_expr().unwrap(), &ConceptExpr::Top);
        let root = g.root();
        g.add_conjunct(root, atom("A")).unwrap();
        assert_eq!(g.canonical_expr().unwrap(), &atom("A"));
    }
}
