//! Redundancy predicates.
//!
//! A label is redundant at a node when it adds nothing (it is entailed by, or
//! entails, a label already there) or makes the node unsatisfiable (it is
//! disjoint with a sibling label or with the domain or range the node's
//! edges impose). Every predicate fails open on terms the index does not
//! know.

use concept_graph_core::{ConceptExpr, ConceptGraph, ConceptResult, Edge, NodeIndex, NodeRef};

use crate::index::HierarchyIndex;

/// Why a label was judged redundant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Redundancy {
    /// Disjoint with a label of the same node.
    DisjointWithSibling,
    /// Disjoint with the domain of an outgoing edge.
    DisjointWithDomain,
    /// Disjoint with the range of an incoming edge.
    DisjointWithRange,
    /// Equal to, equivalent to, or related by subsumption with a label of the
    /// same node.
    SubsumedBySibling,
}

/// Candidate is disjoint with one of `siblings`.
pub fn disjoint_with_siblings<'a>(
    index: &HierarchyIndex,
    candidate: &ConceptExpr,
    siblings: impl IntoIterator<Item = &'a ConceptExpr>,
) -> bool {
    siblings.into_iter().any(|s| index.are_disjoint(candidate, s))
}

/// Candidate is disjoint with the domain of an outgoing existential or data
/// edge of `node`.
pub fn disjoint_with_domain(index: &HierarchyIndex, candidate: &ConceptExpr, node: &NodeRef<'_>) -> bool {
    node.out_edges().iter().any(|e| {
        let domain = match e.edge {
            Edge::Existential(p) => index.domain(p),
            Edge::Universal(_) => return false,
            data => match data.data_property() {
                Some(p) => index.data_domain(p),
                None => return false,
            },
        };
        domain.iter().any(|d| index.are_disjoint(candidate, d))
    })
}

/// Candidate is disjoint with the range of an edge pointing at `node`.
pub fn disjoint_with_range(index: &HierarchyIndex, candidate: &ConceptExpr, node: &NodeRef<'_>) -> bool {
    node.in_edges().iter().any(|e| {
        e.edge
            .property()
            .is_some_and(|p| index.range(p).iter().any(|r| index.are_disjoint(candidate, r)))
    })
}

/// Candidate is equal to, or a sub/superclass of, one of `siblings`.
///
/// A negated candidate `¬X` is also compared as `X` against the complements
/// of the siblings, so `¬A` next to `¬B` is caught from the hierarchy of `A`
/// and `B` even when the index holds no complements.
pub fn subsumed_by_siblings<'a>(
    index: &HierarchyIndex,
    candidate: &ConceptExpr,
    siblings: impl IntoIterator<Item = &'a ConceptExpr>,
) -> bool {
    siblings.into_iter().any(|s| {
        if index.are_related(candidate, s) {
            return true;
        }
        match candidate {
            ConceptExpr::Not(inner) => index.are_related(inner, &ConceptExpr::not(s.clone())),
            _ => false,
        }
    })
}

/// Run every predicate for `candidate` placed among the conjuncts of `node`,
/// ignoring `replaced` (the label the candidate is about to replace).
pub fn check_conjunct(
    index: &HierarchyIndex,
    candidate: &ConceptExpr,
    node: &NodeRef<'_>,
    replaced: Option<&ConceptExpr>,
) -> Option<Redundancy> {
    let concept = node.concept();
    let siblings = || concept.conjuncts().iter().filter(move |c| Some(*c) != replaced);

    if disjoint_with_siblings(index, candidate, siblings()) {
        return Some(Redundancy::DisjointWithSibling);
    }
    if subsumed_by_siblings(index, candidate, siblings().chain(concept.disjuncts())) {
        return Some(Redundancy::SubsumedBySibling);
    }
    check_edges(index, candidate, node)
}

/// Domain and range checks only.
pub fn check_edges(index: &HierarchyIndex, candidate: &ConceptExpr, node: &NodeRef<'_>) -> Option<Redundancy> {
    if disjoint_with_domain(index, candidate, node) {
        return Some(Redundancy::DisjointWithDomain);
    }
    if disjoint_with_range(index, candidate, node) {
        return Some(Redundancy::DisjointWithRange);
    }
    None
}

/// First redundancy found anywhere in `graph`, with the node it was found at.
///
/// Every conceptual node is checked for conjuncts that are disjoint with or
/// related to another conjunct, conjuncts clashing with incident edge
/// domains or ranges, disjuncts related to one another, and disjunctions
/// already entailed by a conjunct.
pub fn find_redundancy(
    index: &HierarchyIndex,
    graph: &ConceptGraph,
) -> ConceptResult<Option<(NodeIndex, Redundancy)>> {
    for n in graph.traverse() {
        let node = graph.node(n)?;
        let concept = node.concept();

        for c in concept.conjuncts() {
            let others = || concept.conjuncts().iter().filter(move |o| *o != c);
            if disjoint_with_siblings(index, c, others()) {
                return Ok(Some((n, Redundancy::DisjointWithSibling)));
            }
            if subsumed_by_siblings(index, c, others()) {
                return Ok(Some((n, Redundancy::SubsumedBySibling)));
            }
            if let Some(r) = check_edges(index, c, &node) {
                return Ok(Some((n, r)));
            }
        }

        let disjuncts = concept.disjuncts();
        for d in disjuncts {
            if subsumed_by_siblings(index, d, disjuncts.iter().filter(|o| *o != d)) {
                return Ok(Some((n, Redundancy::SubsumedBySibling)));
            }
        }
        let entailed = concept
            .conjuncts()
            .iter()
            .any(|c| disjuncts.iter().any(|d| index.is_subclass_of(c, d)));
        if entailed {
            return Ok(Some((n, Redundancy::SubsumedBySibling)));
        }
    }
    Ok(None)
}

/// Whether any node of `graph` carries a redundant label.
pub fn is_redundant(index: &HierarchyIndex, graph: &ConceptGraph) -> ConceptResult<bool> {
    Ok(find_redundancy(index, graph)?.is_some())
}
