//! Structural subsumption between concept graphs.
//!
//! `A` is structurally more specific than `B` when A's labels are at least as
//! narrow as B's and every edge of B is matched by an edge of A with the same
//! kind and property whose target is itself more specific. Matching is greedy:
//! any matching edge of A will do, and no injective pairing is searched for.
//! This is an approximation of logical subsumption, not a decision procedure.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::hash::{Hash, Hasher};

use petgraph::stable_graph::NodeIndex;

use crate::expr::ConceptExpr;
use crate::graph::{ConceptGraph, EdgeView, NodeRef};
use crate::node::{ConceptNode, Edge};

/// Partial order on node labels.
///
/// The structural order is parameterised over how two labels compare, so
/// callers with a class hierarchy can make `Employee` count as narrower than
/// `Person`.
pub trait LabelOrder {
    /// Whether `specific` ⊑ `general`.
    fn label_subsumed(&self, specific: &ConceptExpr, general: &ConceptExpr) -> bool;
}

/// Labels compare by identity only.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntacticOrder;

impl LabelOrder for SyntacticOrder {
    fn label_subsumed(&self, specific: &ConceptExpr, general: &ConceptExpr) -> bool {
        specific == general || general.is_top()
    }
}

/// Mixed into the hash of universal edges so `∀R` and `∃R` never collide.
const UNIVERSAL_PERTURBATION: u64 = 0x9e37_79b9_7f4a_7c15;

enum Frame {
    Visit(NodeIndex, NodeIndex),
    Resolve(NodeIndex, NodeIndex),
}

impl<'g> NodeRef<'g> {
    /// Structural subsumption with syntactic label comparison.
    pub fn is_more_specific_than(&self, other: &NodeRef<'_>) -> bool {
        self.is_more_specific_than_in(other, &SyntacticOrder)
    }

    /// Structural subsumption with labels compared by `order`.
    pub fn is_more_specific_than_in<O: LabelOrder + ?Sized>(
        &self,
        other: &NodeRef<'_>,
        order: &O,
    ) -> bool {
        let a_graph = self.graph;
        let b_graph = other.graph;
        let mut memo: HashMap<(NodeIndex, NodeIndex), bool> = HashMap::new();
        let mut pending: HashSet<(NodeIndex, NodeIndex)> = HashSet::new();
        let mut stack = vec![Frame::Visit(self.index, other.index)];

        while let Some(frame) = stack.pop() {
            match frame {
                Frame::Visit(a, b) => {
                    if memo.contains_key(&(a, b)) || !pending.insert((a, b)) {
                        continue;
                    }
                    let (Ok(na), Ok(nb)) = (a_graph.node(a), b_graph.node(b)) else {
                        memo.insert((a, b), false);
                        continue;
                    };
                    match local_check(&na, &nb, order) {
                        Local::Decided(result) => {
                            memo.insert((a, b), result);
                        }
                        Local::Needs(pairs) => {
                            stack.push(Frame::Resolve(a, b));
                            for pair in pairs {
                                if !memo.contains_key(&pair) {
                                    stack.push(Frame::Visit(pair.0, pair.1));
                                }
                            }
                        }
                    }
                }
                Frame::Resolve(a, b) => {
                    let (Ok(na), Ok(nb)) = (a_graph.node(a), b_graph.node(b)) else {
                        memo.insert((a, b), false);
                        continue;
                    };
                    let na_edges = na.out_edges();
                    let result = nb
                        .out_edges()
                        .iter()
                        .filter(|e2| !e2.edge.is_data())
                        .all(|e2| {
                            matching(&na_edges, e2.edge).any(|e1| {
                                memo.get(&(e1.object, e2.object)).copied().unwrap_or(false)
                            })
                        });
                    memo.insert((a, b), result);
                }
            }
        }

        memo.get(&(self.index, other.index)).copied().unwrap_or(false)
    }

    /// Mutual structural subsumption. Identical cached canonical expressions
    /// settle it at once; anything else falls back to the two-way check.
    pub fn structurally_equal(&self, other: &NodeRef<'_>) -> bool {
        if let (Some(a), Some(b)) = (self.cached_canonical(), other.cached_canonical()) {
            if a == b {
                return true;
            }
        }
        self.is_more_specific_than(other) && other.is_more_specific_than(self)
    }

    /// Hash consistent with [`NodeRef::structurally_equal`]. It covers the
    /// plain labels (atoms, negations and `⊥`) among the conjuncts and a lone
    /// disjunct, then the distinct restriction keys (kind and property)
    /// found at this node, whether stored as edges or as restriction labels.
    /// Conjunction labels are flattened first.
    ///
    /// `⊤`, disjunction labels, larger disjunct sets and edge targets are
    /// left out. Greedy matching lets mutually subsuming graphs differ in
    /// their edge multisets below the root, and the canonical fast path
    /// equates `X ⊔ Y` as a label with the disjunct set `{X, Y}`.
    pub fn structural_hash<H: Hasher>(&self, state: &mut H) {
        let concept = self.concept();
        if concept.is_terminal() {
            concept.terminal_value().hash(state);
            return;
        }

        let mut labels: BTreeSet<&ConceptExpr> = BTreeSet::new();
        let mut keys: BTreeSet<Edge> = self.out_edges().into_iter().map(|e| e.edge.clone()).collect();
        let lone_disjunct = (concept.disjuncts().len() == 1)
            .then(|| concept.disjuncts().first())
            .flatten();
        let mut pending: Vec<&ConceptExpr> = concept.conjuncts().iter().chain(lone_disjunct).collect();
        while let Some(label) = pending.pop() {
            match label {
                ConceptExpr::And(ops) => pending.extend(ops),
                ConceptExpr::Atomic(_) | ConceptExpr::Not(_) | ConceptExpr::Bottom => {
                    labels.insert(label);
                }
                other => keys.extend(restriction_key(other)),
            }
        }

        labels.hash(state);
        for key in keys {
            key.hash(state);
            if key.is_universal() {
                UNIVERSAL_PERTURBATION.hash(state);
            }
        }
    }
}

/// Edge key of a restriction written as a label.
fn restriction_key(label: &ConceptExpr) -> Option<Edge> {
    match label {
        ConceptExpr::Exists(p, _) => Some(Edge::Existential(p.clone())),
        ConceptExpr::ForAll(p, _) => Some(Edge::Universal(p.clone())),
        ConceptExpr::Data {
            property, comparison, ..
        } => Some(Edge::data(*comparison, property.clone())),
        _ => None,
    }
}

enum Local {
    Decided(bool),
    Needs(Vec<(NodeIndex, NodeIndex)>),
}

/// Everything about `(a, b)` that can be decided without recursing: the fast
/// path, labels, terminal values, edge existence and data-edge thresholds.
fn local_check<O: LabelOrder + ?Sized>(a: &NodeRef<'_>, b: &NodeRef<'_>, order: &O) -> Local {
    if let (Some(ca), Some(cb)) = (a.cached_canonical(), b.cached_canonical()) {
        if ca == cb {
            return Local::Decided(true);
        }
    }

    let (ca, cb) = (a.concept(), b.concept());
    match (ca.is_terminal(), cb.is_terminal()) {
        (true, true) => return Local::Decided(ca.terminal_value() == cb.terminal_value()),
        (false, false) => {}
        _ => return Local::Decided(false),
    }

    if !labels_more_specific(ca, cb, order) {
        return Local::Decided(false);
    }

    let a_edges = a.out_edges();
    let mut pairs = Vec::new();
    for e2 in b.out_edges() {
        let mut candidates = matching(&a_edges, e2.edge).peekable();
        if candidates.peek().is_none() {
            return Local::Decided(false);
        }
        if e2.edge.is_data() {
            let satisfied = candidates.any(|e1| threshold_more_specific(a, e1, b, &e2));
            if !satisfied {
                return Local::Decided(false);
            }
        } else {
            pairs.extend(candidates.map(|e1| (e1.object, e2.object)));
        }
    }

    if pairs.is_empty() {
        Local::Decided(true)
    } else {
        Local::Needs(pairs)
    }
}

/// Conjuncts narrow, disjuncts widen. An empty disjunct set on the general
/// side stands for `⊤` and is always satisfied. On the specific side it is
/// satisfied only if one of the conjuncts already falls under a general
/// disjunct.
fn labels_more_specific<O: LabelOrder + ?Sized>(a: &ConceptNode, b: &ConceptNode, order: &O) -> bool {
    let conjuncts_ok = b
        .conjuncts()
        .iter()
        .all(|g| a.conjuncts().iter().any(|s| order.label_subsumed(s, g)));
    if !conjuncts_ok {
        return false;
    }
    if b.disjuncts().is_empty() {
        return true;
    }
    let under_general_disjunct = |s: &ConceptExpr| b.disjuncts().iter().any(|g| order.label_subsumed(s, g));
    if !a.disjuncts().is_empty() && a.disjuncts().iter().all(under_general_disjunct) {
        return true;
    }
    a.conjuncts().iter().any(under_general_disjunct)
}

/// Edges of `edges` with the same kind and label as `target`.
fn matching<'a, 'g>(edges: &'a [EdgeView<'g>], target: &'a Edge) -> impl Iterator<Item = &'a EdgeView<'g>> + 'a {
    edges.iter().filter(move |e| e.edge == target)
}

/// `∃p.≥ x` is narrower than `∃p.≥ y` when `x ≥ y`; dually for `≤`.
fn threshold_more_specific(a: &NodeRef<'_>, e1: &EdgeView<'_>, b: &NodeRef<'_>, e2: &EdgeView<'_>) -> bool {
    let value = |n: &NodeRef<'_>, idx| n.graph().concept(idx).ok().and_then(|c| c.terminal_value());
    let (Some(x), Some(y)) = (value(a, e1.object), value(b, e2.object)) else {
        return false;
    };
    match e2.edge {
        Edge::GreaterOrEqual(_) => x >= y,
        Edge::LessOrEqual(_) => x <= y,
        _ => x == y,
    }
}

impl ConceptGraph {
    /// Structural subsumption between the roots of two graphs.
    pub fn is_more_specific_than(&self, other: &ConceptGraph) -> bool {
        self.root_ref().is_more_specific_than(&other.root_ref())
    }

    /// Structural subsumption between roots with labels compared by `order`.
    pub fn is_more_specific_than_in<O: LabelOrder + ?Sized>(&self, other: &ConceptGraph, order: &O) -> bool {
        self.root_ref().is_more_specific_than_in(&other.root_ref(), order)
    }
}

impl PartialEq for ConceptGraph {
    fn eq(&self, other: &Self) -> bool {
        self.root_ref().structurally_equal(&other.root_ref())
    }
}

impl Eq for ConceptGraph {}

impl Hash for ConceptGraph {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.root_ref().structural_hash(state);
    }
}
