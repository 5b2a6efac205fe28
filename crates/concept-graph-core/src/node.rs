//! Node and edge variants of the concept graph.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::expr::{Comparison, ConceptExpr};
use crate::primitives::{DataProperty, Literal, Numeric, PropertyExpr};

static NO_LABELS: BTreeSet<ConceptExpr> = BTreeSet::new();

/// A node of a concept graph.
///
/// Compound nodes carry label sets; terminals carry a single value and are
/// only ever reached through data edges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConceptNode {
    /// `(⊓ conjuncts) ⊓ (⊔ disjuncts)`. Both sets empty means `⊤`.
    Full {
        conjuncts: BTreeSet<ConceptExpr>,
        disjuncts: BTreeSet<ConceptExpr>,
    },
    /// Conjunction of labels only: no disjunction, no negation, existential
    /// edges only.
    Lightweight { labels: BTreeSet<ConceptExpr> },
    /// Non-numeric literal terminal.
    Literal(Literal),
    /// Numeric terminal used as a data-restriction threshold.
    Numeric(Numeric),
}

impl ConceptNode {
    /// The universal concept in full form.
    pub fn universal() -> Self {
        ConceptNode::Full {
            conjuncts: BTreeSet::new(),
            disjuncts: BTreeSet::new(),
        }
    }

    /// The universal concept in lightweight form.
    pub fn lightweight_universal() -> Self {
        ConceptNode::Lightweight {
            labels: BTreeSet::new(),
        }
    }

    /// A full node with the given label sets.
    pub fn full(
        conjuncts: impl IntoIterator<Item = ConceptExpr>,
        disjuncts: impl IntoIterator<Item = ConceptExpr>,
    ) -> Self {
        ConceptNode::Full {
            conjuncts: conjuncts.into_iter().collect(),
            disjuncts: disjuncts.into_iter().collect(),
        }
    }

    /// A lightweight node with the given labels.
    pub fn lightweight(labels: impl IntoIterator<Item = ConceptExpr>) -> Self {
        ConceptNode::Lightweight {
            labels: labels.into_iter().collect(),
        }
    }

    /// Short name of the variant, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            ConceptNode::Full { .. } => "full",
            ConceptNode::Lightweight { .. } => "lightweight",
            ConceptNode::Literal(_) => "literal",
            ConceptNode::Numeric(_) => "numeric",
        }
    }

    /// Whether this node is a literal or numeric terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ConceptNode::Literal(_) | ConceptNode::Numeric(_))
    }

    /// Whether this is the lightweight form.
    pub fn is_lightweight(&self) -> bool {
        matches!(self, ConceptNode::Lightweight { .. })
    }

    /// Conjunctive labels (the label set of a lightweight node). Empty for
    /// terminals.
    pub fn conjuncts(&self) -> &BTreeSet<ConceptExpr> {
        match self {
            ConceptNode::Full { conjuncts, .. } => conjuncts,
            ConceptNode::Lightweight { labels } => labels,
            _ => &NO_LABELS,
        }
    }

    /// Disjunctive labels. Always empty for lightweight nodes and terminals.
    pub fn disjuncts(&self) -> &BTreeSet<ConceptExpr> {
        match self {
            ConceptNode::Full { disjuncts, .. } => disjuncts,
            _ => &NO_LABELS,
        }
    }

    /// Whether the node has no labels at all (its label is `⊤`).
    pub fn has_empty_labels(&self) -> bool {
        !self.is_terminal() && self.conjuncts().is_empty() && self.disjuncts().is_empty()
    }

    /// Mutable conjunct set, if this is a compound node.
    pub(crate) fn conjuncts_mut(&mut self) -> Option<&mut BTreeSet<ConceptExpr>> {
        match self {
            ConceptNode::Full { conjuncts, .. } => Some(conjuncts),
            ConceptNode::Lightweight { labels } => Some(labels),
            _ => None,
        }
    }

    /// Mutable disjunct set, if this is a full node.
    pub(crate) fn disjuncts_mut(&mut self) -> Option<&mut BTreeSet<ConceptExpr>> {
        match self {
            ConceptNode::Full { disjuncts, .. } => Some(disjuncts),
            _ => None,
        }
    }

    /// Terminal value as a literal.
    pub fn terminal_value(&self) -> Option<Literal> {
        match self {
            ConceptNode::Literal(l) => Some(l.clone()),
            ConceptNode::Numeric(n) => Some(Literal::Numeric(*n)),
            _ => None,
        }
    }

    /// A fresh universal node of the same form as `self`.
    pub(crate) fn fresh_child(&self) -> Self {
        if self.is_lightweight() {
            ConceptNode::lightweight_universal()
        } else {
            ConceptNode::universal()
        }
    }
}

/// A typed edge. The subject and object are the graph endpoints.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Edge {
    /// `∃R.C`
    Existential(PropertyExpr),
    /// `∀R.C`
    Universal(PropertyExpr),
    /// `∃p.(= v)`
    Equal(DataProperty),
    /// `∃p.(≥ v)`
    GreaterOrEqual(DataProperty),
    /// `∃p.(≤ v)`
    LessOrEqual(DataProperty),
}

impl Edge {
    /// Data edge for a comparison.
    pub fn data(comparison: Comparison, property: DataProperty) -> Self {
        match comparison {
            Comparison::Equal => Edge::Equal(property),
            Comparison::GreaterOrEqual => Edge::GreaterOrEqual(property),
            Comparison::LessOrEqual => Edge::LessOrEqual(property),
        }
    }

    /// Object property label of a conceptual edge.
    pub fn property(&self) -> Option<&PropertyExpr> {
        match self {
            Edge::Existential(p) | Edge::Universal(p) => Some(p),
            _ => None,
        }
    }

    /// Data property label of a data edge.
    pub fn data_property(&self) -> Option<&DataProperty> {
        match self {
            Edge::Equal(p) | Edge::GreaterOrEqual(p) | Edge::LessOrEqual(p) => Some(p),
            _ => None,
        }
    }

    /// Comparison of a data edge.
    pub fn comparison(&self) -> Option<Comparison> {
        match self {
            Edge::Equal(_) => Some(Comparison::Equal),
            Edge::GreaterOrEqual(_) => Some(Comparison::GreaterOrEqual),
            Edge::LessOrEqual(_) => Some(Comparison::LessOrEqual),
            _ => None,
        }
    }

    /// Whether the object of this edge is a terminal.
    pub fn is_data(&self) -> bool {
        self.data_property().is_some()
    }

    /// Whether this is an existential edge.
    pub fn is_existential(&self) -> bool {
        matches!(self, Edge::Existential(_))
    }

    /// Whether this is a universal edge.
    pub fn is_universal(&self) -> bool {
        matches!(self, Edge::Universal(_))
    }
}

/// Write-once per-node caches. Cleared wholesale whenever the owning graph is
/// mutated.
#[derive(Debug, Clone, Default)]
pub(crate) struct NodeCache {
    pub(crate) canonical: OnceLock<ConceptExpr>,
    pub(crate) length: OnceLock<usize>,
    pub(crate) depth: OnceLock<usize>,
    pub(crate) size: OnceLock<usize>,
}

/// Arena slot: the node plus its caches.
#[derive(Debug, Clone)]
pub(crate) struct Slot {
    pub(crate) node: ConceptNode,
    pub(crate) cache: NodeCache,
}

impl Slot {
    pub(crate) fn new(node: ConceptNode) -> Self {
        Self {
            node,
            cache: NodeCache::default(),
        }
    }
}
