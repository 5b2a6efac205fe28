//! Class expressions in description-logic syntax.
//!
//! `ConceptExpr` is the flat, value-typed counterpart of a concept graph. It is
//! what the canonical fold produces and what labels inside a node are made of
//! (in practice labels are atomic classes or negated atomic classes).

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::primitives::{DataProperty, Iri, Literal, PropertyExpr};

/// Comparison applied by a data restriction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    /// `p = v`
    Equal,
    /// `p ≥ v`
    GreaterOrEqual,
    /// `p ≤ v`
    LessOrEqual,
}

impl Comparison {
    /// Symbol used when rendering.
    pub fn symbol(&self) -> &'static str {
        match self {
            Comparison::Equal => "=",
            Comparison::GreaterOrEqual => "≥",
            Comparison::LessOrEqual => "≤",
        }
    }
}

/// A description-logic class expression.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConceptExpr {
    /// The universal concept `⊤`.
    Top,
    /// The empty concept `⊥`.
    Bottom,
    /// A named class.
    Atomic(Iri),
    /// Complement `¬C`.
    Not(Box<ConceptExpr>),
    /// Conjunction of two or more operands.
    And(BTreeSet<ConceptExpr>),
    /// Disjunction of two or more operands.
    Or(BTreeSet<ConceptExpr>),
    /// Existential restriction `∃R.C`.
    Exists(PropertyExpr, Box<ConceptExpr>),
    /// Universal restriction `∀R.C`.
    ForAll(PropertyExpr, Box<ConceptExpr>),
    /// Data restriction `∃p.(op v)`.
    Data {
        property: DataProperty,
        comparison: Comparison,
        value: Literal,
    },
}

impl ConceptExpr {
    /// A named class.
    pub fn atomic(iri: impl Into<Iri>) -> Self {
        ConceptExpr::Atomic(iri.into())
    }

    /// Complement, collapsing double negation and the `⊤`/`⊥` pair.
    pub fn not(expr: ConceptExpr) -> Self {
        match expr {
            ConceptExpr::Top => ConceptExpr::Bottom,
            ConceptExpr::Bottom => ConceptExpr::Top,
            ConceptExpr::Not(inner) => *inner,
            other => ConceptExpr::Not(Box::new(other)),
        }
    }

    /// Conjunction of the operands. Nested conjunctions are flattened and `⊤`
    /// operands dropped; zero operands give `⊤`, one gives the operand itself.
    pub fn and(operands: impl IntoIterator<Item = ConceptExpr>) -> Self {
        let mut set = BTreeSet::new();
        for op in operands {
            match op {
                ConceptExpr::Top => {}
                ConceptExpr::And(inner) => set.extend(inner),
                other => {
                    set.insert(other);
                }
            }
        }
        collapse(set, ConceptExpr::Top, ConceptExpr::And)
    }

    /// Disjunction of the operands. Nested disjunctions are flattened and `⊥`
    /// operands dropped; zero operands give `⊥`, one gives the operand itself.
    pub fn or(operands: impl IntoIterator<Item = ConceptExpr>) -> Self {
        let mut set = BTreeSet::new();
        for op in operands {
            match op {
                ConceptExpr::Bottom => {}
                ConceptExpr::Or(inner) => set.extend(inner),
                other => {
                    set.insert(other);
                }
            }
        }
        collapse(set, ConceptExpr::Bottom, ConceptExpr::Or)
    }

    /// `∃R.C`
    pub fn exists(property: PropertyExpr, filler: ConceptExpr) -> Self {
        ConceptExpr::Exists(property, Box::new(filler))
    }

    /// `∀R.C`
    pub fn for_all(property: PropertyExpr, filler: ConceptExpr) -> Self {
        ConceptExpr::ForAll(property, Box::new(filler))
    }

    /// Whether this is `⊤`.
    pub fn is_top(&self) -> bool {
        matches!(self, ConceptExpr::Top)
    }

    /// Whether this is `⊥`.
    pub fn is_bottom(&self) -> bool {
        matches!(self, ConceptExpr::Bottom)
    }

    /// Whether this is a complement.
    pub fn is_negation(&self) -> bool {
        matches!(self, ConceptExpr::Not(_))
    }

    /// Named class or `⊤`/`⊥`, optionally negated.
    pub fn is_atomic_or_negated_atomic(&self) -> bool {
        match self {
            ConceptExpr::Top | ConceptExpr::Bottom | ConceptExpr::Atomic(_) => true,
            ConceptExpr::Not(inner) => matches!(**inner, ConceptExpr::Atomic(_)),
            _ => false,
        }
    }

    /// Syntactic length: one per atom, connective, quantifier, property and
    /// comparison symbol.
    pub fn length(&self) -> usize {
        match self {
            ConceptExpr::Top | ConceptExpr::Bottom | ConceptExpr::Atomic(_) => 1,
            ConceptExpr::Not(inner) => 1 + inner.length(),
            ConceptExpr::And(ops) | ConceptExpr::Or(ops) => {
                ops.iter().map(ConceptExpr::length).sum::<usize>() + ops.len().saturating_sub(1)
            }
            ConceptExpr::Exists(_, filler) | ConceptExpr::ForAll(_, filler) => 2 + filler.length(),
            ConceptExpr::Data { .. } => 3,
        }
    }
}

fn collapse(
    mut set: BTreeSet<ConceptExpr>,
    empty: ConceptExpr,
    wrap: fn(BTreeSet<ConceptExpr>) -> ConceptExpr,
) -> ConceptExpr {
    match set.len() {
        0 => empty,
        1 => set.pop_first().unwrap_or(empty),
        _ => wrap(set),
    }
}

impl From<Iri> for ConceptExpr {
    fn from(iri: Iri) -> Self {
        ConceptExpr::Atomic(iri)
    }
}

impl fmt::Display for ConceptExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConceptExpr::Top => f.write_str("⊤"),
            ConceptExpr::Bottom => f.write_str("⊥"),
            ConceptExpr::Atomic(iri) => write!(f, "{}", iri),
            ConceptExpr::Not(inner) => write!(f, "¬{}", inner),
            ConceptExpr::And(ops) => write_joined(f, ops, " ⊓ "),
            ConceptExpr::Or(ops) => write_joined(f, ops, " ⊔ "),
            ConceptExpr::Exists(p, filler) => write!(f, "∃{}.{}", p, filler),
            ConceptExpr::ForAll(p, filler) => write!(f, "∀{}.{}", p, filler),
            ConceptExpr::Data {
                property,
                comparison,
                value,
            } => write!(f, "∃{}.{} {}", property, comparison.symbol(), value),
        }
    }
}

fn write_joined(
    f: &mut fmt::Formatter<'_>,
    ops: &BTreeSet<ConceptExpr>,
    sep: &str,
) -> fmt::Result {
    f.write_str("(")?;
    for (i, op) in ops.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{}", op)?;
    }
    f.write_str(")")
}
