//! Concept graphs for description-logic class expressions.
//!
//! A class expression such as `Person ⊓ ∃hasChild.(Doctor ⊔ Nurse)` is held as
//! a rooted graph: every node carries label sets, every edge is a typed
//! restriction pointing at the node describing its filler.
//!
//! ## Core Concepts
//!
//! - **ConceptExpr**: the plain expression tree (⊤, ⊥, atoms, ¬, ⊓, ⊔, ∃, ∀,
//!   data comparisons)
//! - **ConceptNode**: a node's labels, in full form (conjuncts and disjuncts),
//!   lightweight form (conjuncts only) or as a literal/numeric terminal
//! - **Edge**: existential, universal or data-comparison restriction
//! - **ConceptGraph**: the arena holding one rooted concept
//! - **NodeRef**: borrowed view of one node with its metrics and ordering
//!
//! ## The Structural Order
//!
//! ```text
//! A ⊑ B  iff  labels(A) narrower than labels(B)
//!        and  ∀ e2 ∈ out(B). ∃ e1 ∈ out(A).
//!                 kind(e1) = kind(e2), label(e1) = label(e2),
//!                 target(e1) ⊑ target(e2)
//! ```
//!
//! Equality is mutual subsumption, with equal cached canonical expressions
//! as a shortcut.

mod canonical;
mod error;
mod expr;
mod graph;
mod metrics;
mod node;
mod order;
mod primitives;

pub use error::{ConceptError, ConceptResult};
pub use expr::{Comparison, ConceptExpr};
pub use graph::{ConceptGraph, EdgeView, NodeRef};
pub use metrics::{DATA_EDGE_LENGTH, QUANTIFIER_LENGTH};
pub use node::{ConceptNode, Edge};
pub use order::{LabelOrder, SyntacticOrder};
pub use primitives::{DataProperty, Iri, Literal, Numeric, PropertyExpr};

// Handle types, so downstream crates need not depend on petgraph directly.
pub use ordered_float::OrderedFloat;
pub use petgraph::stable_graph::{EdgeIndex, NodeIndex};
