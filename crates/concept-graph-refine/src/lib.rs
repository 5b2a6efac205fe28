//! Downward refinement of concept graphs.
//!
//! Given a concept graph and a class hierarchy, the operator proposes every
//! one-step specialization that stays within a length and depth budget and
//! does not carry a label the hierarchy already shows to be redundant.
//!
//! ## Pipeline
//!
//! ```text
//! Oracle ──build──▶ HierarchyIndex ──┐
//!    │                               ├──▶ RefinementOperator::refine(graph, L, D)
//!    └──collect──▶ DataThresholds ───┘              │
//!                                                   ▼
//!                                      Vec<ConceptGraph> (deep clones)
//! ```
//!
//! - **Oracle**: answers hierarchy, property and instance questions
//!   ([`MemoryOracle`] is a serializable in-memory implementation)
//! - **HierarchyIndex**: the oracle's answers, precomputed once per signature
//! - **RefinementConfig**: which constructors the operator may introduce
//! - **redundancy**: predicates that prune candidates before they are built

mod config;
mod error;
mod index;
mod operator;
mod oracle;
pub mod redundancy;
mod thresholds;

pub use config::RefinementConfig;
pub use error::{RefineError, RefineResult};
pub use index::HierarchyIndex;
pub use operator::{RefinementOperator, RefinementRun, RefinementStats};
pub use oracle::{MemoryOracle, Oracle, Signature};
pub use redundancy::Redundancy;
pub use thresholds::DataThresholds;
