//! Error types for the concept graph model.

use petgraph::stable_graph::{EdgeIndex, NodeIndex};
use thiserror::Error;

/// Result type alias for concept graph operations.
pub type ConceptResult<T> = Result<T, ConceptError>;

/// Errors raised by the concept graph model.
///
/// All of these indicate a programming error in the caller (a stale handle,
/// a fold run in the wrong order, an edge attached to the wrong kind of
/// node); none of them is expected during a well-formed refinement.
#[derive(Debug, Error)]
pub enum ConceptError {
    /// A node handle does not belong to this graph.
    #[error("unknown node: {node:?}")]
    UnknownNode { node: NodeIndex },

    /// An edge handle does not belong to this graph.
    #[error("unknown edge: {edge:?}")]
    UnknownEdge { edge: EdgeIndex },

    /// A canonical fold reached a node whose child has not been folded yet.
    #[error("node {node:?} folded before its child {child:?} has a canonical expression")]
    MissingCanonical { node: NodeIndex, child: NodeIndex },

    /// An operation expected a different kind of node.
    #[error("node {node:?} is {found}, expected {expected}")]
    NodeKindMismatch {
        node: NodeIndex,
        expected: &'static str,
        found: &'static str,
    },

    /// The graph is not acyclic along its outgoing edges.
    #[error("cycle detected through node {node:?}")]
    Cycle { node: NodeIndex },
}
