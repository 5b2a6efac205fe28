//! Error types for index construction, configuration and refinement.

use concept_graph_core::ConceptError;
use thiserror::Error;

/// Result type alias for refinement operations.
pub type RefineResult<T> = Result<T, RefineError>;

/// Errors that can occur while building an index or refining a concept.
#[derive(Debug, Error)]
pub enum RefineError {
    /// The concept graph rejected an operation.
    #[error("concept graph error: {0}")]
    Concept(#[from] ConceptError),

    /// A configuration file could not be parsed.
    #[error("invalid config TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// A configuration could not be rendered as TOML.
    #[error("config serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// JSON (oracle snapshots, run stats) could not be read or written.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error (file operations).
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// A configuration value is out of range.
    #[error("invalid config: {field}: {message}")]
    InvalidConfig {
        field: &'static str,
        message: String,
    },
}
