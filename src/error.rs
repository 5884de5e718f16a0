//! Error types for smallworld.

use thiserror::Error;

/// Errors surfaced by index construction, insertion, and search.
///
/// Every variant is raised before the failing call mutates any state visible
/// to other workers; a failed insert registers nothing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexError {
    /// Input vector length does not match the index dimension.
    #[error("dimension mismatch: index expects {expected}, vector has {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Invalid construction parameter.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The node arena is full; no further points can be inserted.
    #[error("node store capacity exhausted ({0} nodes)")]
    CapacityExhausted(usize),
}

/// Result type alias for smallworld operations.
pub type Result<T> = std::result::Result<T, IndexError>;
