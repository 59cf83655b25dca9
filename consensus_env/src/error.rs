//! Error types for the topology layer.

use thiserror::Error;

/// Errors surfaced by topology construction.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TopologyError {
    /// The requested graph cannot exist (e.g. small-world degree >= agent count)
    #[error("Degenerate topology: {0}")]
    Degenerate(String),

    /// A generator parameter is outside its domain
    #[error("Invalid topology parameter: {0}")]
    InvalidParameter(String),

    /// A custom adjacency relation violates the network invariants
    #[error("Invalid adjacency: {0}")]
    InvalidAdjacency(String),

    /// Unrecognised topology identifier
    #[error("Unknown topology kind: {0}")]
    UnknownKind(String),
}

impl TopologyError {
    /// Creates a degenerate-topology error.
    pub fn degenerate(msg: impl Into<String>) -> Self {
        Self::Degenerate(msg.into())
    }

    /// Creates an invalid-parameter error.
    pub fn invalid_parameter(msg: impl Into<String>) -> Self {
        Self::InvalidParameter(msg.into())
    }

    /// Creates an invalid-adjacency error.
    pub fn invalid_adjacency(msg: impl Into<String>) -> Self {
        Self::InvalidAdjacency(msg.into())
    }
}
