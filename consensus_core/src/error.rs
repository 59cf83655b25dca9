//! Error taxonomy shared by the core and the simulation engine.

use consensus_env::TopologyError;
use thiserror::Error;

/// Errors raised while configuring or driving a consensus simulation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConsensusError {
    /// A parameter is outside its documented domain. Raised at construction,
    /// never mid-run.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Unrecognised strategy or topology identifier
    #[error("Unknown kind: {0}")]
    UnknownKind(String),

    /// The compute/commit round protocol was broken by the caller
    #[error("Protocol violation: {0}")]
    ProtocolViolation(String),

    /// Topology provider failure, propagated unchanged
    #[error(transparent)]
    Topology(TopologyError),
}

impl ConsensusError {
    /// Creates an invalid-parameter error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidParameter(msg.into())
    }

    /// Creates a protocol-violation error.
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::ProtocolViolation(msg.into())
    }
}

impl From<TopologyError> for ConsensusError {
    fn from(err: TopologyError) -> Self {
        match err {
            TopologyError::UnknownKind(kind) => Self::UnknownKind(kind),
            other => Self::Topology(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_topology_maps_to_unknown_kind() {
        let err: ConsensusError = TopologyError::UnknownKind("torus".into()).into();
        assert_eq!(err, ConsensusError::UnknownKind("torus".into()));
    }

    #[test]
    fn test_degenerate_topology_propagates_unchanged() {
        let source = TopologyError::degenerate("k >= n");
        let err: ConsensusError = source.clone().into();
        assert_eq!(err, ConsensusError::Topology(source));
        assert_eq!(err.to_string(), "Degenerate topology: k >= n");
    }
}
