//! Common types for the topology layer.

use crate::error::TopologyError;
use serde::{Deserialize, Serialize};

/// Identifier of an agent / graph node. Always in `[0, n)`.
pub type NodeId = usize;

/// The supported topology families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopologyKind {
    /// Every agent observes every other agent
    Complete,

    /// Agents on a cycle, each observing its two ring neighbors
    Ring,

    /// One hub (the highest id) connected to every leaf
    Star,

    /// Watts–Strogatz ring lattice with random rewiring
    SmallWorld,
}

impl TopologyKind {
    /// Returns a list of all kinds.
    pub fn all() -> Vec<TopologyKind> {
        vec![
            TopologyKind::Complete,
            TopologyKind::Ring,
            TopologyKind::Star,
            TopologyKind::SmallWorld,
        ]
    }

    /// Returns the canonical name.
    pub fn name(&self) -> &'static str {
        match self {
            TopologyKind::Complete => "complete",
            TopologyKind::Ring => "ring",
            TopologyKind::Star => "star",
            TopologyKind::SmallWorld => "small_world",
        }
    }
}

impl std::fmt::Display for TopologyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for TopologyKind {
    type Err = TopologyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "complete" | "full" => Ok(TopologyKind::Complete),
            "ring" | "cycle" => Ok(TopologyKind::Ring),
            "star" => Ok(TopologyKind::Star),
            "small_world" | "smallworld" | "small-world" => Ok(TopologyKind::SmallWorld),
            _ => Err(TopologyError::UnknownKind(s.to_string())),
        }
    }
}

/// A topology request: the kind plus kind-specific parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopologySpec {
    /// Topology family
    pub kind: TopologyKind,

    /// Lattice degree `k` for small-world graphs (even, < agent count)
    pub neighbor_degree: usize,

    /// Rewiring probability `p` for small-world graphs, in `[0, 1]`
    pub rewire_probability: f64,
}

impl TopologySpec {
    /// Creates a topology of the given kind with default small-world parameters.
    pub fn new(kind: TopologyKind) -> Self {
        Self {
            kind,
            ..Default::default()
        }
    }

    /// Creates a small-world spec.
    pub fn small_world(neighbor_degree: usize, rewire_probability: f64) -> Self {
        Self {
            kind: TopologyKind::SmallWorld,
            neighbor_degree,
            rewire_probability,
        }
    }
}

impl Default for TopologySpec {
    fn default() -> Self {
        Self {
            kind: TopologyKind::Complete,
            neighbor_degree: 4,
            rewire_probability: 0.1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parsing() {
        assert_eq!("ring".parse::<TopologyKind>(), Ok(TopologyKind::Ring));
        assert_eq!("Small_World".parse::<TopologyKind>(), Ok(TopologyKind::SmallWorld));
        assert_eq!("smallworld".parse::<TopologyKind>(), Ok(TopologyKind::SmallWorld));

        for kind in TopologyKind::all() {
            assert_eq!(kind.name().parse::<TopologyKind>(), Ok(kind));
        }
    }

    #[test]
    fn test_unknown_kind() {
        let err = "hypercube".parse::<TopologyKind>().unwrap_err();
        assert_eq!(err, TopologyError::UnknownKind("hypercube".to_string()));
    }
}
