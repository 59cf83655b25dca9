//! Network representation and the topology provider abstraction.

use crate::error::TopologyError;
use crate::types::{NodeId, TopologySpec};
use std::collections::{BTreeMap, BTreeSet};

/// Abstraction for anything that can produce a [`Network`].
///
/// # Implementations
///
/// - **Standard**: [`crate::GraphTopology`] - complete / ring / star / small-world
/// - **Tests**: fixed adjacency closures wrapped in a small struct
///
/// # Contract
///
/// The returned network must contain every id in `[0, agent_count)`, even
/// when a node has no neighbors. Randomised generators must derive all of
/// their entropy from `seed`.
pub trait TopologyProvider {
    /// Builds the network for `agent_count` nodes.
    ///
    /// # Returns
    /// * `Ok(Network)` - Adjacency relation covering `[0, agent_count)`
    /// * `Err(TopologyError)` - Degenerate or invalid request
    fn build(
        &self,
        spec: &TopologySpec,
        agent_count: usize,
        seed: u64,
    ) -> Result<Network, TopologyError>;
}

/// Immutable adjacency relation for one simulation run.
///
/// Neighbor lists are sorted, duplicate-free and never contain the node
/// itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Network {
    adjacency: Vec<Vec<NodeId>>,
}

impl Network {
    /// Builds a network from undirected adjacency sets (already validated).
    pub(crate) fn from_sets(sets: Vec<BTreeSet<NodeId>>) -> Self {
        Self {
            adjacency: sets.into_iter().map(|s| s.into_iter().collect()).collect(),
        }
    }

    /// Builds a network from an arbitrary adjacency mapping.
    ///
    /// Nodes missing from `adjacency` become isolated. Edges are taken as
    /// given, so a directed relation stays directed.
    pub fn from_adjacency(
        node_count: usize,
        adjacency: &BTreeMap<NodeId, Vec<NodeId>>,
    ) -> Result<Self, TopologyError> {
        let mut sets = vec![BTreeSet::new(); node_count];

        for (&node, neighbors) in adjacency {
            if node >= node_count {
                return Err(TopologyError::invalid_adjacency(format!(
                    "node {} outside [0, {})",
                    node, node_count
                )));
            }
            for &neighbor in neighbors {
                if neighbor >= node_count {
                    return Err(TopologyError::invalid_adjacency(format!(
                        "neighbor {} of node {} outside [0, {})",
                        neighbor, node, node_count
                    )));
                }
                if neighbor == node {
                    return Err(TopologyError::invalid_adjacency(format!(
                        "self-loop on node {}",
                        node
                    )));
                }
                sets[node].insert(neighbor);
            }
        }

        Ok(Self::from_sets(sets))
    }

    /// Creates a network of `node_count` nodes with no edges.
    pub fn isolated(node_count: usize) -> Self {
        Self {
            adjacency: vec![Vec::new(); node_count],
        }
    }

    /// Returns the number of nodes.
    pub fn len(&self) -> usize {
        self.adjacency.len()
    }

    /// Returns true if the network has no nodes.
    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }

    /// Iterates over all node ids in ascending order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> {
        0..self.adjacency.len()
    }

    /// Returns the neighbors of a node (empty for unknown ids).
    pub fn neighbors(&self, node: NodeId) -> &[NodeId] {
        self.adjacency.get(node).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Returns the out-degree of a node.
    pub fn degree(&self, node: NodeId) -> usize {
        self.neighbors(node).len()
    }

    /// Returns the number of distinct undirected edges.
    pub fn edge_count(&self) -> usize {
        let mut edges = BTreeSet::new();
        for (node, neighbors) in self.adjacency.iter().enumerate() {
            for &neighbor in neighbors {
                edges.insert((node.min(neighbor), node.max(neighbor)));
            }
        }
        edges.len()
    }

    /// Returns the ids of nodes without neighbors.
    pub fn isolated_nodes(&self) -> Vec<NodeId> {
        self.node_ids().filter(|&id| self.degree(id) == 0).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_adjacency_fills_missing_nodes() {
        let mut map = BTreeMap::new();
        map.insert(0, vec![2, 1, 1]);
        map.insert(1, vec![0]);

        let network = Network::from_adjacency(4, &map).unwrap();

        assert_eq!(network.len(), 4);
        assert_eq!(network.neighbors(0), &[1, 2]);
        // Directed edge stays directed
        assert!(network.neighbors(2).is_empty());
        assert_eq!(network.isolated_nodes(), vec![2, 3]);
        assert_eq!(network.edge_count(), 2);
    }

    #[test]
    fn test_from_adjacency_rejects_self_loop() {
        let mut map = BTreeMap::new();
        map.insert(1, vec![1]);

        let err = Network::from_adjacency(3, &map).unwrap_err();
        assert!(matches!(err, TopologyError::InvalidAdjacency(_)));
    }

    #[test]
    fn test_from_adjacency_rejects_out_of_range() {
        let mut map = BTreeMap::new();
        map.insert(0, vec![5]);
        assert!(Network::from_adjacency(3, &map).is_err());

        let mut map = BTreeMap::new();
        map.insert(7, vec![0]);
        assert!(Network::from_adjacency(3, &map).is_err());
    }

    #[test]
    fn test_isolated_network() {
        let network = Network::isolated(3);
        assert_eq!(network.len(), 3);
        assert_eq!(network.edge_count(), 0);
        assert_eq!(network.neighbors(10), &[] as &[NodeId]);
    }
}
