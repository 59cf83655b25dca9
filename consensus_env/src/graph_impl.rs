//! Standard topology generator.

use crate::error::TopologyError;
use crate::network::{Network, TopologyProvider};
use crate::types::{NodeId, TopologyKind, TopologySpec};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeSet;

/// Builds the four standard undirected topologies.
///
/// Deterministic: the same `(spec, agent_count, seed)` always yields the same
/// network. Only `SmallWorld` consumes randomness.
#[derive(Debug, Clone, Copy, Default)]
pub struct GraphTopology;

impl TopologyProvider for GraphTopology {
    fn build(
        &self,
        spec: &TopologySpec,
        agent_count: usize,
        seed: u64,
    ) -> Result<Network, TopologyError> {
        if agent_count == 0 {
            return Err(TopologyError::degenerate("agent count must be positive"));
        }

        let sets = match spec.kind {
            TopologyKind::Complete => complete(agent_count),
            TopologyKind::Ring => ring(agent_count),
            TopologyKind::Star => star(agent_count),
            TopologyKind::SmallWorld => small_world(
                agent_count,
                spec.neighbor_degree,
                spec.rewire_probability,
                seed,
            )?,
        };

        Ok(Network::from_sets(sets))
    }
}

fn connect(sets: &mut [BTreeSet<NodeId>], a: NodeId, b: NodeId) {
    if a != b {
        sets[a].insert(b);
        sets[b].insert(a);
    }
}

fn complete(n: usize) -> Vec<BTreeSet<NodeId>> {
    let mut sets = vec![BTreeSet::new(); n];
    for a in 0..n {
        for b in (a + 1)..n {
            connect(&mut sets, a, b);
        }
    }
    sets
}

fn ring(n: usize) -> Vec<BTreeSet<NodeId>> {
    let mut sets = vec![BTreeSet::new(); n];
    for a in 0..n {
        connect(&mut sets, a, (a + 1) % n);
    }
    sets
}

/// Hub is the last node; leaves are `0..n-1`.
fn star(n: usize) -> Vec<BTreeSet<NodeId>> {
    let mut sets = vec![BTreeSet::new(); n];
    let hub = n - 1;
    for leaf in 0..hub {
        connect(&mut sets, leaf, hub);
    }
    sets
}

/// Watts–Strogatz: ring lattice of degree `k`, each lattice edge `(u, u+j)`
/// rewired to a uniformly chosen non-neighbor with probability `p`.
fn small_world(
    n: usize,
    k: usize,
    p: f64,
    seed: u64,
) -> Result<Vec<BTreeSet<NodeId>>, TopologyError> {
    if k == 0 || k % 2 != 0 {
        return Err(TopologyError::degenerate(format!(
            "small-world neighbor degree must be even and positive, got {}",
            k
        )));
    }
    if k >= n {
        return Err(TopologyError::degenerate(format!(
            "small-world neighbor degree {} must be less than agent count {}",
            k, n
        )));
    }
    if !p.is_finite() || !(0.0..=1.0).contains(&p) {
        return Err(TopologyError::invalid_parameter(format!(
            "rewire probability must be in [0, 1], got {}",
            p
        )));
    }

    let mut sets = vec![BTreeSet::new(); n];
    for u in 0..n {
        for j in 1..=k / 2 {
            connect(&mut sets, u, (u + j) % n);
        }
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    for j in 1..=k / 2 {
        for u in 0..n {
            let v = (u + j) % n;
            if rng.gen::<f64>() >= p {
                continue;
            }

            let candidates: Vec<NodeId> = (0..n)
                .filter(|&w| w != u && !sets[u].contains(&w))
                .collect();
            if candidates.is_empty() {
                continue;
            }

            let w = candidates[rng.gen_range(0..candidates.len())];
            sets[u].remove(&v);
            sets[v].remove(&u);
            connect(&mut sets, u, w);
        }
    }

    Ok(sets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn build(spec: TopologySpec, n: usize) -> Network {
        GraphTopology.build(&spec, n, 42).unwrap()
    }

    #[test]
    fn test_complete_topology() {
        let network = build(TopologySpec::new(TopologyKind::Complete), 4);

        assert_eq!(network.neighbors(0), &[1, 2, 3]);
        assert_eq!(network.neighbors(3), &[0, 1, 2]);
        assert_eq!(network.edge_count(), 6);
    }

    #[test]
    fn test_ring_topology() {
        let network = build(TopologySpec::new(TopologyKind::Ring), 5);

        assert_eq!(network.neighbors(0), &[1, 4]);
        assert_eq!(network.neighbors(2), &[1, 3]);
        assert_eq!(network.edge_count(), 5);
    }

    #[test]
    fn test_small_rings() {
        let single = build(TopologySpec::new(TopologyKind::Ring), 1);
        assert_eq!(single.isolated_nodes(), vec![0]);

        let pair = build(TopologySpec::new(TopologyKind::Ring), 2);
        assert_eq!(pair.neighbors(0), &[1]);
        assert_eq!(pair.neighbors(1), &[0]);
    }

    #[test]
    fn test_star_topology() {
        let network = build(TopologySpec::new(TopologyKind::Star), 5);

        // Hub is the last node
        assert_eq!(network.neighbors(4), &[0, 1, 2, 3]);
        for leaf in 0..4 {
            assert_eq!(network.neighbors(leaf), &[4]);
        }
    }

    #[test]
    fn test_small_world_without_rewiring_is_lattice() {
        let network = build(TopologySpec::small_world(4, 0.0), 10);

        assert_eq!(network.neighbors(0), &[1, 2, 8, 9]);
        assert_eq!(network.neighbors(5), &[3, 4, 6, 7]);
        assert_eq!(network.edge_count(), 20);
    }

    #[test]
    fn test_small_world_is_deterministic() {
        let spec = TopologySpec::small_world(4, 0.3);
        let a = GraphTopology.build(&spec, 30, 7).unwrap();
        let b = GraphTopology.build(&spec, 30, 7).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_small_world_degree_too_large() {
        let err = GraphTopology
            .build(&TopologySpec::small_world(6, 0.1), 6, 42)
            .unwrap_err();
        assert!(matches!(err, TopologyError::Degenerate(_)));
    }

    #[test]
    fn test_small_world_odd_degree() {
        let err = GraphTopology
            .build(&TopologySpec::small_world(3, 0.1), 10, 42)
            .unwrap_err();
        assert!(matches!(err, TopologyError::Degenerate(_)));
    }

    #[test]
    fn test_small_world_bad_probability() {
        let err = GraphTopology
            .build(&TopologySpec::small_world(4, 1.5), 10, 42)
            .unwrap_err();
        assert!(matches!(err, TopologyError::InvalidParameter(_)));
    }

    #[test]
    fn test_zero_agents() {
        let err = GraphTopology
            .build(&TopologySpec::new(TopologyKind::Ring), 0, 42)
            .unwrap_err();
        assert!(matches!(err, TopologyError::Degenerate(_)));
    }

    proptest! {
        #[test]
        fn prop_small_world_invariants(
            n in 5usize..40,
            half_k in 1usize..3,
            p in 0.0f64..=1.0,
            seed in any::<u64>(),
        ) {
            let k = half_k * 2;
            prop_assume!(k < n);

            let network = GraphTopology
                .build(&TopologySpec::small_world(k, p), n, seed)
                .unwrap();

            prop_assert_eq!(network.len(), n);
            // Rewiring moves edges, never creates or destroys them
            prop_assert_eq!(network.edge_count(), n * k / 2);

            for u in network.node_ids() {
                prop_assert!(!network.neighbors(u).contains(&u));
                for &v in network.neighbors(u) {
                    prop_assert!(network.neighbors(v).contains(&u));
                }
            }
        }
    }
}
