//! Consensus Environment Layer
//!
//! This crate provides the topology side of the consensus simulator: the
//! "who can observe whom" relation that every simulation run is built on.
//!
//! # Core Concept: Topology as a Black Box
//!
//! The simulation engine never constructs graphs itself. It asks a
//! [`TopologyProvider`] for a [`Network`] given a [`TopologySpec`], an agent
//! count and a seed:
//! - **Standard**: [`GraphTopology`] builds complete, ring, star and
//!   Watts–Strogatz small-world graphs
//! - **Custom**: [`Network::from_adjacency`] wraps any externally produced
//!   adjacency relation
//!
//! Every node id in `[0, n)` is present in the resulting network, even when
//! its neighbor list is empty.
//!
//! # Example
//!
//! ```ignore
//! use consensus_env::{GraphTopology, TopologyProvider, TopologySpec, TopologyKind};
//!
//! let spec = TopologySpec::new(TopologyKind::Ring);
//! let network = GraphTopology.build(&spec, 5, 42)?;
//! assert_eq!(network.neighbors(0), &[1, 4]);
//! ```

mod error;
mod graph_impl;
mod network;
mod types;

pub use error::TopologyError;
pub use graph_impl::GraphTopology;
pub use network::{Network, TopologyProvider};
pub use types::{NodeId, TopologyKind, TopologySpec};
