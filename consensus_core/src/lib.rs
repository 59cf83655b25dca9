//! Consensus Core - Agents and Local Update Rules
//!
//! This library holds the pieces of a consensus simulation that are
//! independent of how rounds are scheduled:
//! 1. **Strategies**: a closed set of validated update rules mapping
//!    `(own state, neighbor states)` to a next state
//! 2. **Agents**: scalar state holders that separate *compute* from *commit*
//!    so a round can be applied simultaneously
//! 3. **Statistics**: dispersion (population standard deviation) and friends

pub mod agent;
pub mod error;
pub mod stats;
pub mod strategy;

// Re-export key types for convenience
pub use agent::Agent;
pub use consensus_env::NodeId;
pub use error::ConsensusError;
pub use strategy::{Strategy, StrategyKind, StrategyParams};
