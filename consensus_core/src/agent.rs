//! Agent - a scalar state holder bound to a strategy.
//!
//! Agents split a round into two calls so that a whole population can move
//! simultaneously:
//! - [`Agent::compute_next_state`] evaluates the strategy and parks the
//!   result as *pending* without touching the visible state
//! - [`Agent::commit_update`] makes the pending value the new state
//!
//! Calling either step twice in a row is a [`ConsensusError::ProtocolViolation`].

use crate::error::ConsensusError;
use crate::strategy::Strategy;
use consensus_env::NodeId;

/// A single networked agent.
#[derive(Debug, Clone, PartialEq)]
pub struct Agent {
    /// Agent id, equal to its node id in the network
    id: NodeId,

    /// Current (committed) state
    state: f64,

    /// Result of the current round's compute phase, if any
    pending: Option<f64>,

    /// Sorted neighbor ids; never contains `id`
    neighbors: Vec<NodeId>,

    /// Bound update rule
    strategy: Strategy,
}

impl Agent {
    /// Creates a new agent.
    ///
    /// Fails with `InvalidParameter` if `neighbors` contains `id`.
    pub fn new(
        id: NodeId,
        initial_state: f64,
        neighbors: Vec<NodeId>,
        strategy: Strategy,
    ) -> Result<Self, ConsensusError> {
        let mut agent = Self {
            id,
            state: initial_state,
            pending: None,
            neighbors: Vec::new(),
            strategy,
        };
        agent.set_neighbors(neighbors)?;
        Ok(agent)
    }

    /// Returns the agent id.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Returns the committed state.
    pub fn state(&self) -> f64 {
        self.state
    }

    /// Returns the pending next state, if a compute phase is in progress.
    pub fn pending(&self) -> Option<f64> {
        self.pending
    }

    /// Returns the neighbor ids.
    pub fn neighbors(&self) -> &[NodeId] {
        &self.neighbors
    }

    /// Returns true if the agent has no neighbors (its state is frozen).
    pub fn is_isolated(&self) -> bool {
        self.neighbors.is_empty()
    }

    /// Returns the bound strategy.
    pub fn strategy(&self) -> &Strategy {
        &self.strategy
    }

    /// Replaces the neighbor set (dynamic rewiring).
    pub fn set_neighbors(&mut self, mut neighbors: Vec<NodeId>) -> Result<(), ConsensusError> {
        if neighbors.contains(&self.id) {
            return Err(ConsensusError::invalid(format!(
                "agent {} cannot be its own neighbor",
                self.id
            )));
        }
        neighbors.sort_unstable();
        neighbors.dedup();
        self.neighbors = neighbors;
        Ok(())
    }

    /// Swaps the update rule. Takes effect from the next compute phase.
    pub fn set_strategy(&mut self, strategy: Strategy) {
        self.strategy = strategy;
    }

    /// Compute phase: evaluates the strategy against `neighbor_states` and
    /// stores the result as pending. The committed state is untouched.
    pub fn compute_next_state(&mut self, neighbor_states: &[f64]) -> Result<f64, ConsensusError> {
        if self.pending.is_some() {
            return Err(ConsensusError::protocol(format!(
                "agent {} computed twice without a commit",
                self.id
            )));
        }
        let next = self.strategy.compute_next_state(self.state, neighbor_states);
        self.pending = Some(next);
        Ok(next)
    }

    /// Commit phase: moves the pending value into the state.
    pub fn commit_update(&mut self) -> Result<f64, ConsensusError> {
        let next = self.pending.take().ok_or_else(|| {
            ConsensusError::protocol(format!(
                "agent {} committed with no pending computation",
                self.id
            ))
        })?;
        self.state = next;
        Ok(next)
    }

    /// Overwrites the committed state outside the round protocol.
    ///
    /// Calibration hook for forcing identical starting conditions; refused
    /// while a computation is pending.
    pub fn override_state(&mut self, state: f64) -> Result<(), ConsensusError> {
        if self.pending.is_some() {
            return Err(ConsensusError::protocol(format!(
                "agent {} state overridden mid-round",
                self.id
            )));
        }
        self.state = state;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_does_not_touch_state() {
        let mut agent = Agent::new(0, 0.0, vec![1, 2], Strategy::DeGroot).unwrap();

        let next = agent.compute_next_state(&[5.0, 10.0]).unwrap();

        assert_eq!(next, 5.0);
        assert_eq!(agent.state(), 0.0);
        assert_eq!(agent.pending(), Some(5.0));

        assert_eq!(agent.commit_update().unwrap(), 5.0);
        assert_eq!(agent.state(), 5.0);
        assert_eq!(agent.pending(), None);
    }

    #[test]
    fn test_double_compute_is_protocol_violation() {
        let mut agent = Agent::new(0, 1.0, vec![1], Strategy::DeGroot).unwrap();
        agent.compute_next_state(&[3.0]).unwrap();

        let err = agent.compute_next_state(&[3.0]).unwrap_err();
        assert!(matches!(err, ConsensusError::ProtocolViolation(_)));
        // The first computation survives
        assert_eq!(agent.pending(), Some(2.0));
    }

    #[test]
    fn test_commit_without_compute_is_protocol_violation() {
        let mut agent = Agent::new(3, 1.0, vec![], Strategy::DeGroot).unwrap();

        let err = agent.commit_update().unwrap_err();
        assert!(matches!(err, ConsensusError::ProtocolViolation(_)));
        assert_eq!(agent.state(), 1.0);
    }

    #[test]
    fn test_self_loop_rejected() {
        let err = Agent::new(2, 0.0, vec![1, 2], Strategy::DeGroot).unwrap_err();
        assert!(matches!(err, ConsensusError::InvalidParameter(_)));

        let mut agent = Agent::new(2, 0.0, vec![1], Strategy::DeGroot).unwrap();
        assert!(agent.set_neighbors(vec![2]).is_err());
        assert_eq!(agent.neighbors(), &[1]);
    }

    #[test]
    fn test_set_neighbors_sorts_and_dedups() {
        let mut agent = Agent::new(0, 0.0, vec![], Strategy::DeGroot).unwrap();
        assert!(agent.is_isolated());

        agent.set_neighbors(vec![4, 1, 4, 2]).unwrap();
        assert_eq!(agent.neighbors(), &[1, 2, 4]);
        assert!(!agent.is_isolated());
    }

    #[test]
    fn test_strategy_swap_between_rounds() {
        let mut agent = Agent::new(0, 0.0, vec![1], Strategy::DeGroot).unwrap();
        agent.compute_next_state(&[10.0]).unwrap();
        agent.commit_update().unwrap();
        assert_eq!(agent.state(), 5.0);

        agent.set_strategy(Strategy::stubborn(1.0).unwrap());
        agent.compute_next_state(&[10.0]).unwrap();
        agent.commit_update().unwrap();
        assert_eq!(agent.state(), 5.0);
    }

    #[test]
    fn test_isolated_agent_is_frozen() {
        let mut agent = Agent::new(0, 4.5, vec![], Strategy::susceptible(3.0).unwrap()).unwrap();
        for _ in 0..10 {
            agent.compute_next_state(&[]).unwrap();
            agent.commit_update().unwrap();
        }
        assert_eq!(agent.state(), 4.5);
    }

    #[test]
    fn test_override_state_refused_mid_round() {
        let mut agent = Agent::new(0, 0.0, vec![1], Strategy::DeGroot).unwrap();
        agent.override_state(2.0).unwrap();
        assert_eq!(agent.state(), 2.0);

        agent.compute_next_state(&[4.0]).unwrap();
        assert!(agent.override_state(9.0).is_err());
    }
}
