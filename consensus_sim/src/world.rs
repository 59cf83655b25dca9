//! SimulationRun - the round engine.

use crate::config::SimConfig;
use crate::context::SimContext;
use crate::detector::{ConvergenceDetector, DetectorConfig, Outcome};
use crate::summary::ConvergenceSummary;

use consensus_core::{stats, Agent, ConsensusError, NodeId, Strategy};
use consensus_env::{GraphTopology, Network, TopologyProvider};
use nalgebra::DMatrix;
use rand_distr::{Distribution, Normal};
use tracing::{debug, info, warn};

/// One simulation run: a fixed network, its agents, and the state history.
///
/// History is append-only and exposed read-only; `state_history()[0]` is the
/// initial draw and `state_history()[t]` the snapshot after round `t`.
pub struct SimulationRun {
    /// Configuration
    config: SimConfig,

    /// Seeded random streams
    context: SimContext,

    /// Immutable adjacency for this run
    network: Network,

    /// Agents indexed by id
    agents: Vec<Agent>,

    /// Global state vector per round, starting with the initial draw
    state_history: Vec<Vec<f64>>,

    /// Dispersion of each history entry
    dispersion_history: Vec<f64>,

    /// Convergence / oscillation windows
    detector: ConvergenceDetector,

    /// Communication noise, present only when `noise_std > 0`
    noise: Option<Normal<f64>>,

    /// Rounds executed so far
    rounds_completed: usize,
}

impl SimulationRun {
    /// Creates a run using the standard topology generator.
    pub fn new(config: SimConfig) -> Result<Self, ConsensusError> {
        Self::with_provider(config, &GraphTopology)
    }

    /// Creates a run with a custom topology provider.
    pub fn with_provider<P: TopologyProvider>(
        config: SimConfig,
        provider: &P,
    ) -> Result<Self, ConsensusError> {
        config.validate()?;
        let strategy = config.strategy.build()?;
        let context = SimContext::new(config.seed);

        let network = provider.build(&config.topology, config.agent_count, context.topology_seed())?;
        if network.len() != config.agent_count {
            return Err(ConsensusError::Topology(consensus_env::TopologyError::invalid_adjacency(
                format!(
                    "provider returned {} nodes for {} agents",
                    network.len(),
                    config.agent_count
                ),
            )));
        }

        Self::assemble(config, context, network, strategy)
    }

    /// Creates a run over a prebuilt network.
    pub fn with_network(config: SimConfig, network: Network) -> Result<Self, ConsensusError> {
        config.validate()?;
        let strategy = config.strategy.build()?;
        if network.len() != config.agent_count {
            return Err(ConsensusError::invalid(format!(
                "network has {} nodes but agent_count is {}",
                network.len(),
                config.agent_count
            )));
        }
        let context = SimContext::new(config.seed);

        Self::assemble(config, context, network, strategy)
    }

    fn assemble(
        config: SimConfig,
        mut context: SimContext,
        network: Network,
        strategy: Strategy,
    ) -> Result<Self, ConsensusError> {
        let initial = context.draw_initial_states(config.agent_count, config.initial_state_range);

        let agents = network
            .node_ids()
            .map(|id| Agent::new(id, initial[id], network.neighbors(id).to_vec(), strategy))
            .collect::<Result<Vec<_>, _>>()?;

        let isolated = network.isolated_nodes();
        if !isolated.is_empty() {
            warn!(
                "{} agent(s) without neighbors keep their initial state: {:?}",
                isolated.len(),
                isolated
            );
        }

        let noise = if config.noise_std > 0.0 {
            Some(Normal::new(0.0, config.noise_std).map_err(|e| {
                ConsensusError::invalid(format!("noise_std {}: {}", config.noise_std, e))
            })?)
        } else {
            None
        };

        info!(
            "Simulation ready: {} agents, topology={}, edges={}, strategy={}, seed={}",
            config.agent_count,
            config.topology.kind,
            network.edge_count(),
            strategy,
            config.seed
        );

        let detector = ConvergenceDetector::new(DetectorConfig::new(config.tolerance));
        let initial_dispersion = stats::dispersion(&initial);

        Ok(Self {
            config,
            context,
            network,
            agents,
            state_history: vec![initial],
            dispersion_history: vec![initial_dispersion],
            detector,
            noise,
            rounds_completed: 0,
        })
    }

    /// Runs exactly one synchronous round and returns its dispersion.
    pub fn step(&mut self) -> Result<f64, ConsensusError> {
        // Round-start snapshot: the only values the compute phase may read
        let snapshot = self.current_states();

        // Compute phase
        let mut next_states = Vec::with_capacity(self.agents.len());
        for agent in self.agents.iter_mut() {
            let mut readings: Vec<f64> = agent.neighbors().iter().map(|&j| snapshot[j]).collect();
            if let Some(noise) = &self.noise {
                for reading in readings.iter_mut() {
                    *reading += noise.sample(self.context.noise_rng());
                }
            }
            next_states.push(agent.compute_next_state(&readings)?);
        }

        // Commit phase
        for agent in self.agents.iter_mut() {
            agent.commit_update()?;
        }

        let dispersion = stats::dispersion(&next_states);
        self.state_history.push(next_states);
        self.dispersion_history.push(dispersion);
        self.rounds_completed += 1;

        let round = self.rounds_completed;
        if round <= 5 || round % 100 == 0 {
            debug!("  round {} | dispersion = {:.6e}", round, dispersion);
        }

        Ok(dispersion)
    }

    /// Runs rounds until convergence, oscillation, or `max_rounds` rounds.
    ///
    /// Continues from the current state; the detector windows are reset at
    /// the start of every call and round counts in the summary are relative
    /// to this call.
    pub fn run_until_convergence(
        &mut self,
        max_rounds: usize,
    ) -> Result<ConvergenceSummary, ConsensusError> {
        if max_rounds == 0 {
            return Err(ConsensusError::invalid("max_rounds must be positive"));
        }

        self.detector.reset();

        let start = self.current_states();
        info!(
            "Starting run: initial dispersion = {:.6}, initial average = {:.4}",
            stats::dispersion(&start),
            stats::mean(&start)
        );

        let mut outcome = Outcome::Running;
        let mut executed = 0;

        for round in 1..=max_rounds {
            let dispersion = self.step()?;
            executed = round;
            outcome = self.detector.observe(round, dispersion);
            if outcome.is_terminal() {
                break;
            }
        }

        if outcome == Outcome::Running {
            outcome = Outcome::Exhausted;
        }

        let summary = ConvergenceSummary::new(
            outcome,
            executed,
            max_rounds,
            &self.state_history[0],
            self.latest_states(),
        );

        match outcome {
            Outcome::Converged => info!(
                "Consensus after {} rounds: dispersion = {:.2e}, value = {:.4} (initial average {:.4})",
                executed, summary.final_dispersion, summary.consensus_value, summary.initial_average
            ),
            Outcome::Oscillating => warn!(
                "Oscillation detected after {} rounds, stopping early: dispersion = {:.6}",
                executed, summary.final_dispersion
            ),
            _ => info!(
                "No consensus within {} rounds: dispersion = {:.6}",
                max_rounds, summary.final_dispersion
            ),
        }

        Ok(summary)
    }

    /// Runs with the configured round budget.
    pub fn run(&mut self) -> Result<ConvergenceSummary, ConsensusError> {
        self.run_until_convergence(self.config.max_rounds)
    }

    /// Overwrites the initial states (calibration only).
    ///
    /// Allowed only before the first round; replaces both the agents' states
    /// and `state_history[0]`.
    pub fn set_initial_states(&mut self, states: &[f64]) -> Result<(), ConsensusError> {
        if self.rounds_completed > 0 {
            return Err(ConsensusError::protocol(format!(
                "initial states overwritten after {} round(s)",
                self.rounds_completed
            )));
        }
        if states.len() != self.agents.len() {
            return Err(ConsensusError::invalid(format!(
                "expected {} initial states, got {}",
                self.agents.len(),
                states.len()
            )));
        }

        for (agent, &state) in self.agents.iter_mut().zip(states) {
            agent.override_state(state)?;
        }
        self.state_history[0] = states.to_vec();
        self.dispersion_history[0] = stats::dispersion(states);
        Ok(())
    }

    /// Binds a new strategy to every agent.
    pub fn set_strategy_all(&mut self, strategy: Strategy) {
        for agent in self.agents.iter_mut() {
            agent.set_strategy(strategy);
        }
    }

    /// Binds a new strategy to one agent.
    pub fn set_agent_strategy(&mut self, id: NodeId, strategy: Strategy) -> Result<(), ConsensusError> {
        self.agent_mut(id)?.set_strategy(strategy);
        Ok(())
    }

    /// Replaces one agent's neighbor set between rounds.
    ///
    /// The run's [`Network`] keeps the original topology.
    pub fn rewire(&mut self, id: NodeId, neighbors: Vec<NodeId>) -> Result<(), ConsensusError> {
        let count = self.agents.len();
        if let Some(bad) = neighbors.iter().find(|&&n| n >= count) {
            return Err(ConsensusError::invalid(format!(
                "neighbor {} outside [0, {})",
                bad, count
            )));
        }
        self.agent_mut(id)?.set_neighbors(neighbors)
    }

    fn agent_mut(&mut self, id: NodeId) -> Result<&mut Agent, ConsensusError> {
        self.agents
            .get_mut(id)
            .ok_or_else(|| ConsensusError::invalid(format!("unknown agent {}", id)))
    }

    fn latest_states(&self) -> &[f64] {
        self.state_history.last().map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Returns the committed state of every agent.
    pub fn current_states(&self) -> Vec<f64> {
        self.agents.iter().map(|a| a.state()).collect()
    }

    /// Returns the full state history, one vector per round.
    pub fn state_history(&self) -> &[Vec<f64>] {
        &self.state_history
    }

    /// Returns the state history as a `(rounds + 1) × agents` matrix.
    pub fn history_matrix(&self) -> DMatrix<f64> {
        DMatrix::from_fn(self.state_history.len(), self.agents.len(), |r, c| {
            self.state_history[r][c]
        })
    }

    /// Returns the dispersion of every history entry.
    pub fn dispersion_history(&self) -> &[f64] {
        &self.dispersion_history
    }

    /// Returns all agents.
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    /// Returns one agent.
    pub fn agent(&self, id: NodeId) -> Option<&Agent> {
        self.agents.get(id)
    }

    /// Returns the network the run was built on.
    pub fn network(&self) -> &Network {
        &self.network
    }

    /// Returns the configuration.
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Returns the master seed.
    pub fn seed(&self) -> u64 {
        self.context.seed()
    }

    /// Returns the number of rounds executed so far.
    pub fn rounds_completed(&self) -> usize {
        self.rounds_completed
    }
}
