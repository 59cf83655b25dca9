//! Simulation configuration.

use consensus_core::{ConsensusError, Strategy, StrategyKind, StrategyParams};
use consensus_env::TopologySpec;
use serde::{Deserialize, Serialize};

/// Strategy selection as it appears in configuration: a kind name plus a
/// parameter map. Validated when the run is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    /// Strategy identifier (`deGroot`, `stubborn`, `susceptible`, ...)
    pub kind: String,

    /// Strategy-specific parameters (`alpha`, `beta`, `beta_max`, `k`)
    pub params: StrategyParams,
}

impl StrategyConfig {
    /// Creates a config for a kind with explicit parameters.
    pub fn new(kind: StrategyKind, params: &[(&str, f64)]) -> Self {
        Self {
            kind: kind.name().to_string(),
            params: params.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
        }
    }

    /// Describes an already validated strategy.
    pub fn from_strategy(strategy: &Strategy) -> Self {
        Self {
            kind: strategy.kind().name().to_string(),
            params: strategy.params(),
        }
    }

    /// Builds the strategy, failing with `UnknownKind` or `InvalidParameter`.
    pub fn build(&self) -> Result<Strategy, ConsensusError> {
        Strategy::from_name(&self.kind, &self.params)
    }
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            kind: StrategyKind::DeGroot.name().to_string(),
            params: StrategyParams::new(),
        }
    }
}

/// Configuration for a simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Master seed for determinism
    pub seed: u64,

    /// Number of agents
    pub agent_count: usize,

    /// Topology request handed to the provider
    pub topology: TopologySpec,

    /// Initial states are drawn uniformly from `[min, max)`
    pub initial_state_range: (f64, f64),

    /// Update rule bound to every agent
    pub strategy: StrategyConfig,

    /// Round budget for `SimulationRun::run`
    pub max_rounds: usize,

    /// Dispersion below which the population counts as agreed
    pub tolerance: f64,

    /// Standard deviation of additive noise on every neighbor reading
    pub noise_std: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            agent_count: 10,
            topology: TopologySpec::default(),
            initial_state_range: (0.0, 1.0),
            strategy: StrategyConfig::default(),
            max_rounds: 1000,
            tolerance: 1e-6,
            noise_std: 0.0,
        }
    }
}

impl SimConfig {
    /// Parses a JSON configuration; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Sets the seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the agent count.
    pub fn with_agents(mut self, agent_count: usize) -> Self {
        self.agent_count = agent_count;
        self
    }

    /// Sets the topology.
    pub fn with_topology(mut self, topology: TopologySpec) -> Self {
        self.topology = topology;
        self
    }

    /// Sets the strategy.
    pub fn with_strategy(mut self, strategy: StrategyConfig) -> Self {
        self.strategy = strategy;
        self
    }

    /// Sets the initial state range.
    pub fn with_initial_range(mut self, min: f64, max: f64) -> Self {
        self.initial_state_range = (min, max);
        self
    }

    /// Sets the round budget.
    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    /// Sets the convergence tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Sets the communication noise level.
    pub fn with_noise(mut self, noise_std: f64) -> Self {
        self.noise_std = noise_std;
        self
    }

    /// Checks every scalar option against its domain.
    ///
    /// Strategy and topology parameters are validated by their own builders.
    pub fn validate(&self) -> Result<(), ConsensusError> {
        if self.agent_count == 0 {
            return Err(ConsensusError::invalid("agent_count must be positive"));
        }
        if self.max_rounds == 0 {
            return Err(ConsensusError::invalid("max_rounds must be positive"));
        }
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(ConsensusError::invalid(format!(
                "tolerance must be a positive number, got {}",
                self.tolerance
            )));
        }
        if !self.noise_std.is_finite() || self.noise_std < 0.0 {
            return Err(ConsensusError::invalid(format!(
                "noise_std must be non-negative, got {}",
                self.noise_std
            )));
        }
        let (min, max) = self.initial_state_range;
        if !min.is_finite() || !max.is_finite() || min > max {
            return Err(ConsensusError::invalid(format!(
                "initial_state_range must satisfy min <= max, got ({}, {})",
                min, max
            )));
        }
        if !(max - min).is_finite() {
            return Err(ConsensusError::invalid(format!(
                "initial_state_range ({}, {}) is too wide to sample",
                min, max
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use consensus_env::TopologyKind;

    #[test]
    fn test_default_config_is_valid() {
        assert!(SimConfig::default().validate().is_ok());
        assert_eq!(SimConfig::default().strategy.build().unwrap(), Strategy::DeGroot);
    }

    #[test]
    fn test_validation_failures() {
        let bad = [
            SimConfig::default().with_agents(0),
            SimConfig::default().with_max_rounds(0),
            SimConfig::default().with_tolerance(0.0),
            SimConfig::default().with_tolerance(f64::NAN),
            SimConfig::default().with_noise(-1.0),
            SimConfig::default().with_initial_range(5.0, 1.0),
            SimConfig::default().with_initial_range(f64::NEG_INFINITY, 1.0),
            // Finite bounds whose span overflows
            SimConfig::default().with_initial_range(-1e308, 1e308),
        ];

        for config in bad {
            assert!(
                matches!(config.validate(), Err(ConsensusError::InvalidParameter(_))),
                "{:?}",
                config
            );
        }
    }

    #[test]
    fn test_wide_finite_range_is_accepted() {
        let config = SimConfig::default().with_initial_range(-1e307, 1e307);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_strategy_config_build() {
        let config = StrategyConfig::new(StrategyKind::Stubborn, &[("alpha", 0.25)]);
        assert_eq!(config.build().unwrap(), Strategy::stubborn(0.25).unwrap());

        let unknown = StrategyConfig {
            kind: "majority".into(),
            params: StrategyParams::new(),
        };
        assert_eq!(unknown.build(), Err(ConsensusError::UnknownKind("majority".into())));
    }

    #[test]
    fn test_strategy_config_from_strategy() {
        let strategy = Strategy::diff_adaptive(0.5, 0.2).unwrap();
        assert_eq!(StrategyConfig::from_strategy(&strategy).build().unwrap(), strategy);
    }

    #[test]
    fn test_from_json_with_defaults() {
        let json = r#"{
            "agent_count": 20,
            "topology": { "kind": "small_world", "neighbor_degree": 6 },
            "strategy": { "kind": "susceptible", "params": { "beta": 2.0 } },
            "initial_state_range": [0.0, 100.0]
        }"#;

        let config = SimConfig::from_json(json).unwrap();

        assert_eq!(config.agent_count, 20);
        assert_eq!(config.topology.kind, TopologyKind::SmallWorld);
        assert_eq!(config.topology.neighbor_degree, 6);
        assert_eq!(config.topology.rewire_probability, 0.1);
        assert_eq!(config.initial_state_range, (0.0, 100.0));
        assert_eq!(config.strategy.build().unwrap(), Strategy::susceptible(2.0).unwrap());
        assert_eq!(config.seed, 42);
        assert_eq!(config.max_rounds, 1000);
    }

    #[test]
    fn test_json_round_trip() {
        let config = SimConfig::default()
            .with_agents(7)
            .with_noise(0.5)
            .with_strategy(StrategyConfig::new(StrategyKind::Stubborn, &[("alpha", 0.9)]));
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(SimConfig::from_json(&json).unwrap(), config);
    }
}
