//! Canned consensus experiments.

use serde::{Deserialize, Serialize};

/// Scenario identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioId {
    /// 3 agents, complete graph, DeGroot from [0, 5, 10]
    FullMesh,

    /// 5 agents, ring, fully stubborn
    FrozenRing,

    /// 5 agents, star, hub starts high
    StarBias,

    /// Stubbornness outside [0, 1]
    InvalidStubbornness,

    /// 20 agents, Watts-Strogatz small world
    SmallWorld,

    // ═══════════════════════════════════════════════════
    // COMPARATIVE EXPERIMENTS
    // ═══════════════════════════════════════════════════

    /// DeGroot on every topology
    TopologyComparison,

    /// Stubborn ring with increasing α
    StubbornSweep,

    /// Fixed versus adaptive susceptibility
    AdaptiveVsFixed,

    /// Susceptible ring under communication noise
    NoisyRing,

    /// Complete DeGroot at growing population sizes
    Scalability,

    /// Star with every stubborn α and susceptible β setting
    ParameterSweep,

    /// Final bias and precision per topology, strategy and size
    ConsensusPrecision,
}

impl ScenarioId {
    /// Returns a list of all scenarios.
    pub fn all() -> Vec<ScenarioId> {
        vec![
            ScenarioId::FullMesh,
            ScenarioId::FrozenRing,
            ScenarioId::StarBias,
            ScenarioId::InvalidStubbornness,
            ScenarioId::SmallWorld,
            // Comparative
            ScenarioId::TopologyComparison,
            ScenarioId::StubbornSweep,
            ScenarioId::AdaptiveVsFixed,
            ScenarioId::NoisyRing,
            ScenarioId::Scalability,
            ScenarioId::ParameterSweep,
            ScenarioId::ConsensusPrecision,
        ]
    }

    /// Returns the scenario name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioId::FullMesh => "full_mesh",
            ScenarioId::FrozenRing => "frozen_ring",
            ScenarioId::StarBias => "star_bias",
            ScenarioId::InvalidStubbornness => "invalid_stubbornness",
            ScenarioId::SmallWorld => "small_world",
            ScenarioId::TopologyComparison => "topology_comparison",
            ScenarioId::StubbornSweep => "stubborn_sweep",
            ScenarioId::AdaptiveVsFixed => "adaptive_vs_fixed",
            ScenarioId::NoisyRing => "noisy_ring",
            ScenarioId::Scalability => "scalability",
            ScenarioId::ParameterSweep => "parameter_sweep",
            ScenarioId::ConsensusPrecision => "consensus_precision",
        }
    }

    /// Returns a description of the scenario.
    pub fn description(&self) -> &'static str {
        match self {
            ScenarioId::FullMesh => "3 agents on a complete graph reach the exact average in one round",
            ScenarioId::FrozenRing => "Fully stubborn ring never moves and exhausts its budget",
            ScenarioId::StarBias => "High hub on a star pulls the consensus away from the initial average",
            ScenarioId::InvalidStubbornness => "Stubbornness 1.5 is rejected before any round runs",
            ScenarioId::SmallWorld => "DeGroot on a 20-agent small world (k=4, p=0.1) converges",
            ScenarioId::TopologyComparison => "DeGroot on complete, ring, star and small world; complete is fastest",
            ScenarioId::StubbornSweep => "Stubborn ring of 21 agents: more stubbornness, slower agreement",
            ScenarioId::AdaptiveVsFixed => "Susceptible versus diff- and variance-adaptive weights on a ring",
            ScenarioId::NoisyRing => "Communication noise keeps a susceptible ring from agreeing",
            ScenarioId::Scalability => "Complete DeGroot with 10, 50 and 100 agents converges in one round",
            ScenarioId::ParameterSweep => "5-agent star over stubborn α and susceptible β: rounds and bias per setting",
            ScenarioId::ConsensusPrecision => "Bias and final dispersion at tolerance 1e-8 across topology, strategy and size",
        }
    }

    /// Returns true if the scenario compares several runs.
    pub fn is_comparative(&self) -> bool {
        matches!(
            self,
            ScenarioId::TopologyComparison
                | ScenarioId::StubbornSweep
                | ScenarioId::AdaptiveVsFixed
                | ScenarioId::NoisyRing
                | ScenarioId::Scalability
                | ScenarioId::ParameterSweep
                | ScenarioId::ConsensusPrecision
        )
    }
}

impl std::fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ScenarioId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "full_mesh" | "fullmesh" | "a" => Ok(ScenarioId::FullMesh),
            "frozen_ring" | "frozenring" | "b" => Ok(ScenarioId::FrozenRing),
            "star_bias" | "starbias" | "c" => Ok(ScenarioId::StarBias),
            "invalid_stubbornness" | "d" => Ok(ScenarioId::InvalidStubbornness),
            "small_world" | "smallworld" => Ok(ScenarioId::SmallWorld),
            "topology_comparison" | "topologies" => Ok(ScenarioId::TopologyComparison),
            "stubborn_sweep" => Ok(ScenarioId::StubbornSweep),
            "adaptive_vs_fixed" | "adaptive" => Ok(ScenarioId::AdaptiveVsFixed),
            "noisy_ring" | "noise" => Ok(ScenarioId::NoisyRing),
            "scalability" => Ok(ScenarioId::Scalability),
            "parameter_sweep" | "sweep" => Ok(ScenarioId::ParameterSweep),
            "consensus_precision" | "precision" => Ok(ScenarioId::ConsensusPrecision),
            // Groups
            "all" => Err("Use --scenario all through the runner, not as a single id".to_string()),
            _ => Err(format!("Unknown scenario: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for id in ScenarioId::all() {
            assert_eq!(id.name().parse::<ScenarioId>().unwrap(), id);
            assert_eq!(id.to_string(), id.name());
            assert!(!id.description().is_empty());
        }
    }

    #[test]
    fn test_aliases() {
        assert_eq!("C".parse::<ScenarioId>().unwrap(), ScenarioId::StarBias);
        assert_eq!("noisy-ring".parse::<ScenarioId>().unwrap(), ScenarioId::NoisyRing);
        assert_eq!("precision".parse::<ScenarioId>().unwrap(), ScenarioId::ConsensusPrecision);
        assert!("all".parse::<ScenarioId>().is_err());
        assert!("bogus".parse::<ScenarioId>().unwrap_err().contains("bogus"));
    }

    #[test]
    fn test_comparative_split() {
        let comparative = ScenarioId::all().into_iter().filter(|s| s.is_comparative()).count();
        assert_eq!(comparative, 7);
    }
}
