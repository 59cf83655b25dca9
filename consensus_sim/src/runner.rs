//! Scenario runner - executes the canned consensus experiments.

use crate::config::{SimConfig, StrategyConfig};
use crate::context::SimContext;
use crate::detector::Outcome;
use crate::scenarios::ScenarioId;
use crate::summary::ConvergenceSummary;
use crate::world::SimulationRun;

use consensus_core::{ConsensusError, StrategyKind};
use consensus_env::{TopologyKind, TopologySpec};
use serde::Serialize;
use tracing::{info, warn};

/// One labelled run inside a scenario.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioRun {
    /// Short label, e.g. `"ring"` or `"alpha=0.4"`
    pub label: String,

    /// Outcome of the run
    pub summary: ConvergenceSummary,
}

/// Results from running a scenario.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioResult {
    /// Scenario that was run
    pub scenario: ScenarioId,

    /// Seed used
    pub seed: u64,

    /// Whether scenario passed all assertions
    pub passed: bool,

    /// Every run the scenario executed, in order
    pub runs: Vec<ScenarioRun>,

    /// Failure message if any
    pub failure_reason: Option<String>,
}

impl ScenarioResult {
    fn new(scenario: ScenarioId, seed: u64, runs: Vec<ScenarioRun>, failure: Option<String>) -> Self {
        Self {
            scenario,
            seed,
            passed: failure.is_none(),
            runs,
            failure_reason: failure,
        }
    }

    /// Finds a run by label.
    pub fn run(&self, label: &str) -> Option<&ConvergenceSummary> {
        self.runs.iter().find(|r| r.label == label).map(|r| &r.summary)
    }
}

/// Runs consensus scenarios.
pub struct ScenarioRunner {
    /// Master seed for every run
    seed: u64,

    /// Round budget per run
    max_rounds: usize,
}

impl ScenarioRunner {
    /// Creates a new scenario runner.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            max_rounds: 1000,
        }
    }

    /// Sets the round budget per run.
    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    /// Runs a scenario and returns the result.
    pub fn run(&self, scenario: ScenarioId) -> ScenarioResult {
        info!("Starting scenario: {} (seed={})", scenario.name(), self.seed);

        let mut runs = Vec::new();
        let checked = match scenario {
            ScenarioId::FullMesh => self.run_full_mesh(&mut runs),
            ScenarioId::FrozenRing => self.run_frozen_ring(&mut runs),
            ScenarioId::StarBias => self.run_star_bias(&mut runs),
            ScenarioId::InvalidStubbornness => self.run_invalid_stubbornness(),
            ScenarioId::SmallWorld => self.run_small_world(&mut runs),
            // Comparative
            ScenarioId::TopologyComparison => self.run_topology_comparison(&mut runs),
            ScenarioId::StubbornSweep => self.run_stubborn_sweep(&mut runs),
            ScenarioId::AdaptiveVsFixed => self.run_adaptive_vs_fixed(&mut runs),
            ScenarioId::NoisyRing => self.run_noisy_ring(&mut runs),
            ScenarioId::Scalability => self.run_scalability(&mut runs),
            ScenarioId::ParameterSweep => self.run_parameter_sweep(&mut runs),
            ScenarioId::ConsensusPrecision => self.run_consensus_precision(&mut runs),
        };

        // Configuration errors count as scenario failures
        let failure = match checked {
            Ok(failure) => failure,
            Err(e) => Some(format!("run failed: {}", e)),
        };

        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        for run in &runs {
            info!(
                "  {:<22} {:<12} rounds={:<5} dispersion={:.2e} value={:.4} bias={:+.4}",
                run.label,
                run.summary.outcome,
                run.summary.rounds_executed,
                run.summary.final_dispersion,
                run.summary.consensus_value,
                run.summary.bias
            );
        }
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        if let Some(reason) = &failure {
            warn!("Scenario {} failed: {}", scenario.name(), reason);
        }

        ScenarioResult::new(scenario, self.seed, runs, failure)
    }

    fn base_config(&self, kind: TopologyKind, agents: usize, strategy: StrategyConfig) -> SimConfig {
        let topology = match kind {
            TopologyKind::SmallWorld => TopologySpec::small_world(4, 0.1),
            other => TopologySpec::new(other),
        };
        SimConfig::default()
            .with_seed(self.seed)
            .with_agents(agents)
            .with_topology(topology)
            .with_strategy(strategy)
            .with_max_rounds(self.max_rounds)
    }

    /// Builds, optionally calibrates, and runs one configuration.
    fn execute(
        &self,
        runs: &mut Vec<ScenarioRun>,
        label: impl Into<String>,
        config: SimConfig,
        initial_states: Option<&[f64]>,
    ) -> Result<(SimulationRun, ConvergenceSummary), ConsensusError> {
        let mut run = SimulationRun::new(config)?;
        if let Some(states) = initial_states {
            run.set_initial_states(states)?;
        }
        let summary = run.run()?;
        runs.push(ScenarioRun {
            label: label.into(),
            summary: summary.clone(),
        });
        Ok((run, summary))
    }

    /// Scenario A: exact average in one round.
    fn run_full_mesh(&self, runs: &mut Vec<ScenarioRun>) -> Result<Option<String>, ConsensusError> {
        let config = self.base_config(TopologyKind::Complete, 3, StrategyConfig::default());
        let (run, summary) = self.execute(runs, "complete", config, Some(&[0.0, 5.0, 10.0]))?;

        let exact = run.current_states().iter().all(|&x| x == 5.0);
        if summary.outcome == Outcome::Converged && summary.rounds_to_convergence == 1 && exact {
            Ok(None)
        } else {
            Ok(Some(format!(
                "expected exact agreement at 5 in round 1, got {} after {} round(s), states {:?}",
                summary.outcome,
                summary.rounds_executed,
                run.current_states()
            )))
        }
    }

    /// Scenario B: a fully stubborn population never moves.
    fn run_frozen_ring(&self, runs: &mut Vec<ScenarioRun>) -> Result<Option<String>, ConsensusError> {
        let strategy = StrategyConfig::new(StrategyKind::Stubborn, &[("alpha", 1.0)]);
        let config = self.base_config(TopologyKind::Ring, 5, strategy);
        let (run, summary) = self.execute(runs, "ring", config, None)?;

        let initial_dispersion = run.dispersion_history()[0];
        if summary.outcome != Outcome::Exhausted {
            return Ok(Some(format!("expected EXHAUSTED, got {}", summary.outcome)));
        }
        if summary.final_dispersion != initial_dispersion {
            return Ok(Some(format!(
                "dispersion moved from {} to {}",
                initial_dispersion, summary.final_dispersion
            )));
        }
        Ok(None)
    }

    /// Scenario C: degree-weighted consensus on a star.
    fn run_star_bias(&self, runs: &mut Vec<ScenarioRun>) -> Result<Option<String>, ConsensusError> {
        let initial = [0.0, 0.0, 0.0, 0.0, 10.0];
        let susceptible = StrategyConfig::new(StrategyKind::Susceptible, &[("beta", 2.0)]);

        let (_, s) = self.execute(
            runs,
            "star/susceptible",
            self.base_config(TopologyKind::Star, 5, susceptible),
            Some(&initial),
        )?;
        let (_, d) = self.execute(
            runs,
            "star/deGroot",
            self.base_config(TopologyKind::Star, 5, StrategyConfig::default()),
            Some(&initial),
        )?;
        let (_, c) = self.execute(
            runs,
            "complete/deGroot",
            self.base_config(TopologyKind::Complete, 5, StrategyConfig::default()),
            Some(&initial),
        )?;

        if !(s.converged() && d.converged() && c.converged()) {
            return Ok(Some("not every run converged".to_string()));
        }
        if s.bias.abs() <= d.bias.abs() || d.bias.abs() < 1e-3 {
            return Ok(Some(format!(
                "expected |bias| susceptible > deGroot > 0, got {:.4} vs {:.4}",
                s.bias, d.bias
            )));
        }
        if c.bias.abs() > 1e-9 {
            return Ok(Some(format!("complete graph biased by {:.2e}", c.bias)));
        }
        Ok(None)
    }

    /// Scenario D: invalid stubbornness fails at construction.
    fn run_invalid_stubbornness(&self) -> Result<Option<String>, ConsensusError> {
        let strategy = StrategyConfig::new(StrategyKind::Stubborn, &[("alpha", 1.5)]);
        let config = self.base_config(TopologyKind::Ring, 5, strategy);

        Ok(match SimulationRun::new(config) {
            Err(ConsensusError::InvalidParameter(msg)) => {
                info!("  rejected as expected: {}", msg);
                None
            }
            Err(other) => Some(format!("wrong error: {}", other)),
            Ok(_) => Some("alpha=1.5 was accepted".to_string()),
        })
    }

    fn run_small_world(&self, runs: &mut Vec<ScenarioRun>) -> Result<Option<String>, ConsensusError> {
        let config = self.base_config(TopologyKind::SmallWorld, 20, StrategyConfig::default());
        let (_, summary) = self.execute(runs, "small_world", config, None)?;

        Ok(if summary.converged() {
            None
        } else {
            Some(format!("ended {} after {} rounds", summary.outcome, summary.rounds_executed))
        })
    }

    fn run_topology_comparison(&self, runs: &mut Vec<ScenarioRun>) -> Result<Option<String>, ConsensusError> {
        for kind in TopologyKind::all() {
            let config = self
                .base_config(kind, 20, StrategyConfig::default())
                .with_initial_range(0.0, 100.0);
            self.execute(runs, kind.name(), config, None)?;
        }

        if let Some(stuck) = runs.iter().find(|r| !r.summary.converged()) {
            return Ok(Some(format!("{} did not converge", stuck.label)));
        }
        let complete = runs[0].summary.rounds_to_convergence;
        let fastest_other = runs[1..]
            .iter()
            .map(|r| r.summary.rounds_to_convergence)
            .min()
            .unwrap_or(usize::MAX);
        if complete > fastest_other {
            return Ok(Some(format!(
                "complete took {} rounds, another topology {}",
                complete, fastest_other
            )));
        }
        Ok(None)
    }

    fn run_stubborn_sweep(&self, runs: &mut Vec<ScenarioRun>) -> Result<Option<String>, ConsensusError> {
        for alpha in [0.1, 0.4, 0.7] {
            let strategy = StrategyConfig::new(StrategyKind::Stubborn, &[("alpha", alpha)]);
            let config = self.base_config(TopologyKind::Ring, 21, strategy).with_tolerance(1e-4);
            self.execute(runs, format!("alpha={}", alpha), config, None)?;
        }

        if let Some(stuck) = runs.iter().find(|r| !r.summary.converged()) {
            return Ok(Some(format!("{} did not converge", stuck.label)));
        }
        let increasing = runs
            .windows(2)
            .all(|w| w[0].summary.rounds_to_convergence < w[1].summary.rounds_to_convergence);
        Ok(if increasing {
            None
        } else {
            Some("convergence time did not grow with stubbornness".to_string())
        })
    }

    fn run_adaptive_vs_fixed(&self, runs: &mut Vec<ScenarioRun>) -> Result<Option<String>, ConsensusError> {
        let strategies = [
            ("susceptible", StrategyConfig::new(StrategyKind::Susceptible, &[("beta", 2.0)])),
            (
                "diff_adaptive",
                StrategyConfig::new(StrategyKind::DiffAdaptive, &[("beta_max", 0.7), ("k", 0.05)]),
            ),
            (
                "variance_adaptive",
                StrategyConfig::new(StrategyKind::VarianceAdaptive, &[("beta_max", 0.7), ("k", 0.001)]),
            ),
        ];

        for (label, strategy) in strategies {
            let config = self
                .base_config(TopologyKind::Ring, 20, strategy)
                .with_initial_range(0.0, 100.0)
                .with_tolerance(1e-4);
            self.execute(runs, label, config, None)?;
        }

        // Variance-adaptive is reported only
        for label in ["susceptible", "diff_adaptive"] {
            if runs.iter().any(|r| r.label == label && !r.summary.converged()) {
                return Ok(Some(format!("{} did not converge", label)));
            }
        }
        Ok(None)
    }

    fn run_noisy_ring(&self, runs: &mut Vec<ScenarioRun>) -> Result<Option<String>, ConsensusError> {
        let tolerance = 1e-3;
        let base = self
            .base_config(
                TopologyKind::Ring,
                20,
                StrategyConfig::new(StrategyKind::Susceptible, &[("beta", 2.0)]),
            )
            .with_initial_range(0.0, 100.0)
            .with_tolerance(tolerance);

        let (_, quiet) = self.execute(runs, "noise=0", base.clone(), None)?;
        let (_, noisy) = self.execute(runs, "noise=2", base.with_noise(2.0), None)?;

        if !quiet.converged() {
            return Ok(Some("noise-free run did not converge".to_string()));
        }
        if noisy.converged() || noisy.final_dispersion <= tolerance {
            return Ok(Some(format!(
                "noisy run reached dispersion {:.2e}",
                noisy.final_dispersion
            )));
        }
        Ok(None)
    }

    fn run_scalability(&self, runs: &mut Vec<ScenarioRun>) -> Result<Option<String>, ConsensusError> {
        for agents in [10, 50, 100] {
            let config = self
                .base_config(TopologyKind::Complete, agents, StrategyConfig::default())
                .with_initial_range(0.0, 100.0);
            let (_, summary) = self.execute(runs, format!("n={}", agents), config, None)?;
            if !summary.converged() || summary.rounds_to_convergence != 1 {
                return Ok(Some(format!(
                    "n={} ended {} after {} rounds",
                    agents, summary.outcome, summary.rounds_executed
                )));
            }
        }
        Ok(None)
    }

    /// Every stubborn α and susceptible β on one 5-agent star.
    ///
    /// Any self weight in (0, 1) conserves `hub + mean(leaves)`, so those
    /// runs share the value `(hub + mean(leaves)) / 2`.
    fn run_parameter_sweep(&self, runs: &mut Vec<ScenarioRun>) -> Result<Option<String>, ConsensusError> {
        let alphas = [0.0, 0.3, 0.5, 0.7, 0.9, 1.0];
        let betas = [1.0, 1.5, 2.0, 3.0, 5.0];

        for alpha in alphas {
            let strategy = StrategyConfig::new(StrategyKind::Stubborn, &[("alpha", alpha)]);
            let config = self
                .base_config(TopologyKind::Star, 5, strategy)
                .with_initial_range(0.0, 100.0)
                .with_tolerance(1e-4);
            self.execute(runs, format!("alpha={}", alpha), config, None)?;
        }
        for beta in betas {
            let strategy = StrategyConfig::new(StrategyKind::Susceptible, &[("beta", beta)]);
            let config = self
                .base_config(TopologyKind::Star, 5, strategy)
                .with_initial_range(0.0, 100.0)
                .with_tolerance(1e-4);
            self.execute(runs, format!("beta={}", beta), config, None)?;
        }

        let lookup = |label: &str| runs.iter().find(|r| r.label == label).map(|r| &r.summary);
        let (Some(frozen), Some(swapping)) = (lookup("alpha=1"), lookup("alpha=0")) else {
            return Ok(Some("sweep is missing the alpha endpoints".to_string()));
        };
        if frozen.outcome != Outcome::Exhausted || frozen.bias != 0.0 {
            return Ok(Some(format!(
                "alpha=1 should stay frozen, got {} with bias {:.2e}",
                frozen.outcome, frozen.bias
            )));
        }
        // Hub and leaves trade places every round
        if swapping.converged() {
            return Ok(Some("alpha=0 converged on a star".to_string()));
        }

        let interior: Vec<&ScenarioRun> = runs
            .iter()
            .filter(|r| r.label != "alpha=0" && r.label != "alpha=1")
            .collect();
        if let Some(stuck) = interior.iter().find(|r| !r.summary.converged()) {
            return Ok(Some(format!("{} did not converge", stuck.label)));
        }

        if lookup("alpha=0.5") != lookup("beta=2") {
            return Ok(Some("alpha=0.5 and beta=2 diverged".to_string()));
        }
        let rounds = |label: &str| lookup(label).map_or(0, |s| s.rounds_to_convergence);
        if rounds("alpha=0.9") <= rounds("alpha=0.7") {
            return Ok(Some(format!(
                "alpha=0.9 took {} rounds, alpha=0.7 took {}",
                rounds("alpha=0.9"),
                rounds("alpha=0.7")
            )));
        }

        // β = 1 is DeGroot, whose star consensus is degree weighted
        let values: Vec<f64> = interior
            .iter()
            .filter(|r| r.label != "beta=1")
            .map(|r| r.summary.consensus_value)
            .collect();
        let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if hi - lo > 1e-3 {
            return Ok(Some(format!(
                "self-weighted runs disagree on the consensus: [{:.6}, {:.6}]",
                lo, hi
            )));
        }
        Ok(None)
    }

    /// Bias and final dispersion per topology, strategy and size.
    ///
    /// Ring runs are reported only: at this tolerance the larger rings
    /// need far more rounds than the default budget.
    fn run_consensus_precision(&self, runs: &mut Vec<ScenarioRun>) -> Result<Option<String>, ConsensusError> {
        let tolerance = 1e-8;
        let topologies = [TopologyKind::Ring, TopologyKind::Star, TopologyKind::Complete];
        let strategies = [
            ("deGroot", StrategyConfig::default()),
            ("stubborn", StrategyConfig::new(StrategyKind::Stubborn, &[("alpha", 0.7)])),
            ("susceptible", StrategyConfig::new(StrategyKind::Susceptible, &[("beta", 2.0)])),
        ];

        for agents in [10, 20, 50] {
            // Same initial states for every topology and strategy at this size
            let initial = SimContext::new(self.seed.wrapping_add(agents as u64))
                .draw_initial_states(agents, (0.0, 100.0));
            for kind in topologies {
                for (name, strategy) in &strategies {
                    let config = self
                        .base_config(kind, agents, strategy.clone())
                        .with_tolerance(tolerance);
                    let label = format!("{}/{}/n={}", kind.name(), name, agents);
                    self.execute(runs, label, config, Some(&initial))?;
                }
            }
        }

        if let Some(r) = runs.iter().find(|r| r.summary.outcome == Outcome::Oscillating) {
            return Ok(Some(format!("{} was flagged as oscillating", r.label)));
        }
        let ring = TopologyKind::Ring.name();
        if let Some(r) = runs
            .iter()
            .find(|r| !r.label.starts_with(ring) && !r.summary.converged())
        {
            return Ok(Some(format!(
                "{} ended {} at dispersion {:.2e}",
                r.label, r.summary.outcome, r.summary.final_dispersion
            )));
        }
        // Regular graphs keep the initial average under every strategy here
        let complete = TopologyKind::Complete.name();
        if let Some(r) = runs
            .iter()
            .filter(|r| r.label.starts_with(ring) || r.label.starts_with(complete))
            .find(|r| r.summary.bias.abs() > 1e-9)
        {
            return Ok(Some(format!("{} drifted by {:.2e}", r.label, r.summary.bias)));
        }
        Ok(None)
    }
}
