//! Convergence summary handed to callers after a run.

use crate::detector::Outcome;
use consensus_core::stats;
use serde::{Deserialize, Serialize};

/// Result record of `SimulationRun::run_until_convergence`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceSummary {
    /// Terminal outcome (`Converged`, `Oscillating` or `Exhausted`)
    pub outcome: Outcome,

    /// Rounds executed by this call
    pub rounds_executed: usize,

    /// Round at which the run converged, or the round budget as sentinel
    pub rounds_to_convergence: usize,

    /// Dispersion of the final state vector
    pub final_dispersion: f64,

    /// Mean of the final states
    pub consensus_value: f64,

    /// Mean of the initial states (`state_history[0]`)
    pub initial_average: f64,

    /// `consensus_value - initial_average`
    pub bias: f64,
}

impl ConvergenceSummary {
    /// Builds a summary from the initial and final state vectors.
    pub fn new(
        outcome: Outcome,
        rounds_executed: usize,
        max_rounds: usize,
        initial_states: &[f64],
        final_states: &[f64],
    ) -> Self {
        let consensus_value = stats::mean(final_states);
        let initial_average = stats::mean(initial_states);

        Self {
            outcome,
            rounds_executed,
            rounds_to_convergence: if outcome == Outcome::Converged {
                rounds_executed
            } else {
                max_rounds
            },
            final_dispersion: stats::dispersion(final_states),
            consensus_value,
            initial_average,
            bias: consensus_value - initial_average,
        }
    }

    /// Returns true if the run reached agreement.
    pub fn converged(&self) -> bool {
        self.outcome == Outcome::Converged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_converged_summary() {
        let summary = ConvergenceSummary::new(
            Outcome::Converged,
            12,
            1000,
            &[0.0, 5.0, 10.0],
            &[6.0, 6.0, 6.0],
        );

        assert!(summary.converged());
        assert_eq!(summary.rounds_to_convergence, 12);
        assert_eq!(summary.final_dispersion, 0.0);
        assert_eq!(summary.consensus_value, 6.0);
        assert_eq!(summary.initial_average, 5.0);
        assert_eq!(summary.bias, 1.0);
    }

    #[test]
    fn test_non_converged_summary_uses_sentinel() {
        let summary = ConvergenceSummary::new(Outcome::Oscillating, 73, 500, &[1.0, 3.0], &[0.0, 4.0]);

        assert!(!summary.converged());
        assert_eq!(summary.rounds_executed, 73);
        assert_eq!(summary.rounds_to_convergence, 500);
        assert_eq!(summary.final_dispersion, 2.0);
    }
}
