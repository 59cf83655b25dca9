//! JSON exporter for offline analysis and plotting.
//!
//! Exports the configuration, the per-round state vectors and the summary
//! of one run.

use crate::config::SimConfig;
use crate::summary::ConvergenceSummary;
use crate::world::SimulationRun;

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;

/// A single round of simulation data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundFrame {
    /// Round index; 0 is the initial draw
    pub round: usize,

    /// Dispersion of `states`
    pub dispersion: f64,

    /// Committed state of every agent, indexed by id
    pub states: Vec<f64>,
}

/// Complete simulation export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimExport {
    /// Run label (scenario run or `"custom"`)
    pub label: String,

    /// Seed used
    pub seed: u64,

    /// Configuration the run was built from
    pub config: SimConfig,

    /// Final results, if the run was driven to an outcome
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<ConvergenceSummary>,

    /// All rounds
    pub frames: Vec<RoundFrame>,
}

impl SimExport {
    /// Captures the full history of a run.
    pub fn from_run(label: &str, run: &SimulationRun, summary: Option<&ConvergenceSummary>) -> Self {
        let frames = run
            .state_history()
            .iter()
            .zip(run.dispersion_history())
            .enumerate()
            .map(|(round, (states, &dispersion))| RoundFrame {
                round,
                dispersion,
                states: states.clone(),
            })
            .collect();

        Self {
            label: label.to_string(),
            seed: run.seed(),
            config: run.config().clone(),
            summary: summary.cloned(),
            frames,
        }
    }

    /// Returns the number of rounds executed (frames minus the initial one).
    pub fn rounds(&self) -> usize {
        self.frames.len().saturating_sub(1)
    }

    /// Writes to a JSON file.
    pub fn write_to_file(&self, path: &str) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}
