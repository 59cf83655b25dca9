//! Consensus Simulation Harness
//!
//! This crate drives populations of [`consensus_core::Agent`]s through
//! synchronous rounds and decides when a run has converged, is oscillating,
//! or has exhausted its round budget.
//!
//! # Core Principle: The Two-Phase Round
//!
//! Every round is split by a hard barrier:
//! - **Compute**: every agent reads the *round-start* snapshot of its
//!   neighbors (optionally perturbed by communication noise) and parks its
//!   next state
//! - **Commit**: every agent adopts its parked state; the new global state
//!   vector is appended to the history
//!
//! No agent ever observes a value written in the same round, so results do
//! not depend on agent iteration order.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      SimulationRun                          │
//! │  ┌──────────────────────────────────────────────────────┐   │
//! │  │ SimContext (seed → initial / noise / topology RNGs)  │   │
//! │  └──────────────────────────────────────────────────────┘   │
//! │       │                        │                            │
//! │  ┌────▼────┐              ┌────▼────┐                       │
//! │  │  Agent  │◄────────────►│  Agent  │     ...               │
//! │  │   #0    │   Network    │   #1    │                       │
//! │  └─────────┘  (adjacency) └─────────┘                       │
//! │       │                        │                            │
//! │  ┌────▼────────────────────────▼────┐                       │
//! │  │       ConvergenceDetector         │                       │
//! │  │  (dispersion → outcome per round) │                       │
//! │  └───────────────────────────────────┘                       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use consensus_sim::{SimConfig, SimulationRun};
//!
//! let config = SimConfig {
//!     seed: 42,
//!     agent_count: 20,
//!     ..Default::default()
//! };
//!
//! let mut run = SimulationRun::new(config)?;
//! let summary = run.run()?;
//! println!("{:?} after {} rounds", summary.outcome, summary.rounds_executed);
//! ```

mod context;
mod world;
mod detector;
mod summary;
pub mod config;
pub mod exporter;
pub mod runner;
pub mod scenarios;

pub use config::{SimConfig, StrategyConfig};
pub use context::SimContext;
pub use detector::{ConvergenceDetector, DetectorConfig, Outcome, SlidingWindow};
pub use exporter::{RoundFrame, SimExport};
pub use runner::{ScenarioResult, ScenarioRun, ScenarioRunner};
pub use scenarios::ScenarioId;
pub use summary::ConvergenceSummary;
pub use world::SimulationRun;
