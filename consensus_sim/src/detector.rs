//! Convergence and oscillation detection over the per-round dispersion.

use consensus_core::stats;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// State of a run as judged by the detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    /// Keep going
    Running,

    /// Dispersion fell (and stayed) below tolerance
    Converged,

    /// Dispersion keeps fluctuating; stop early without agreement
    Oscillating,

    /// Round budget spent without converging or oscillating
    Exhausted,
}

impl Outcome {
    /// Returns true for every outcome except `Running`.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Outcome::Running)
    }

    /// Returns the outcome name.
    pub fn name(&self) -> &'static str {
        match self {
            Outcome::Running => "RUNNING",
            Outcome::Converged => "CONVERGED",
            Outcome::Oscillating => "OSCILLATING",
            Outcome::Exhausted => "EXHAUSTED",
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.name())
    }
}

/// Fixed-capacity FIFO of recent values; the oldest entry is evicted on push.
#[derive(Debug, Clone)]
pub struct SlidingWindow {
    values: VecDeque<f64>,
    capacity: usize,
}

impl SlidingWindow {
    /// Creates an empty window. A capacity of zero is bumped to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            values: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends a value, evicting the oldest when full.
    pub fn push(&mut self, value: f64) {
        if self.values.len() == self.capacity {
            self.values.pop_front();
        }
        self.values.push_back(value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.values.len() == self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// Most recent value.
    pub fn last(&self) -> Option<f64> {
        self.values.back().copied()
    }

    /// Value before the most recent one.
    pub fn previous(&self) -> Option<f64> {
        self.values.len().checked_sub(2).and_then(|i| self.values.get(i).copied())
    }

    /// Smallest value in the window.
    pub fn min(&self) -> Option<f64> {
        self.values.iter().copied().reduce(f64::min)
    }

    /// Returns true if every value is `<=` its predecessor.
    pub fn is_non_increasing(&self) -> bool {
        self.values
            .iter()
            .zip(self.values.iter().skip(1))
            .all(|(prev, next)| next <= prev)
    }

    /// Copies the window contents, oldest first.
    pub fn to_vec(&self) -> Vec<f64> {
        self.values.iter().copied().collect()
    }
}

/// Thresholds for the convergence detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Dispersion below which the population counts as agreed
    pub tolerance: f64,

    /// Rounds in the convergence window
    pub convergence_window: usize,

    /// Maximum change between the last two rounds, as a fraction of tolerance
    pub marginal_factor: f64,

    /// Rounds that are never sampled for oscillation; the oscillation
    /// window starts filling with round `warmup_rounds + 1`
    pub warmup_rounds: usize,

    /// Rounds in the oscillation window
    pub oscillation_window: usize,

    /// Coefficient of variation above which the window counts as oscillating
    pub cv_threshold: f64,

    /// Rebound ratio over the window minimum that counts as oscillating
    pub rebound_factor: f64,
}

impl DetectorConfig {
    /// Default thresholds with the given tolerance.
    pub fn new(tolerance: f64) -> Self {
        Self {
            tolerance,
            ..Default::default()
        }
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-6,
            convergence_window: 5,
            marginal_factor: 0.1,
            warmup_rounds: 51,
            oscillation_window: 10,
            cv_threshold: 0.5,
            rebound_factor: 1.5,
        }
    }
}

/// Decides, once per round, whether a run is done.
///
/// Rules, in order:
/// 1. dispersion below tolerance ⇒ `Converged`
/// 2. full convergence window entirely below tolerance with a marginal last
///    step ⇒ `Converged`
/// 3. once the post-warm-up oscillation window is full, a non-monotone window with a high
///    coefficient of variation, or a rebound above `rebound_factor` × the
///    window minimum while still above tolerance ⇒ `Oscillating`
/// 4. otherwise `Running`
#[derive(Debug, Clone)]
pub struct ConvergenceDetector {
    config: DetectorConfig,
    convergence_window: SlidingWindow,
    oscillation_window: SlidingWindow,
}

impl ConvergenceDetector {
    /// Creates a detector with empty windows.
    pub fn new(config: DetectorConfig) -> Self {
        Self {
            convergence_window: SlidingWindow::new(config.convergence_window),
            oscillation_window: SlidingWindow::new(config.oscillation_window),
            config,
        }
    }

    /// Returns the thresholds.
    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Clears both windows; call at the start of every run.
    pub fn reset(&mut self) {
        self.convergence_window.clear();
        self.oscillation_window.clear();
    }

    /// Feeds the dispersion produced by round `round` (1-based).
    pub fn observe(&mut self, round: usize, dispersion: f64) -> Outcome {
        self.convergence_window.push(dispersion);
        if round > self.config.warmup_rounds {
            self.oscillation_window.push(dispersion);
        }

        let tolerance = self.config.tolerance;

        if dispersion < tolerance {
            return Outcome::Converged;
        }

        // Shadowed by rule 1 while both use the same tolerance
        if self.window_converged() {
            return Outcome::Converged;
        }

        if self.oscillating(dispersion) {
            return Outcome::Oscillating;
        }

        Outcome::Running
    }

    fn window_converged(&self) -> bool {
        let window = &self.convergence_window;
        if !window.is_full() {
            return false;
        }

        let tolerance = self.config.tolerance;
        if !window.to_vec().iter().all(|&d| d < tolerance) {
            return false;
        }

        match (window.last(), window.previous()) {
            (Some(last), Some(prev)) => {
                (last - prev).abs() < tolerance * self.config.marginal_factor
            }
            _ => false,
        }
    }

    fn oscillating(&self, dispersion: f64) -> bool {
        let window = &self.oscillation_window;
        // Steady decay is slow convergence, not oscillation
        if !window.is_full() || window.is_non_increasing() {
            return false;
        }

        let values = window.to_vec();
        if stats::coefficient_of_variation(&values) > self.config.cv_threshold {
            return true;
        }

        match window.min() {
            Some(min) => {
                dispersion >= self.config.tolerance
                    && dispersion > self.config.rebound_factor * min
            }
            None => false,
        }
    }
}
