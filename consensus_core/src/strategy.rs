//! Local update rules ("consensus strategies").
//!
//! A [`Strategy`] is a pure function of `(own state, neighbor states)`. The
//! variant set is closed; each variant carries a parameter payload that can
//! only be obtained through a validating constructor, so an out-of-domain
//! strategy never reaches a simulation round.
//!
//! | Variant | Next state |
//! |---|---|
//! | DeGroot | `(own + Σn) / (1 + k)` |
//! | Stubborn(α) | `α·own + (1−α)·mean(n)` |
//! | Susceptible(β) | `(1/β)·own + ((β−1)/β)·mean(n)`, DeGroot at β=1 |
//! | DiffAdaptive(β_max, k) | `β_t = β_max·exp(−k·|own − mean(n)|)` |
//! | VarianceAdaptive(β_max, k) | `β_t = β_max·exp(−k·var(n))` |
//!
//! Adaptive variants move `(1−β_t)·own + β_t·mean(n)`.
//!
//! Every variant returns `own` unchanged when the neighbor list is empty.

use crate::error::ConsensusError;
use crate::stats;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Named strategy parameters, e.g. `{"alpha": 0.5}`.
pub type StrategyParams = BTreeMap<String, f64>;

// =============================================================================
// STRATEGY KIND
// =============================================================================

/// Strategy identifiers as used in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Equal-weight averaging of self and neighbors
    #[serde(rename = "deGroot")]
    DeGroot,

    /// Fixed self-weight α against the neighbor mean
    Stubborn,

    /// Self-weight 1/β against the neighbor mean
    Susceptible,

    /// Neighbor weight shrinks with distance to the neighbor mean
    DiffAdaptive,

    /// Neighbor weight shrinks with neighbor disagreement
    VarianceAdaptive,
}

impl StrategyKind {
    /// Returns a list of all kinds.
    pub fn all() -> Vec<StrategyKind> {
        vec![
            StrategyKind::DeGroot,
            StrategyKind::Stubborn,
            StrategyKind::Susceptible,
            StrategyKind::DiffAdaptive,
            StrategyKind::VarianceAdaptive,
        ]
    }

    /// Returns the canonical configuration name.
    pub fn name(&self) -> &'static str {
        match self {
            StrategyKind::DeGroot => "deGroot",
            StrategyKind::Stubborn => "stubborn",
            StrategyKind::Susceptible => "susceptible",
            StrategyKind::DiffAdaptive => "diff_adaptive",
            StrategyKind::VarianceAdaptive => "variance_adaptive",
        }
    }

    /// Parameter names accepted by this kind.
    pub fn parameter_names(&self) -> &'static [&'static str] {
        match self {
            StrategyKind::DeGroot => &[],
            StrategyKind::Stubborn => &["alpha"],
            StrategyKind::Susceptible => &["beta"],
            StrategyKind::DiffAdaptive | StrategyKind::VarianceAdaptive => &["beta_max", "k"],
        }
    }
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for StrategyKind {
    type Err = ConsensusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "degroot" | "de_groot" => Ok(StrategyKind::DeGroot),
            "stubborn" => Ok(StrategyKind::Stubborn),
            "susceptible" => Ok(StrategyKind::Susceptible),
            "diff_adaptive" | "diffadaptive" | "adaptive" => Ok(StrategyKind::DiffAdaptive),
            "variance_adaptive" | "varianceadaptive" => Ok(StrategyKind::VarianceAdaptive),
            _ => Err(ConsensusError::UnknownKind(s.to_string())),
        }
    }
}

// =============================================================================
// VALIDATED PARAMETERS
// =============================================================================

/// Stubbornness α ∈ [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stubbornness(f64);

impl Stubbornness {
    pub fn new(alpha: f64) -> Result<Self, ConsensusError> {
        if !alpha.is_finite() || !(0.0..=1.0).contains(&alpha) {
            return Err(ConsensusError::invalid(format!(
                "stubbornness alpha must be in [0, 1], got {}",
                alpha
            )));
        }
        Ok(Self(alpha))
    }

    pub fn alpha(&self) -> f64 {
        self.0
    }
}

/// Susceptibility β ≥ 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Susceptibility(f64);

impl Susceptibility {
    pub fn new(beta: f64) -> Result<Self, ConsensusError> {
        if !beta.is_finite() || beta < 1.0 {
            return Err(ConsensusError::invalid(format!(
                "susceptibility beta must be >= 1, got {}",
                beta
            )));
        }
        Ok(Self(beta))
    }

    pub fn beta(&self) -> f64 {
        self.0
    }
}

/// Gain schedule for the adaptive variants: β_max ∈ (0, 1], k > 0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdaptiveGain {
    beta_max: f64,
    k: f64,
}

impl AdaptiveGain {
    pub fn new(beta_max: f64, k: f64) -> Result<Self, ConsensusError> {
        if !beta_max.is_finite() || beta_max <= 0.0 || beta_max > 1.0 {
            return Err(ConsensusError::invalid(format!(
                "adaptive beta_max must be in (0, 1], got {}",
                beta_max
            )));
        }
        if !k.is_finite() || k <= 0.0 {
            return Err(ConsensusError::invalid(format!(
                "adaptive decay k must be > 0, got {}",
                k
            )));
        }
        Ok(Self { beta_max, k })
    }

    pub fn beta_max(&self) -> f64 {
        self.beta_max
    }

    pub fn k(&self) -> f64 {
        self.k
    }

    /// Effective neighbor weight for a given disagreement signal.
    fn weight(&self, signal: f64) -> f64 {
        self.beta_max * (-self.k * signal).exp()
    }
}

// =============================================================================
// STRATEGY
// =============================================================================

/// A validated update rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Strategy {
    DeGroot,
    Stubborn(Stubbornness),
    Susceptible(Susceptibility),
    DiffAdaptive(AdaptiveGain),
    VarianceAdaptive(AdaptiveGain),
}

impl Default for Strategy {
    fn default() -> Self {
        Strategy::DeGroot
    }
}

impl Strategy {
    /// Stubborn strategy; fails unless α ∈ [0, 1].
    pub fn stubborn(alpha: f64) -> Result<Self, ConsensusError> {
        Ok(Strategy::Stubborn(Stubbornness::new(alpha)?))
    }

    /// Susceptible strategy; fails unless β ≥ 1.
    pub fn susceptible(beta: f64) -> Result<Self, ConsensusError> {
        Ok(Strategy::Susceptible(Susceptibility::new(beta)?))
    }

    /// Difference-based adaptive strategy.
    pub fn diff_adaptive(beta_max: f64, k: f64) -> Result<Self, ConsensusError> {
        Ok(Strategy::DiffAdaptive(AdaptiveGain::new(beta_max, k)?))
    }

    /// Variance-based adaptive strategy.
    pub fn variance_adaptive(beta_max: f64, k: f64) -> Result<Self, ConsensusError> {
        Ok(Strategy::VarianceAdaptive(AdaptiveGain::new(beta_max, k)?))
    }

    /// Builds a strategy from a kind and a parameter map.
    ///
    /// Missing parameters take their defaults (α=0.5, β=1.5, β_max=0.7,
    /// k=0.05). Parameters the kind does not accept are rejected.
    pub fn from_kind(kind: StrategyKind, params: &StrategyParams) -> Result<Self, ConsensusError> {
        let accepted = kind.parameter_names();
        if let Some(unknown) = params.keys().find(|name| !accepted.contains(&name.as_str())) {
            return Err(ConsensusError::invalid(format!(
                "strategy {} does not accept parameter '{}' (accepted: {:?})",
                kind, unknown, accepted
            )));
        }

        let get = |name: &str, default: f64| params.get(name).copied().unwrap_or(default);

        match kind {
            StrategyKind::DeGroot => Ok(Strategy::DeGroot),
            StrategyKind::Stubborn => Strategy::stubborn(get("alpha", 0.5)),
            StrategyKind::Susceptible => Strategy::susceptible(get("beta", 1.5)),
            StrategyKind::DiffAdaptive => {
                Strategy::diff_adaptive(get("beta_max", 0.7), get("k", 0.05))
            }
            StrategyKind::VarianceAdaptive => {
                Strategy::variance_adaptive(get("beta_max", 0.7), get("k", 0.05))
            }
        }
    }

    /// Parses the kind name, then builds as [`Strategy::from_kind`].
    pub fn from_name(name: &str, params: &StrategyParams) -> Result<Self, ConsensusError> {
        Self::from_kind(name.parse()?, params)
    }

    /// Returns the kind of this strategy.
    pub fn kind(&self) -> StrategyKind {
        match self {
            Strategy::DeGroot => StrategyKind::DeGroot,
            Strategy::Stubborn(_) => StrategyKind::Stubborn,
            Strategy::Susceptible(_) => StrategyKind::Susceptible,
            Strategy::DiffAdaptive(_) => StrategyKind::DiffAdaptive,
            Strategy::VarianceAdaptive(_) => StrategyKind::VarianceAdaptive,
        }
    }

    /// Returns the parameters as a name → value map.
    pub fn params(&self) -> StrategyParams {
        let mut params = StrategyParams::new();
        match self {
            Strategy::DeGroot => {}
            Strategy::Stubborn(s) => {
                params.insert("alpha".into(), s.alpha());
            }
            Strategy::Susceptible(s) => {
                params.insert("beta".into(), s.beta());
            }
            Strategy::DiffAdaptive(g) | Strategy::VarianceAdaptive(g) => {
                params.insert("beta_max".into(), g.beta_max());
                params.insert("k".into(), g.k());
            }
        }
        params
    }

    /// Computes the next state of an agent.
    ///
    /// Pure: reads only the arguments and the strategy's own parameters.
    pub fn compute_next_state(&self, own: f64, neighbors: &[f64]) -> f64 {
        if neighbors.is_empty() {
            return own;
        }

        match self {
            Strategy::DeGroot => degroot(own, neighbors),
            Strategy::Stubborn(s) => {
                if s.alpha() == 1.0 {
                    return own;
                }
                s.alpha() * own + (1.0 - s.alpha()) * neighbor_mean(neighbors)
            }
            Strategy::Susceptible(s) => {
                // β = 1 is DeGroot by definition; the algebraic form would
                // drop the neighbors entirely.
                if s.beta() == 1.0 {
                    return degroot(own, neighbors);
                }
                let self_weight = 1.0 / s.beta();
                let neighbor_weight = (s.beta() - 1.0) / s.beta();
                self_weight * own + neighbor_weight * neighbor_mean(neighbors)
            }
            Strategy::DiffAdaptive(g) => {
                let avg = neighbor_mean(neighbors);
                let beta_t = g.weight((own - avg).abs());
                (1.0 - beta_t) * own + beta_t * avg
            }
            Strategy::VarianceAdaptive(g) => {
                let avg = neighbor_mean(neighbors);
                let beta_t = g.weight(stats::population_variance(neighbors));
                (1.0 - beta_t) * own + beta_t * avg
            }
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strategy::DeGroot => write!(f, "deGroot"),
            Strategy::Stubborn(s) => write!(f, "stubborn(alpha={})", s.alpha()),
            Strategy::Susceptible(s) => write!(f, "susceptible(beta={})", s.beta()),
            Strategy::DiffAdaptive(g) => {
                write!(f, "diff_adaptive(beta_max={}, k={})", g.beta_max(), g.k())
            }
            Strategy::VarianceAdaptive(g) => {
                write!(f, "variance_adaptive(beta_max={}, k={})", g.beta_max(), g.k())
            }
        }
    }
}

/// `(own + n1 + ... + nk) / (1 + k)`, summed left to right from `own`.
fn degroot(own: f64, neighbors: &[f64]) -> f64 {
    let total = neighbors.iter().fold(own, |acc, &x| acc + x);
    total / (1 + neighbors.len()) as f64
}

fn neighbor_mean(neighbors: &[f64]) -> f64 {
    neighbors.iter().sum::<f64>() / neighbors.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::Strategy;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn all_strategies() -> Vec<Strategy> {
        vec![
            Strategy::DeGroot,
            Strategy::stubborn(0.3).unwrap(),
            Strategy::susceptible(2.0).unwrap(),
            Strategy::diff_adaptive(0.7, 0.05).unwrap(),
            Strategy::variance_adaptive(0.7, 0.05).unwrap(),
        ]
    }

    #[test]
    fn test_degroot_equal_weights() {
        let s = Strategy::DeGroot;
        assert_eq!(s.compute_next_state(0.0, &[5.0, 10.0]), 5.0);
        assert_eq!(s.compute_next_state(1.0, &[2.0, 3.0, 6.0]), 3.0);
    }

    #[test]
    fn test_no_neighbors_returns_own_state() {
        for s in all_strategies() {
            assert_eq!(s.compute_next_state(3.25, &[]), 3.25, "{}", s);
        }
    }

    #[test]
    fn test_stubborn_formula() {
        let s = Strategy::stubborn(0.5).unwrap();
        assert_relative_eq!(s.compute_next_state(0.0, &[4.0, 8.0]), 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_fully_stubborn_never_moves() {
        let s = Strategy::stubborn(1.0).unwrap();
        assert_eq!(s.compute_next_state(7.0, &[0.0, 100.0, -3.0]), 7.0);
    }

    #[test]
    fn test_stubborn_zero_is_not_degroot() {
        // α = 0 adopts the neighbor mean and ignores self, unlike DeGroot
        let stubborn = Strategy::stubborn(0.0).unwrap();
        assert_eq!(stubborn.compute_next_state(0.0, &[10.0]), 10.0);
        assert_eq!(Strategy::DeGroot.compute_next_state(0.0, &[10.0]), 5.0);
    }

    #[test]
    fn test_susceptible_formula() {
        let s = Strategy::susceptible(4.0).unwrap();
        // 0.25 * 0 + 0.75 * 8
        assert_relative_eq!(s.compute_next_state(0.0, &[8.0]), 6.0, epsilon = 1e-12);
    }

    #[test]
    fn test_diff_adaptive_formula() {
        let s = Strategy::diff_adaptive(0.5, 0.1).unwrap();
        let beta_t = 0.5 * (-1.0f64).exp();
        assert_relative_eq!(s.compute_next_state(0.0, &[10.0]), beta_t * 10.0, epsilon = 1e-12);

        // Agreement with the neighbors gives the full gain
        assert_relative_eq!(s.compute_next_state(4.0, &[2.0, 6.0]), 4.0, epsilon = 1e-12);
    }

    #[test]
    fn test_variance_adaptive_formula() {
        let s = Strategy::variance_adaptive(0.7, 0.05).unwrap();
        // Unanimous neighbors: variance 0, weight = beta_max
        assert_relative_eq!(s.compute_next_state(0.0, &[10.0, 10.0]), 7.0, epsilon = 1e-12);

        // Neighbors [0, 10]: variance 25, weight 0.7 * e^-1.25
        let beta_t = 0.7 * (-1.25f64).exp();
        assert_relative_eq!(
            s.compute_next_state(2.0, &[0.0, 10.0]),
            (1.0 - beta_t) * 2.0 + beta_t * 5.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_parameter_validation() {
        assert!(matches!(Strategy::stubborn(1.5), Err(ConsensusError::InvalidParameter(_))));
        assert!(matches!(Strategy::stubborn(-0.1), Err(ConsensusError::InvalidParameter(_))));
        assert!(matches!(Strategy::stubborn(f64::NAN), Err(ConsensusError::InvalidParameter(_))));
        assert!(matches!(Strategy::susceptible(0.5), Err(ConsensusError::InvalidParameter(_))));
        assert!(matches!(Strategy::diff_adaptive(0.0, 0.1), Err(ConsensusError::InvalidParameter(_))));
        assert!(matches!(Strategy::diff_adaptive(1.2, 0.1), Err(ConsensusError::InvalidParameter(_))));
        assert!(matches!(Strategy::variance_adaptive(0.5, 0.0), Err(ConsensusError::InvalidParameter(_))));

        assert!(Strategy::stubborn(0.0).is_ok());
        assert!(Strategy::stubborn(1.0).is_ok());
        assert!(Strategy::susceptible(1.0).is_ok());
        assert!(Strategy::diff_adaptive(1.0, 0.01).is_ok());
    }

    #[test]
    fn test_from_kind_defaults_and_overrides() {
        let s = Strategy::from_kind(StrategyKind::Stubborn, &StrategyParams::new()).unwrap();
        assert_eq!(s, Strategy::stubborn(0.5).unwrap());

        let mut params = StrategyParams::new();
        params.insert("beta".into(), 3.0);
        let s = Strategy::from_name("susceptible", &params).unwrap();
        assert_eq!(s, Strategy::susceptible(3.0).unwrap());
        assert_eq!(s.params(), params);
    }

    #[test]
    fn test_from_kind_rejects_foreign_parameter() {
        let mut params = StrategyParams::new();
        params.insert("beta".into(), 2.0);
        let err = Strategy::from_kind(StrategyKind::Stubborn, &params).unwrap_err();
        assert!(matches!(err, ConsensusError::InvalidParameter(_)));
    }

    #[test]
    fn test_from_kind_validates_values() {
        let mut params = StrategyParams::new();
        params.insert("alpha".into(), 1.5);
        let err = Strategy::from_name("stubborn", &params).unwrap_err();
        assert!(matches!(err, ConsensusError::InvalidParameter(_)));
    }

    #[test]
    fn test_unknown_kind() {
        let err = Strategy::from_name("contrarian", &StrategyParams::new()).unwrap_err();
        assert_eq!(err, ConsensusError::UnknownKind("contrarian".into()));
    }

    #[test]
    fn test_kind_round_trip() {
        for kind in StrategyKind::all() {
            assert_eq!(kind.name().parse::<StrategyKind>().unwrap(), kind);
        }
        for s in all_strategies() {
            let rebuilt = Strategy::from_kind(s.kind(), &s.params()).unwrap();
            assert_eq!(rebuilt, s);
        }
    }

    #[test]
    fn test_kind_serde_uses_config_names() {
        for kind in StrategyKind::all() {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.name()));
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(Strategy::DeGroot.to_string(), "deGroot");
        assert_eq!(Strategy::stubborn(0.25).unwrap().to_string(), "stubborn(alpha=0.25)");
    }

    proptest! {
        #[test]
        fn prop_degroot_exact_average(
            own in -1e3f64..1e3,
            neighbors in proptest::collection::vec(-1e3f64..1e3, 0..12),
        ) {
            let mut total = own;
            for n in &neighbors {
                total += n;
            }
            let expected = total / (1.0 + neighbors.len() as f64);
            prop_assert_eq!(Strategy::DeGroot.compute_next_state(own, &neighbors), expected);
        }

        #[test]
        fn prop_susceptible_one_is_degroot_bitwise(
            own in -1e3f64..1e3,
            neighbors in proptest::collection::vec(-1e3f64..1e3, 0..12),
        ) {
            let susceptible = Strategy::susceptible(1.0).unwrap();
            prop_assert_eq!(
                susceptible.compute_next_state(own, &neighbors).to_bits(),
                Strategy::DeGroot.compute_next_state(own, &neighbors).to_bits()
            );
        }

        #[test]
        fn prop_next_state_within_input_hull(
            own in -1e3f64..1e3,
            neighbors in proptest::collection::vec(-1e3f64..1e3, 1..12),
            alpha in 0.0f64..=1.0,
            beta in 1.0f64..10.0,
        ) {
            let lo = neighbors.iter().copied().fold(own, f64::min) - 1e-9;
            let hi = neighbors.iter().copied().fold(own, f64::max) + 1e-9;
            for s in [
                Strategy::DeGroot,
                Strategy::stubborn(alpha).unwrap(),
                Strategy::susceptible(beta).unwrap(),
                Strategy::diff_adaptive(0.7, 0.05).unwrap(),
                Strategy::variance_adaptive(0.7, 0.05).unwrap(),
            ] {
                let next = s.compute_next_state(own, &neighbors);
                prop_assert!(next >= lo && next <= hi, "{} produced {}", s, next);
            }
        }
    }
}
