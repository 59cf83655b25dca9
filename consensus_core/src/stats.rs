//! Dispersion statistics over agent state vectors.
//!
//! All functions treat an empty slice as having zero spread and zero mean.

use nalgebra::DVector;

/// Offset added to the mean in the coefficient of variation to avoid
/// dividing by zero for fully converged windows.
pub const CV_EPSILON: f64 = 1e-8;

/// Arithmetic mean.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    DVector::from_column_slice(values).mean()
}

/// Population variance (divides by `n`, not `n - 1`).
///
/// Two-pass (centre, then square) so that nearly converged states near a
/// large common value do not lose their spread to cancellation. Exactly
/// uniform input returns exactly zero.
pub fn population_variance(values: &[f64]) -> f64 {
    let Some(&first) = values.first() else {
        return 0.0;
    };
    if values.iter().all(|&v| v == first) {
        return 0.0;
    }

    let states = DVector::from_column_slice(values);
    let centre = states.mean();
    states.add_scalar(-centre).norm_squared() / values.len() as f64
}

/// Population standard deviation of all agent states: the convergence signal.
pub fn dispersion(states: &[f64]) -> f64 {
    population_variance(states).max(0.0).sqrt()
}

/// Coefficient of variation: `std / (mean + CV_EPSILON)`.
pub fn coefficient_of_variation(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    dispersion(values) / (mean(values) + CV_EPSILON)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn test_dispersion_known_values() {
        assert_relative_eq!(dispersion(&[0.0, 5.0, 10.0]), (50.0f64 / 3.0).sqrt(), epsilon = 1e-12);
        assert_relative_eq!(dispersion(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_uniform_states_have_zero_dispersion() {
        assert_eq!(dispersion(&[5.0, 5.0, 5.0]), 0.0);
        assert_eq!(dispersion(&[0.3; 17]), 0.0);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(dispersion(&[]), 0.0);
        assert_eq!(coefficient_of_variation(&[]), 0.0);
    }

    #[test]
    fn test_coefficient_of_variation() {
        assert_relative_eq!(coefficient_of_variation(&[1.0, 3.0]), 0.5, epsilon = 1e-6);
        assert_eq!(coefficient_of_variation(&[4.0, 4.0]), 0.0);
    }

    proptest! {
        #[test]
        fn prop_dispersion_non_negative(values in proptest::collection::vec(-1e6f64..1e6, 1..50)) {
            prop_assert!(dispersion(&values) >= 0.0);
        }

        #[test]
        fn prop_dispersion_positive_when_states_differ(
            base in -1e3f64..1e3,
            delta in 1e-3f64..1e3,
            n in 2usize..20,
        ) {
            let mut values = vec![base; n];
            values[0] = base + delta;
            prop_assert!(dispersion(&values) > 0.0);
        }
    }
}
