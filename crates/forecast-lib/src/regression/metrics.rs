//! Goodness-of-fit metrics

use serde::{Deserialize, Serialize};

/// R², MAE and RMSE for a set of (actual, predicted) pairs
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitMetrics {
    /// Coefficient of determination; `None` when undefined (constant actuals
    /// that the model does not reproduce exactly)
    pub r2: Option<f64>,
    pub mae: f64,
    pub rmse: f64,
}

impl FitMetrics {
    /// Compute all three metrics. `actual` and `predicted` must be the same
    /// non-zero length.
    pub fn compute(actual: &[f64], predicted: &[f64]) -> Self {
        Self {
            r2: r_squared(actual, predicted),
            mae: mean_absolute_error(actual, predicted),
            rmse: root_mean_squared_error(actual, predicted),
        }
    }

    pub fn is_finite(&self) -> bool {
        self.mae.is_finite() && self.rmse.is_finite() && self.r2.map_or(true, f64::is_finite)
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn residual_sum_of_squares(actual: &[f64], predicted: &[f64]) -> f64 {
    actual
        .iter()
        .zip(predicted)
        .map(|(y, y_hat)| (y - y_hat).powi(2))
        .sum()
}

/// R² = 1 − SS_res / SS_tot.
///
/// With constant actuals SS_tot is zero: the result is 1 when the
/// predictions reproduce the actuals up to rounding and `None` otherwise.
pub fn r_squared(actual: &[f64], predicted: &[f64]) -> Option<f64> {
    let ss_res = residual_sum_of_squares(actual, predicted);
    let constant = actual.iter().all(|&y| y == actual[0]);
    if constant {
        let scale: f64 = actual.iter().map(|y| y * y).sum();
        return if ss_res <= f64::EPSILON * scale {
            Some(1.0)
        } else {
            None
        };
    }
    let y_mean = mean(actual);
    let ss_tot: f64 = actual.iter().map(|y| (y - y_mean).powi(2)).sum();
    Some(1.0 - ss_res / ss_tot)
}

pub fn mean_absolute_error(actual: &[f64], predicted: &[f64]) -> f64 {
    let total: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(y, y_hat)| (y - y_hat).abs())
        .sum();
    total / actual.len() as f64
}

pub fn root_mean_squared_error(actual: &[f64], predicted: &[f64]) -> f64 {
    (residual_sum_of_squares(actual, predicted) / actual.len() as f64).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_fit() {
        let y = [1.0, 2.0, 3.0];
        let m = FitMetrics::compute(&y, &y);
        assert_eq!(m.r2, Some(1.0));
        assert_eq!(m.mae, 0.0);
        assert_eq!(m.rmse, 0.0);
    }

    #[test]
    fn test_known_values() {
        let actual = [1.0, 2.0, 3.0, 4.0];
        let predicted = [1.5, 2.0, 2.5, 4.0];
        let m = FitMetrics::compute(&actual, &predicted);
        // SS_res = 0.5, SS_tot = 5
        assert!((m.r2.unwrap() - 0.9).abs() < 1e-12);
        assert!((m.mae - 0.25).abs() < 1e-12);
        assert!((m.rmse - 0.125_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_constant_actuals_exact_prediction() {
        assert_eq!(r_squared(&[0.1, 0.1, 0.1], &[0.1, 0.1, 0.1]), Some(1.0));
    }

    #[test]
    fn test_constant_actuals_rounding_error_is_exact() {
        // 0.1 + 0.1 + 0.1 over 3 is one ulp above 0.1
        let predicted = [(0.1 + 0.1 + 0.1) / 3.0; 2];
        assert_ne!(predicted[0], 0.1);
        assert_eq!(r_squared(&[0.1, 0.1], &predicted), Some(1.0));
        assert_eq!(r_squared(&[0.0, 0.0], &[0.0, 0.0]), Some(1.0));
    }

    #[test]
    fn test_constant_actuals_inexact_prediction_is_undefined() {
        let m = FitMetrics::compute(&[5.0, 5.0], &[4.0, 6.0]);
        assert_eq!(m.r2, None);
        assert_eq!(m.mae, 1.0);
        assert!(m.is_finite());
    }
}
