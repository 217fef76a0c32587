//! Recursive multi-step forecasting
//!
//! A one-step predictor is applied repeatedly: each prediction is clamped to
//! be non-negative and appended to a private working copy of the window, so
//! later steps see earlier predictions as history. Errors compound across
//! steps.

use crate::error::{EngineError, EngineResult};
use crate::models::ForecastAccuracy;
use crate::predictor::OneStepPredictor;
use crate::regression::{mean_absolute_error, root_mean_squared_error};
use crate::validation::check_finite_series;
use tracing::debug;

/// Longest horizon accepted by [`forecast`]
pub const MAX_HORIZON: usize = 30;

/// Forecast `horizon` values past the end of `window`.
///
/// The predictor receives its last `context_len()` values at every step.
/// Negative predictions become 0 before they are fed back. A predictor error
/// or a non-finite prediction aborts the whole forecast.
pub fn forecast<P>(window: &[f64], predictor: &P, horizon: usize) -> EngineResult<Vec<f64>>
where
    P: OneStepPredictor + ?Sized,
{
    if horizon > MAX_HORIZON {
        return Err(EngineError::invalid(format!(
            "horizon must be between 1 and {}, got {}",
            MAX_HORIZON, horizon
        )));
    }
    check_finite_series(window, "history")?;

    let required = predictor.context_len();
    if window.len() < required {
        return Err(EngineError::InsufficientHistory {
            required,
            available: window.len(),
        });
    }
    if horizon == 0 {
        return Ok(Vec::new());
    }

    let mut working = Vec::with_capacity(window.len() + horizon);
    working.extend_from_slice(window);
    let mut output = Vec::with_capacity(horizon);

    for step in 1..=horizon {
        let context = &working[working.len() - required..];
        let raw = predictor
            .predict(context)
            .map_err(|e| EngineError::PredictorFailure {
                step,
                reason: format!("{:#}", e),
            })?;
        if !raw.is_finite() {
            return Err(EngineError::PredictorFailure {
                step,
                reason: format!("predictor '{}' returned {}", predictor.name(), raw),
            });
        }

        let value = if raw < 0.0 { 0.0 } else { raw };
        working.push(value);
        output.push(value);
    }

    debug!(
        predictor = predictor.name(),
        horizon = horizon,
        window = window.len(),
        "Recursive forecast completed"
    );
    Ok(output)
}

/// Forecast the last `holdout` values of `series` from the values before
/// them and score the result against what actually happened.
pub fn backtest<P>(series: &[f64], predictor: &P, holdout: usize) -> EngineResult<ForecastAccuracy>
where
    P: OneStepPredictor + ?Sized,
{
    if holdout == 0 {
        return Err(EngineError::invalid("holdout must be at least 1"));
    }
    if holdout >= series.len() {
        return Err(EngineError::invalid(format!(
            "holdout of {} leaves no history in a series of {}",
            holdout,
            series.len()
        )));
    }

    let split = series.len() - holdout;
    let (history, actual) = series.split_at(split);
    let predicted = forecast(history, predictor, holdout)?;

    Ok(ForecastAccuracy {
        holdout,
        mae: mean_absolute_error(actual, &predicted),
        rmse: root_mean_squared_error(actual, &predicted),
        mape: mean_absolute_percentage_error(actual, &predicted),
        predicted,
        actual: actual.to_vec(),
    })
}

/// MAPE in percent over the non-zero actuals
fn mean_absolute_percentage_error(actual: &[f64], predicted: &[f64]) -> Option<f64> {
    let errors: Vec<f64> = actual
        .iter()
        .zip(predicted)
        .filter(|(y, _)| **y != 0.0)
        .map(|(y, y_hat)| ((y - y_hat) / y).abs())
        .collect();
    if errors.is_empty() {
        return None;
    }
    Some(errors.iter().sum::<f64>() / errors.len() as f64 * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predictor::{from_fn, Persistence, WindowMean};

    fn mean(values: &[f64]) -> f64 {
        values.iter().sum::<f64>() / values.len() as f64
    }

    #[test]
    fn test_mean_predictor_feeds_back() {
        let window = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0];
        let values = forecast(&window, &WindowMean::new(7), 3).unwrap();

        let first = mean(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
        let second = mean(&[2.0, 3.0, 4.0, 5.0, 6.0, 7.0, first]);
        let third = mean(&[3.0, 4.0, 5.0, 6.0, 7.0, first, second]);
        assert_eq!(first, 4.0);
        assert_eq!(values, vec![first, second, third]);
    }

    #[test]
    fn test_negative_predictions_clamped_and_fed_back() {
        let seen = std::sync::Mutex::new(Vec::new());
        let predictor = from_fn(2, |context: &[f64]| {
            seen.lock().unwrap().push(context.to_vec());
            Ok(-5.0)
        });
        let values = forecast(&[3.0, 4.0], &predictor, 3).unwrap();
        assert_eq!(values, vec![0.0, 0.0, 0.0]);

        let seen = seen.into_inner().unwrap();
        assert_eq!(seen[0], vec![3.0, 4.0]);
        assert_eq!(seen[1], vec![4.0, 0.0]);
        assert_eq!(seen[2], vec![0.0, 0.0]);
    }

    #[test]
    fn test_zero_horizon_is_empty() {
        let values = forecast(&[1.0, 2.0], &Persistence, 0).unwrap();
        assert!(values.is_empty());
    }

    #[test]
    fn test_zero_horizon_still_checks_history() {
        let err = forecast(&[1.0, 2.0], &WindowMean::new(7), 0).unwrap_err();
        assert!(matches!(err, EngineError::InsufficientHistory { .. }));
    }

    #[test]
    fn test_short_window() {
        let err = forecast(&[1.0, 2.0, 3.0], &WindowMean::new(7), 5).unwrap_err();
        assert_eq!(
            err,
            EngineError::InsufficientHistory {
                required: 7,
                available: 3
            }
        );
    }

    #[test]
    fn test_horizon_above_maximum() {
        let err = forecast(&[1.0], &Persistence, MAX_HORIZON + 1).unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(_)));
        assert_eq!(forecast(&[1.0], &Persistence, MAX_HORIZON).unwrap().len(), 30);
    }

    #[test]
    fn test_predictor_failure_reports_step() {
        let calls = std::sync::atomic::AtomicUsize::new(0);
        let predictor = from_fn(1, |context: &[f64]| {
            if calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst) == 2 {
                anyhow::bail!("model unavailable");
            }
            Ok(context[0] + 1.0)
        });
        let err = forecast(&[1.0], &predictor, 5).unwrap_err();
        match err {
            EngineError::PredictorFailure { step, reason } => {
                assert_eq!(step, 3);
                assert!(reason.contains("model unavailable"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_non_finite_prediction_is_failure() {
        let predictor = from_fn(1, |_: &[f64]| Ok(f64::NAN));
        let err = forecast(&[1.0], &predictor, 2).unwrap_err();
        assert!(matches!(err, EngineError::PredictorFailure { step: 1, .. }));
    }

    #[test]
    fn test_non_finite_history_rejected() {
        let err = forecast(&[1.0, f64::INFINITY], &Persistence, 1).unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(_)));
    }

    #[test]
    fn test_backtest_persistence() {
        let series = [1.0, 2.0, 4.0, 0.0, 8.0];
        let accuracy = backtest(&series, &Persistence, 2).unwrap();
        assert_eq!(accuracy.predicted, vec![4.0, 4.0]);
        assert_eq!(accuracy.actual, vec![0.0, 8.0]);
        assert_eq!(accuracy.mae, 4.0);
        assert_eq!(accuracy.rmse, 4.0);
        // Only the non-zero actual is scored
        assert_eq!(accuracy.mape, Some(50.0));
    }

    #[test]
    fn test_backtest_rejects_bad_holdout() {
        assert!(backtest(&[1.0, 2.0], &Persistence, 0).is_err());
        assert!(backtest(&[1.0, 2.0], &Persistence, 2).is_err());
    }
}
