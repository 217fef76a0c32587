//! Engine service
//!
//! Caller-side glue around the fitter and the forecaster: orders dated
//! history, clamps it, attaches dates to forecast steps, and records metrics
//! and structured events for every call.

use crate::error::{EngineError, EngineResult};
use crate::forecast::{backtest, forecast};
use crate::models::{DatedForecast, DatedValue, ForecastAccuracy, HistorySummary, Observation};
use crate::observability::{EngineMetrics, StructuredLogger};
use crate::predictor::OneStepPredictor;
use crate::regression::{self, FittedModel, RegressionMethod};
use chrono::Days;
use std::time::Instant;

/// Instrumented entry point used by the HTTP service and the CLI
#[derive(Clone)]
pub struct EngineService {
    metrics: EngineMetrics,
    logger: StructuredLogger,
}

impl EngineService {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            metrics: EngineMetrics::new(),
            logger: StructuredLogger::new(service_name),
        }
    }

    pub fn metrics(&self) -> &EngineMetrics {
        &self.metrics
    }

    pub fn logger(&self) -> &StructuredLogger {
        &self.logger
    }

    /// Fit a regression model, recording latency and outcome
    pub fn fit(&self, data: &[Observation], method: RegressionMethod) -> EngineResult<FittedModel> {
        let start = Instant::now();
        let result = regression::fit(data, method);
        let elapsed = start.elapsed();

        match &result {
            Ok(model) => {
                self.metrics.observe_fit(method.name(), elapsed.as_secs_f64());
                self.logger.log_fit(
                    method.name(),
                    data.len(),
                    model.r2(),
                    model.rmse(),
                    elapsed.as_secs_f64() * 1000.0,
                );
            }
            Err(e) => self.record_failure("fit", e),
        }
        result
    }

    /// Forecast `horizon` values past a plain window
    pub fn forecast<P>(&self, window: &[f64], predictor: &P, horizon: usize) -> EngineResult<Vec<f64>>
    where
        P: OneStepPredictor + ?Sized,
    {
        let start = Instant::now();
        let result = forecast(window, predictor, horizon);
        let elapsed = start.elapsed();

        match &result {
            Ok(_) => {
                self.metrics
                    .observe_forecast(predictor.name(), elapsed.as_secs_f64());
                self.logger.log_forecast(
                    predictor.name(),
                    window.len(),
                    horizon,
                    elapsed.as_secs_f64() * 1000.0,
                );
            }
            Err(e) => self.record_failure("forecast", e),
        }
        result
    }

    /// Forecast from dated history.
    ///
    /// History is sorted by date (ties keep their input order) and negative
    /// values are clamped to 0 before the whole of it is used as the window.
    /// Step `i` is dated `last_date + i` days.
    pub fn forecast_dated<P>(
        &self,
        history: &[DatedValue],
        predictor: &P,
        horizon: usize,
    ) -> EngineResult<DatedForecast>
    where
        P: OneStepPredictor + ?Sized,
    {
        let mut ordered = history.to_vec();
        ordered.sort_by_key(|p| p.date);
        let (first, last) = match (ordered.first(), ordered.last()) {
            (Some(first), Some(last)) => (first.date, last.date),
            _ => {
                let err = EngineError::InsufficientHistory {
                    required: predictor.context_len().max(1),
                    available: 0,
                };
                self.record_failure("forecast", &err);
                return Err(err);
            }
        };
        let window: Vec<f64> = ordered
            .iter()
            .map(|p| if p.value < 0.0 { 0.0 } else { p.value })
            .collect();

        let values = self.forecast(&window, predictor, horizon)?;

        let mut points = Vec::with_capacity(values.len());
        for (i, value) in values.into_iter().enumerate() {
            let date = last
                .checked_add_days(Days::new(i as u64 + 1))
                .ok_or_else(|| EngineError::invalid(format!("forecast date past {} is out of range", last)))?;
            points.push(DatedValue::new(date, value));
        }

        Ok(DatedForecast {
            points,
            history: HistorySummary {
                count: ordered.len(),
                start_date: first,
                end_date: last,
            },
        })
    }

    /// Score a hold-out forecast over the last `holdout` values
    pub fn backtest<P>(&self, series: &[f64], predictor: &P, holdout: usize) -> EngineResult<ForecastAccuracy>
    where
        P: OneStepPredictor + ?Sized,
    {
        let result = backtest(series, predictor, holdout);
        if let Err(e) = &result {
            self.record_failure("backtest", e);
        }
        result
    }

    fn record_failure(&self, operation: &str, error: &EngineError) {
        self.metrics.inc_errors(error.kind());
        self.logger
            .log_failure(operation, error.kind(), &error.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predictor::{Persistence, WindowMean};
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn test_forecast_dated_orders_and_clamps() {
        let service = EngineService::new("test");
        let history = vec![
            DatedValue::new(day(3), 6.0),
            DatedValue::new(day(1), -2.0),
            DatedValue::new(day(2), 3.0),
        ];
        let result = service
            .forecast_dated(&history, &WindowMean::new(3), 2)
            .unwrap();

        // Window is [0, 3, 6]
        assert_eq!(result.points[0], DatedValue::new(day(4), 3.0));
        assert_eq!(result.points[1].date, day(5));
        assert_eq!(result.points[1].value, 4.0);
        assert_eq!(
            result.history,
            HistorySummary {
                count: 3,
                start_date: day(1),
                end_date: day(3),
            }
        );
    }

    #[test]
    fn test_forecast_dated_empty_history() {
        let service = EngineService::new("test");
        let err = service.forecast_dated(&[], &Persistence, 3).unwrap_err();
        assert_eq!(
            err,
            EngineError::InsufficientHistory {
                required: 1,
                available: 0
            }
        );
    }

    #[test]
    fn test_dates_cross_month_end() {
        let service = EngineService::new("test");
        let history = vec![DatedValue::new(day(31), 5.0)];
        let result = service.forecast_dated(&history, &Persistence, 2).unwrap();
        assert_eq!(result.points[0].date, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(result.points[1].date, NaiveDate::from_ymd_opt(2024, 2, 2).unwrap());
    }

    #[test]
    fn test_failures_are_counted() {
        let service = EngineService::new("test");
        let before = service.metrics().errors_for("insufficient_history");
        let _ = service.forecast(&[1.0], &WindowMean::new(7), 3);
        assert!(service.metrics().errors_for("insufficient_history") > before);
    }

    #[test]
    fn test_fit_through_service() {
        let service = EngineService::new("test");
        let data = vec![Observation::new(1.0, 2.0), Observation::new(2.0, 4.0)];
        let model = service.fit(&data, RegressionMethod::Linear).unwrap();
        assert!((model.r2().unwrap() - 1.0).abs() < 1e-12);
    }
}
