//! Observability infrastructure for the forecasting engine
//!
//! Provides:
//! - Prometheus metrics (fit latency, forecast latency, per-method and per-predictor counts, errors)
//! - Structured JSON logging with tracing

use prometheus::{
    register_histogram, register_int_counter_vec, register_int_gauge, Histogram, IntCounterVec,
    IntGauge,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Default histogram buckets for latency measurements (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<EngineMetricsInner> = OnceLock::new();

struct EngineMetricsInner {
    fit_latency_seconds: Histogram,
    forecast_latency_seconds: Histogram,
    fits_total: IntCounterVec,
    forecasts_total: IntCounterVec,
    errors_total: IntCounterVec,
    models_loaded: IntGauge,
}

impl EngineMetricsInner {
    fn new() -> Self {
        Self {
            fit_latency_seconds: register_histogram!(
                "forecast_engine_fit_latency_seconds",
                "Time spent fitting regression models",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register fit_latency_seconds"),

            forecast_latency_seconds: register_histogram!(
                "forecast_engine_forecast_latency_seconds",
                "Time spent producing recursive forecasts",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register forecast_latency_seconds"),

            fits_total: register_int_counter_vec!(
                "forecast_engine_fits_total",
                "Completed regression fits by method",
                &["method"]
            )
            .expect("Failed to register fits_total"),

            forecasts_total: register_int_counter_vec!(
                "forecast_engine_forecasts_total",
                "Completed forecasts by predictor",
                &["predictor"]
            )
            .expect("Failed to register forecasts_total"),

            errors_total: register_int_counter_vec!(
                "forecast_engine_errors_total",
                "Failed fits and forecasts by error kind",
                &["kind"]
            )
            .expect("Failed to register errors_total"),

            models_loaded: register_int_gauge!(
                "forecast_engine_models_loaded",
                "Number of predictors available in the registry"
            )
            .expect("Failed to register models_loaded"),
        }
    }
}

/// Engine metrics for Prometheus exposition
///
/// This is a lightweight handle to the global metrics instance.
/// Multiple clones share the same underlying metrics.
#[derive(Clone)]
pub struct EngineMetrics {
    _private: (),
}

impl Default for EngineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(EngineMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &EngineMetricsInner {
        GLOBAL_METRICS.get_or_init(EngineMetricsInner::new)
    }

    pub fn observe_fit(&self, method: &str, duration_secs: f64) {
        self.inner().fit_latency_seconds.observe(duration_secs);
        self.inner().fits_total.with_label_values(&[method]).inc();
    }

    pub fn observe_forecast(&self, predictor: &str, duration_secs: f64) {
        self.inner().forecast_latency_seconds.observe(duration_secs);
        self.inner()
            .forecasts_total
            .with_label_values(&[predictor])
            .inc();
    }

    /// Count a failure under its error kind tag
    pub fn inc_errors(&self, kind: &str) {
        self.inner().errors_total.with_label_values(&[kind]).inc();
    }

    pub fn set_models_loaded(&self, count: i64) {
        self.inner().models_loaded.set(count);
    }

    pub fn fits_for(&self, method: &str) -> u64 {
        self.inner().fits_total.with_label_values(&[method]).get()
    }

    pub fn errors_for(&self, kind: &str) -> u64 {
        self.inner().errors_total.with_label_values(&[kind]).get()
    }
}

/// Structured logger for engine events
///
/// Provides consistent JSON-formatted logging for fits, forecasts
/// and service lifecycle events.
#[derive(Clone)]
pub struct StructuredLogger {
    service_name: String,
}

impl StructuredLogger {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
        }
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Log a completed regression fit
    pub fn log_fit(&self, method: &str, points: usize, r2: Option<f64>, rmse: f64, elapsed_ms: f64) {
        info!(
            event = "fit_completed",
            service = %self.service_name,
            method = %method,
            points = points,
            r2 = ?r2,
            rmse = rmse,
            elapsed_ms = elapsed_ms,
            "Regression fit completed"
        );
    }

    /// Log a generated forecast
    pub fn log_forecast(&self, predictor: &str, history: usize, horizon: usize, elapsed_ms: f64) {
        info!(
            event = "forecast_generated",
            service = %self.service_name,
            predictor = %predictor,
            history = history,
            horizon = horizon,
            elapsed_ms = elapsed_ms,
            "Forecast generated"
        );
    }

    /// Log a failed fit or forecast
    pub fn log_failure(&self, operation: &str, kind: &str, details: &str) {
        warn!(
            event = "forecast_failed",
            service = %self.service_name,
            operation = %operation,
            kind = %kind,
            details = %details,
            "Engine operation failed"
        );
    }

    /// Log a model registered from disk
    pub fn log_model_loaded(&self, key: &str, name: &str) {
        info!(
            event = "model_loaded",
            service = %self.service_name,
            key = %key,
            name = %name,
            "Predictor registered"
        );
    }

    /// Log service startup
    pub fn log_startup(&self, version: &str, models: usize) {
        info!(
            event = "service_started",
            service = %self.service_name,
            version = %version,
            models = models,
            "Forecast service started"
        );
    }

    /// Log service shutdown
    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "service_shutdown",
            service = %self.service_name,
            reason = %reason,
            "Forecast service shutting down"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_metrics_creation() {
        let metrics = EngineMetrics::new();
        let before = metrics.fits_for("linear");

        metrics.observe_fit("linear", 0.001);
        metrics.observe_forecast("mean", 0.002);
        metrics.inc_errors("invalid_input");
        metrics.set_models_loaded(4);

        assert!(metrics.fits_for("linear") > before);
        assert!(metrics.errors_for("invalid_input") >= 1);
    }

    #[test]
    fn test_structured_logger_creation() {
        let logger = StructuredLogger::new("test-service");
        assert_eq!(logger.service_name(), "test-service");
    }
}
