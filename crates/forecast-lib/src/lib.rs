//! Curve fitting and recursive forecasting engine
//!
//! This crate provides the core functionality for:
//! - Least-squares regression (linear, polynomial, exponential, power, logarithmic, moving average)
//! - Recursive multi-step forecasting with pluggable one-step predictors
//! - Heuristic, regression-backed, ONNX and ensemble predictors
//! - Metrics and structured logging

pub mod error;
pub mod forecast;
pub mod models;
pub mod observability;
pub mod predictor;
pub mod regression;
pub mod service;
pub mod validation;

pub use error::{EngineError, EngineResult};
pub use forecast::{backtest, forecast, MAX_HORIZON};
pub use models::*;
pub use observability::{EngineMetrics, StructuredLogger};
pub use predictor::{ModelRegistry, OneStepPredictor, SharedPredictor};
pub use regression::{fit, FittedModel, RegressionMethod};
pub use service::EngineService;
