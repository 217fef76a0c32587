//! One-step predictors
//!
//! The recursive forecaster only needs one capability: map a fixed-length
//! trailing context to one predicted value. Everything that can do that
//! implements [`OneStepPredictor`]: simple heuristics, a regression-backed
//! trend predictor, ONNX models run through tract, and weighted ensembles.

mod ensemble;
mod features;
mod heuristic;
mod inference;
mod registry;
mod trend;

pub use ensemble::{WeightedEnsemble, DEFAULT_PRIMARY_WEIGHT};
pub use features::{rolling_stats, tabular_features, RollingStats, NUM_TABULAR_FEATURES, SEQUENCE_LEN};
pub use heuristic::{MeanReversion, Persistence, WindowMean, DEFAULT_REVERSION_STRENGTH};
pub use inference::{InferenceStats, OnnxPredictor, MAX_INFERENCE_MS};
pub use registry::{
    CatalogEntry, FeatureScaler, InputLayout, ModelRegistry, ModelSpec, TargetScaler,
    DEFAULT_CONTEXT_LEN,
};
pub use trend::TrendPredictor;

use anyhow::Result;
use std::sync::Arc;

/// Trait for one-step prediction implementations
pub trait OneStepPredictor: Send + Sync {
    /// Number of trailing values the predictor consumes
    fn context_len(&self) -> usize;

    /// Predict the next value from exactly `context_len()` trailing values
    fn predict(&self, context: &[f64]) -> Result<f64>;

    /// Short name used in logs and metric labels
    fn name(&self) -> &str {
        "custom"
    }
}

impl<P: OneStepPredictor + ?Sized> OneStepPredictor for Box<P> {
    fn context_len(&self) -> usize {
        (**self).context_len()
    }

    fn predict(&self, context: &[f64]) -> Result<f64> {
        (**self).predict(context)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

impl<P: OneStepPredictor + ?Sized> OneStepPredictor for Arc<P> {
    fn context_len(&self) -> usize {
        (**self).context_len()
    }

    fn predict(&self, context: &[f64]) -> Result<f64> {
        (**self).predict(context)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Predictor backed by a plain function or closure
pub struct FnPredictor<F> {
    name: String,
    context_len: usize,
    f: F,
}

impl<F> FnPredictor<F>
where
    F: Fn(&[f64]) -> Result<f64> + Send + Sync,
{
    pub fn new(name: impl Into<String>, context_len: usize, f: F) -> Self {
        Self {
            name: name.into(),
            context_len,
            f,
        }
    }
}

impl<F> OneStepPredictor for FnPredictor<F>
where
    F: Fn(&[f64]) -> Result<f64> + Send + Sync,
{
    fn context_len(&self) -> usize {
        self.context_len
    }

    fn predict(&self, context: &[f64]) -> Result<f64> {
        (self.f)(context)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Wrap a closure as a predictor with the given context length
pub fn from_fn<F>(context_len: usize, f: F) -> FnPredictor<F>
where
    F: Fn(&[f64]) -> Result<f64> + Send + Sync,
{
    FnPredictor::new("custom", context_len, f)
}

/// Shared, type-erased predictor handle
pub type SharedPredictor = Arc<dyn OneStepPredictor>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fn_predictor() {
        let p = from_fn(2, |ctx| Ok(ctx[0] + ctx[1]));
        assert_eq!(p.context_len(), 2);
        assert_eq!(p.predict(&[1.0, 2.0]).unwrap(), 3.0);
        assert_eq!(p.name(), "custom");
    }

    #[test]
    fn test_boxed_and_shared_delegate() {
        let boxed: Box<dyn OneStepPredictor> = Box::new(WindowMean::new(3));
        assert_eq!(boxed.context_len(), 3);
        assert_eq!(boxed.name(), "mean");

        let shared: SharedPredictor = Arc::new(Persistence);
        assert_eq!(shared.predict(&[4.0]).unwrap(), 4.0);
    }
}
