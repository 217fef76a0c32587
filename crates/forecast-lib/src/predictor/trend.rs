//! Regression-backed trend predictor

use super::OneStepPredictor;
use crate::models::Observation;
use crate::regression::{self, RegressionMethod};
use anyhow::{bail, Result};

/// Fits a regression over the trailing context and extrapolates one step.
///
/// Context values are placed at x = 1..=len so the logarithmic and power
/// domains hold; the prediction is the fitted curve at x = len + 1. For a
/// moving average the prediction is the trailing-window mean.
#[derive(Debug, Clone)]
pub struct TrendPredictor {
    method: RegressionMethod,
    len: usize,
    name: String,
}

impl TrendPredictor {
    pub fn new(method: RegressionMethod, len: usize) -> Self {
        Self {
            method,
            len: len.max(2),
            name: format!("{}-trend", method.name()),
        }
    }

    pub fn method(&self) -> RegressionMethod {
        self.method
    }
}

impl OneStepPredictor for TrendPredictor {
    fn context_len(&self) -> usize {
        self.len
    }

    fn predict(&self, context: &[f64]) -> Result<f64> {
        if let RegressionMethod::MovingAverage { window } = self.method {
            if window == 0 || window > context.len() {
                bail!(
                    "moving-average window {} does not fit a context of {}",
                    window,
                    context.len()
                );
            }
            let tail = &context[context.len() - window..];
            return Ok(tail.iter().sum::<f64>() / window as f64);
        }

        let data: Vec<Observation> = context
            .iter()
            .enumerate()
            .map(|(i, &y)| Observation::new((i + 1) as f64, y))
            .collect();
        let model = regression::fit(&data, self.method)?;
        model
            .evaluate((context.len() + 1) as f64)
            .ok_or_else(|| anyhow::anyhow!("{} model cannot extrapolate", self.method.name()))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;

    #[test]
    fn test_linear_trend_extrapolates() {
        let p = TrendPredictor::new(RegressionMethod::Linear, 4);
        let next = p.predict(&[2.0, 4.0, 6.0, 8.0]).unwrap();
        assert!((next - 10.0).abs() < 1e-9);
        assert_eq!(p.name(), "linear-trend");
    }

    #[test]
    fn test_moving_average_trend() {
        let p = TrendPredictor::new(RegressionMethod::MovingAverage { window: 2 }, 4);
        assert_eq!(p.predict(&[1.0, 2.0, 3.0, 5.0]).unwrap(), 4.0);
    }

    #[test]
    fn test_domain_error_propagates() {
        let p = TrendPredictor::new(RegressionMethod::Exponential, 3);
        let err = p.predict(&[1.0, 0.0, 2.0]).unwrap_err();
        let engine = err.downcast_ref::<EngineError>().unwrap();
        assert!(matches!(engine, EngineError::InvalidInput(_)));
    }
}
