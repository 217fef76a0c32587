//! Weighted two-member ensemble

use super::{OneStepPredictor, SharedPredictor};
use anyhow::{bail, Context, Result};

/// Default weight of the first member (60%)
pub const DEFAULT_PRIMARY_WEIGHT: f64 = 0.6;

/// Combines two predictors as `weight · primary + (1 − weight) · secondary`.
///
/// Each member sees its own trailing context; the ensemble needs the longer
/// of the two.
pub struct WeightedEnsemble {
    name: String,
    primary: SharedPredictor,
    secondary: SharedPredictor,
    weight: f64,
}

impl WeightedEnsemble {
    pub fn new(
        name: impl Into<String>,
        primary: SharedPredictor,
        secondary: SharedPredictor,
        weight: f64,
    ) -> Result<Self> {
        if !(0.0..=1.0).contains(&weight) {
            bail!("ensemble weight must be within [0, 1], got {}", weight);
        }
        Ok(Self {
            name: name.into(),
            primary,
            secondary,
            weight,
        })
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }
}

fn tail(context: &[f64], len: usize) -> &[f64] {
    &context[context.len().saturating_sub(len)..]
}

impl OneStepPredictor for WeightedEnsemble {
    fn context_len(&self) -> usize {
        self.primary.context_len().max(self.secondary.context_len())
    }

    fn predict(&self, context: &[f64]) -> Result<f64> {
        // Members run one after the other
        let a = self
            .primary
            .predict(tail(context, self.primary.context_len()))
            .with_context(|| format!("ensemble member '{}' failed", self.primary.name()))?;
        let b = self
            .secondary
            .predict(tail(context, self.secondary.context_len()))
            .with_context(|| format!("ensemble member '{}' failed", self.secondary.name()))?;
        Ok(self.weight * a + (1.0 - self.weight) * b)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predictor::{from_fn, Persistence, WindowMean};
    use std::sync::Arc;

    #[test]
    fn test_weighted_average() {
        let ensemble = WeightedEnsemble::new(
            "hybrid",
            Arc::new(WindowMean::new(4)),
            Arc::new(Persistence),
            0.5,
        )
        .unwrap();
        assert_eq!(ensemble.context_len(), 4);
        // 0.5 * 2.5 + 0.5 * 4
        assert_eq!(ensemble.predict(&[1.0, 2.0, 3.0, 4.0]).unwrap(), 3.25);
    }

    #[test]
    fn test_rejects_out_of_range_weight() {
        let result = WeightedEnsemble::new(
            "hybrid",
            Arc::new(Persistence),
            Arc::new(Persistence),
            1.5,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_member_failure_is_named() {
        let failing = Arc::new(from_fn(1, |_| anyhow::bail!("session unavailable")));
        let ensemble =
            WeightedEnsemble::new("hybrid", Arc::new(Persistence), failing, DEFAULT_PRIMARY_WEIGHT)
                .unwrap();
        let err = ensemble.predict(&[1.0]).unwrap_err();
        let message = format!("{:#}", err);
        assert!(message.contains("ensemble member 'custom' failed"));
        assert!(message.contains("session unavailable"));
    }
}
