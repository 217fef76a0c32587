//! Heuristic predictors
//!
//! Deterministic baselines used when no trained model is available.

use super::OneStepPredictor;
use anyhow::Result;

/// Default pull towards the window mean for [`MeanReversion`]
pub const DEFAULT_REVERSION_STRENGTH: f64 = 0.5;

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Predicts the mean of the trailing window
#[derive(Debug, Clone)]
pub struct WindowMean {
    len: usize,
}

impl WindowMean {
    pub fn new(len: usize) -> Self {
        Self { len: len.max(1) }
    }
}

impl OneStepPredictor for WindowMean {
    fn context_len(&self) -> usize {
        self.len
    }

    fn predict(&self, context: &[f64]) -> Result<f64> {
        Ok(mean(context))
    }

    fn name(&self) -> &str {
        "mean"
    }
}

/// Predicts the last observed value
#[derive(Debug, Clone, Copy)]
pub struct Persistence;

impl OneStepPredictor for Persistence {
    fn context_len(&self) -> usize {
        1
    }

    fn predict(&self, context: &[f64]) -> Result<f64> {
        context
            .last()
            .copied()
            .ok_or_else(|| anyhow::anyhow!("empty context"))
    }

    fn name(&self) -> &str {
        "persistence"
    }
}

/// Moves the last value part of the way towards the window mean:
/// `last + strength · (mean − last)`
#[derive(Debug, Clone)]
pub struct MeanReversion {
    len: usize,
    strength: f64,
}

impl MeanReversion {
    pub fn new(len: usize, strength: f64) -> Self {
        Self {
            len: len.max(1),
            strength: strength.clamp(0.0, 1.0),
        }
    }

    pub fn strength(&self) -> f64 {
        self.strength
    }
}

impl OneStepPredictor for MeanReversion {
    fn context_len(&self) -> usize {
        self.len
    }

    fn predict(&self, context: &[f64]) -> Result<f64> {
        let last = context
            .last()
            .copied()
            .ok_or_else(|| anyhow::anyhow!("empty context"))?;
        Ok(last + self.strength * (mean(context) - last))
    }

    fn name(&self) -> &str {
        "mean-reversion"
    }
}
