//! Input validation shared by the fitter, the forecaster and the API layers

use crate::error::{EngineError, EngineResult};
use crate::models::Observation;

/// Minimum number of observations for any fit
pub const MIN_OBSERVATIONS: usize = 2;

/// Reject datasets that are too small or contain non-finite coordinates
pub fn check_observations(data: &[Observation]) -> EngineResult<()> {
    if data.len() < MIN_OBSERVATIONS {
        return Err(EngineError::invalid(format!(
            "at least {} data points are required for regression, got {}",
            MIN_OBSERVATIONS,
            data.len()
        )));
    }
    if let Some(idx) = data
        .iter()
        .position(|o| !o.x.is_finite() || !o.y.is_finite())
    {
        return Err(EngineError::invalid(format!(
            "data point at index {} has a non-finite x or y value",
            idx
        )));
    }
    Ok(())
}

/// Reject series containing NaN or infinite values
pub fn check_finite_series(values: &[f64], what: &str) -> EngineResult<()> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(idx) => Err(EngineError::invalid(format!(
            "{} value at index {} is not finite",
            what, idx
        ))),
        None => Ok(()),
    }
}

/// Convert a JSON-style number into a non-negative whole count.
///
/// Counts such as horizons, degrees and windows arrive as floating point
/// numbers at the API boundary; fractional, negative or non-finite values are
/// `InvalidInput`.
pub fn whole_number(value: f64, what: &str) -> EngineResult<usize> {
    if !value.is_finite() || value < 0.0 || value.fract() != 0.0 {
        return Err(EngineError::invalid(format!(
            "{} must be a non-negative integer, got {}",
            what, value
        )));
    }
    if value > u32::MAX as f64 {
        return Err(EngineError::invalid(format!("{} is too large: {}", what, value)));
    }
    Ok(value as usize)
}
