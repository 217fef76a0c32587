//! Error taxonomy for fitting and forecasting
//!
//! Every failure the engine can report at its boundary is one of four kinds.
//! None of them are retried inside the engine.

use thiserror::Error;

/// Result alias used throughout the engine
pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// Errors surfaced by the regression fitter and the recursive forecaster
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// Malformed or insufficient caller-provided data
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Ill-conditioned or degenerate fit
    #[error("numerical failure: {0}")]
    NumericalFailure(String),

    /// Window shorter than the predictor's required context
    #[error("insufficient history: predictor needs {required} values, got {available}")]
    InsufficientHistory { required: usize, available: usize },

    /// The one-step predictor failed; the whole forecast is aborted
    #[error("predictor failure at step {step}: {reason}")]
    PredictorFailure { step: usize, reason: String },
}

impl EngineError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn numerical(message: impl Into<String>) -> Self {
        Self::NumericalFailure(message.into())
    }

    /// Stable tag for the error kind, used in API payloads and metric labels
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::NumericalFailure(_) => "numerical_failure",
            Self::InsufficientHistory { .. } => "insufficient_history",
            Self::PredictorFailure { .. } => "predictor_failure",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_tags() {
        assert_eq!(EngineError::invalid("x").kind(), "invalid_input");
        assert_eq!(EngineError::numerical("x").kind(), "numerical_failure");
        assert_eq!(
            EngineError::InsufficientHistory { required: 7, available: 3 }.kind(),
            "insufficient_history"
        );
        assert_eq!(
            EngineError::PredictorFailure { step: 1, reason: "boom".into() }.kind(),
            "predictor_failure"
        );
    }

    #[test]
    fn test_messages_name_the_constraint() {
        let err = EngineError::InsufficientHistory { required: 7, available: 3 };
        assert_eq!(
            err.to_string(),
            "insufficient history: predictor needs 7 values, got 3"
        );
        let err = EngineError::PredictorFailure { step: 2, reason: "model offline".into() };
        assert!(err.to_string().contains("step 2"));
    }
}
