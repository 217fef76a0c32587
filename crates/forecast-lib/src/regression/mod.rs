//! Regression fitting
//!
//! Fits one of six closed-form models to an (x, y) dataset and reports
//! R², MAE and RMSE. Linear and the log-transformed models (exponential,
//! power, logarithmic) are ordinary least squares on a transformed basis;
//! polynomial fits solve the full normal equations. Moving average has no
//! coefficients and is scored on the points that have a full trailing window.

mod formula;
mod metrics;
mod solver;

pub use metrics::{mean_absolute_error, r_squared, root_mean_squared_error, FitMetrics};
pub use solver::{polynomial_least_squares, solve_linear_system, SINGULAR_TOLERANCE};

use crate::error::{EngineError, EngineResult};
use crate::models::Observation;
use crate::validation::check_observations;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Smallest polynomial degree accepted
pub const MIN_POLYNOMIAL_DEGREE: usize = 2;

/// Largest polynomial degree accepted
pub const MAX_POLYNOMIAL_DEGREE: usize = 6;

/// Degree used when a polynomial fit is requested without one
pub const DEFAULT_POLYNOMIAL_DEGREE: usize = 2;

/// Regression method together with its method-specific parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum RegressionMethod {
    /// y = a + b·x
    Linear,
    /// y = Σ aᵢ·xⁱ for i in 0..=degree
    Polynomial { degree: usize },
    /// y = a·e^(b·x)
    Exponential,
    /// y = a·x^b
    Power,
    /// y = a + b·ln(x)
    Logarithmic,
    /// ŷₜ = mean of the trailing `window` values of y
    MovingAverage { window: usize },
}

impl RegressionMethod {
    pub const NAMES: [&'static str; 6] = [
        "linear",
        "polynomial",
        "exponential",
        "power",
        "logarithmic",
        "moving-average",
    ];

    /// Parse a method name plus its optional integer parameter.
    ///
    /// The parameter is the degree for `polynomial` (defaults to 2) and the
    /// window for `moving-average` (required). Other methods ignore it.
    pub fn from_name(name: &str, parameter: Option<usize>) -> EngineResult<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "linear" => Ok(Self::Linear),
            "polynomial" => Ok(Self::Polynomial {
                degree: parameter.unwrap_or(DEFAULT_POLYNOMIAL_DEGREE),
            }),
            "exponential" => Ok(Self::Exponential),
            "power" => Ok(Self::Power),
            "logarithmic" => Ok(Self::Logarithmic),
            "moving-average" | "moving_average" => match parameter {
                Some(window) => Ok(Self::MovingAverage { window }),
                None => Err(EngineError::invalid(
                    "moving-average requires a window size",
                )),
            },
            other => Err(EngineError::invalid(format!(
                "unknown regression type '{}', expected one of: {}",
                other,
                Self::NAMES.join(", ")
            ))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::Polynomial { .. } => "polynomial",
            Self::Exponential => "exponential",
            Self::Power => "power",
            Self::Logarithmic => "logarithmic",
            Self::MovingAverage { .. } => "moving-average",
        }
    }

    /// Degree or window size, when the method has one
    pub fn parameter(&self) -> Option<usize> {
        match self {
            Self::Polynomial { degree } => Some(*degree),
            Self::MovingAverage { window } => Some(*window),
            _ => None,
        }
    }

    /// Check the method parameter and the method's domain constraint
    fn check_domain(&self, data: &[Observation]) -> EngineResult<()> {
        match *self {
            Self::Linear => Ok(()),
            Self::Polynomial { degree } => {
                if !(MIN_POLYNOMIAL_DEGREE..=MAX_POLYNOMIAL_DEGREE).contains(&degree) {
                    return Err(EngineError::invalid(format!(
                        "polynomial degree must be between {} and {}, got {}",
                        MIN_POLYNOMIAL_DEGREE, MAX_POLYNOMIAL_DEGREE, degree
                    )));
                }
                if data.len() < degree + 1 {
                    return Err(EngineError::invalid(format!(
                        "at least {} data points are required for polynomial regression of degree {}, got {}",
                        degree + 1,
                        degree,
                        data.len()
                    )));
                }
                Ok(())
            }
            Self::Exponential => require_positive(data, "y", |o| o.y, "exponential"),
            Self::Power => {
                require_positive(data, "x", |o| o.x, "power")?;
                require_positive(data, "y", |o| o.y, "power")
            }
            Self::Logarithmic => require_positive(data, "x", |o| o.x, "logarithmic"),
            Self::MovingAverage { window } => {
                if window == 0 || window > data.len() {
                    return Err(EngineError::invalid(format!(
                        "moving-average window must be between 1 and the dataset length {}, got {}",
                        data.len(),
                        window
                    )));
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for RegressionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Polynomial { degree } => write!(f, "polynomial (degree {})", degree),
            Self::MovingAverage { window } => write!(f, "moving-average (window {})", window),
            other => f.write_str(other.name()),
        }
    }
}

fn require_positive(
    data: &[Observation],
    axis: &str,
    value: impl Fn(&Observation) -> f64,
    method: &str,
) -> EngineResult<()> {
    match data.iter().position(|o| value(o) <= 0.0) {
        Some(idx) => Err(EngineError::invalid(format!(
            "{} regression requires all {} > 0, but data point {} has {} = {}",
            method,
            axis,
            idx,
            axis,
            value(&data[idx])
        ))),
        None => Ok(()),
    }
}

/// A fitted regression model. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FittedModel {
    #[serde(flatten)]
    method: RegressionMethod,
    formula: String,
    coefficients: Vec<f64>,
    #[serde(flatten)]
    metrics: FitMetrics,
    /// Prediction for each input, in input order; `None` where a moving
    /// average has no full window yet
    predictions: Vec<Option<f64>>,
}

impl FittedModel {
    pub fn method(&self) -> RegressionMethod {
        self.method
    }

    pub fn formula(&self) -> &str {
        &self.formula
    }

    /// Coefficients in method order: `[a, b]` for the two-parameter models,
    /// lowest power first for polynomials, empty for moving average
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    pub fn metrics(&self) -> &FitMetrics {
        &self.metrics
    }

    pub fn r2(&self) -> Option<f64> {
        self.metrics.r2
    }

    pub fn mae(&self) -> f64 {
        self.metrics.mae
    }

    pub fn rmse(&self) -> f64 {
        self.metrics.rmse
    }

    pub fn predictions(&self) -> &[Option<f64>] {
        &self.predictions
    }

    /// Evaluate the fitted formula at `x`.
    ///
    /// Returns `None` for moving average, which depends on the neighbouring
    /// observations rather than on x.
    pub fn evaluate(&self, x: f64) -> Option<f64> {
        evaluate(self.method, &self.coefficients, x)
    }
}

fn evaluate(method: RegressionMethod, c: &[f64], x: f64) -> Option<f64> {
    let value = match method {
        RegressionMethod::Linear => c[0] + c[1] * x,
        RegressionMethod::Polynomial { .. } => c.iter().rev().fold(0.0, |acc, &ci| acc * x + ci),
        RegressionMethod::Exponential => c[0] * (c[1] * x).exp(),
        RegressionMethod::Power => c[0] * x.powf(c[1]),
        RegressionMethod::Logarithmic => c[0] + c[1] * x.ln(),
        RegressionMethod::MovingAverage { .. } => return None,
    };
    Some(value)
}

/// Fit `method` to `data`.
///
/// Fails with `InvalidInput` for fewer than two points, non-finite points,
/// a bad method parameter or a violated domain constraint, and with
/// `NumericalFailure` when the normal equations are singular or the fit
/// yields non-finite values.
pub fn fit(data: &[Observation], method: RegressionMethod) -> EngineResult<FittedModel> {
    check_observations(data)?;
    method.check_domain(data)?;

    let model = match method {
        RegressionMethod::MovingAverage { window } => fit_moving_average(data, window),
        _ => fit_parametric(data, method)?,
    };

    if !model.metrics.is_finite() {
        return Err(EngineError::numerical(format!(
            "{} fit produced non-finite error metrics",
            method.name()
        )));
    }

    debug!(
        method = %method,
        points = data.len(),
        r2 = ?model.metrics.r2,
        rmse = model.metrics.rmse,
        "Regression fitted"
    );
    Ok(model)
}

fn fit_parametric(data: &[Observation], method: RegressionMethod) -> EngineResult<FittedModel> {
    let xs: Vec<f64> = data.iter().map(|o| o.x).collect();
    let ys: Vec<f64> = data.iter().map(|o| o.y).collect();

    let (coefficients, formula) = match method {
        RegressionMethod::Linear => {
            let c = polynomial_least_squares(&xs, &ys, 1)?;
            let formula = formula::linear(c[0], c[1]);
            (c, formula)
        }
        RegressionMethod::Polynomial { degree } => {
            let c = polynomial_least_squares(&xs, &ys, degree)?;
            let formula = formula::polynomial(&c);
            (c, formula)
        }
        RegressionMethod::Exponential => {
            // ln y = ln a + b·x
            let ln_y: Vec<f64> = ys.iter().map(|y| y.ln()).collect();
            let c = polynomial_least_squares(&xs, &ln_y, 1)?;
            let a = exp_intercept(c[0], "exponential")?;
            (vec![a, c[1]], formula::exponential(a, c[1]))
        }
        RegressionMethod::Power => {
            // ln y = ln a + b·ln x
            let ln_x: Vec<f64> = xs.iter().map(|x| x.ln()).collect();
            let ln_y: Vec<f64> = ys.iter().map(|y| y.ln()).collect();
            let c = polynomial_least_squares(&ln_x, &ln_y, 1)?;
            let a = exp_intercept(c[0], "power")?;
            (vec![a, c[1]], formula::power(a, c[1]))
        }
        RegressionMethod::Logarithmic => {
            // y = a + b·ln x
            let ln_x: Vec<f64> = xs.iter().map(|x| x.ln()).collect();
            let c = polynomial_least_squares(&ln_x, &ys, 1)?;
            let formula = formula::logarithmic(c[0], c[1]);
            (c, formula)
        }
        RegressionMethod::MovingAverage { .. } => {
            unreachable!("moving average is fitted separately")
        }
    };

    let mut predicted = Vec::with_capacity(xs.len());
    for &x in &xs {
        match evaluate(method, &coefficients, x) {
            Some(v) if v.is_finite() => predicted.push(v),
            _ => {
                return Err(EngineError::numerical(format!(
                    "{} model is not finite at x = {}",
                    method.name(),
                    x
                )))
            }
        }
    }

    Ok(FittedModel {
        method,
        formula,
        coefficients,
        metrics: FitMetrics::compute(&ys, &predicted),
        predictions: predicted.into_iter().map(Some).collect(),
    })
}

fn exp_intercept(ln_a: f64, method: &str) -> EngineResult<f64> {
    let a = ln_a.exp();
    if a.is_finite() && a > 0.0 {
        Ok(a)
    } else {
        Err(EngineError::numerical(format!(
            "{} fit intercept e^{} is out of range",
            method, ln_a
        )))
    }
}

fn fit_moving_average(data: &[Observation], window: usize) -> FittedModel {
    let ys: Vec<f64> = data.iter().map(|o| o.y).collect();

    let predictions: Vec<Option<f64>> = (0..ys.len())
        .map(|t| {
            (t + 1 >= window).then(|| ys[t + 1 - window..=t].iter().sum::<f64>() / window as f64)
        })
        .collect();

    let scored: Vec<f64> = predictions.iter().flatten().copied().collect();
    let actual = &ys[window - 1..];

    FittedModel {
        method: RegressionMethod::MovingAverage { window },
        formula: formula::moving_average(window),
        coefficients: Vec::new(),
        metrics: FitMetrics::compute(actual, &scored),
        predictions,
    }
}
