//! Core data models for fitting and forecasting

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single observed (x, y) pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub x: f64,
    pub y: f64,
}

impl Observation {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<(f64, f64)> for Observation {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// A historical or forecast value tied to a calendar day
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DatedValue {
    pub date: NaiveDate,
    pub value: f64,
}

impl DatedValue {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }
}

/// Summary of the history a forecast was produced from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistorySummary {
    pub count: usize,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Forecast with one date per step, starting the day after the last history point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatedForecast {
    pub points: Vec<DatedValue>,
    pub history: HistorySummary,
}

impl DatedForecast {
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }
}

/// Accuracy of a hold-out forecast against the actual values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastAccuracy {
    pub holdout: usize,
    pub mae: f64,
    pub rmse: f64,
    /// Mean absolute percentage error over non-zero actuals, `None` if all actuals are zero
    pub mape: Option<f64>,
    pub predicted: Vec<f64>,
    pub actual: Vec<f64>,
}
