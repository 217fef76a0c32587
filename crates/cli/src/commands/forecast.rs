//! Forecasting and backtesting commands

use anyhow::Result;
use colored::Colorize;
use forecast_lib::{EngineService, ModelRegistry};
use serde_json::json;
use std::path::Path;
use tabled::Tabled;

use super::resolve_predictor;
use crate::input::{read_series, Series};
use crate::output::{
    format_optional, format_value, print_heading, print_info, print_json, print_success,
    print_table, OutputFormat,
};

/// Row for the forecast table
#[derive(Tabled)]
struct ForecastRow {
    #[tabled(rename = "Step")]
    step: usize,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Value")]
    value: String,
}

/// Row for the backtest table
#[derive(Tabled)]
struct BacktestRow {
    #[tabled(rename = "Step")]
    step: usize,
    #[tabled(rename = "Actual")]
    actual: String,
    #[tabled(rename = "Predicted")]
    predicted: String,
    #[tabled(rename = "Error")]
    error: String,
}

/// Forecast `horizon` steps past the series in `input`
pub fn run_forecast(
    service: &EngineService,
    registry: &ModelRegistry,
    input: &Path,
    predictor_key: &str,
    horizon: usize,
    format: OutputFormat,
) -> Result<()> {
    let series = read_series(input)?;
    let predictor = resolve_predictor(registry, predictor_key)?;

    let rows: Vec<ForecastRow> = match &series {
        Series::Dated(history) => {
            let result = service.forecast_dated(history, predictor.as_ref(), horizon)?;
            if format == OutputFormat::Json {
                return print_json(&json!({
                    "predictor": predictor_key,
                    "horizon": horizon,
                    "predictions": result.points,
                    "historicalSummary": result.history,
                }));
            }
            print_info(&format!(
                "History: {} points from {} to {}",
                result.history.count, result.history.start_date, result.history.end_date
            ));
            result
                .points
                .iter()
                .enumerate()
                .map(|(i, p)| ForecastRow {
                    step: i + 1,
                    date: p.date.to_string(),
                    value: format_value(p.value),
                })
                .collect()
        }
        Series::Plain(values) => {
            let clamped: Vec<f64> = values.iter().map(|v| v.max(0.0)).collect();
            let predictions = service.forecast(&clamped, predictor.as_ref(), horizon)?;
            if format == OutputFormat::Json {
                return print_json(&json!({
                    "predictor": predictor_key,
                    "horizon": horizon,
                    "predictions": predictions,
                }));
            }
            print_info(&format!("History: {} values", values.len()));
            predictions
                .iter()
                .enumerate()
                .map(|(i, v)| ForecastRow {
                    step: i + 1,
                    date: "-".to_string(),
                    value: format_value(*v),
                })
                .collect()
        }
    };

    print_heading(&format!("Forecast ({})", predictor_key));
    print_table(&rows);
    print_success(&format!("{} steps forecast", rows.len()));
    Ok(())
}

/// Forecast the last `holdout` values from the rest and report the errors
pub fn run_backtest(
    service: &EngineService,
    registry: &ModelRegistry,
    input: &Path,
    predictor_key: &str,
    holdout: usize,
    format: OutputFormat,
) -> Result<()> {
    let series = read_series(input)?;
    let predictor = resolve_predictor(registry, predictor_key)?;
    let values: Vec<f64> = series.values().into_iter().map(|v| v.max(0.0)).collect();
    let accuracy = service.backtest(&values, predictor.as_ref(), holdout)?;

    match format {
        OutputFormat::Json => print_json(&accuracy)?,
        OutputFormat::Table => {
            print_heading(&format!("Backtest ({})", predictor_key));
            println!("Holdout:    {}", accuracy.holdout);
            println!("MAE:        {}", format_value(accuracy.mae).cyan());
            println!("RMSE:       {}", format_value(accuracy.rmse).cyan());
            println!("MAPE:       {}", format_optional(accuracy.mape).cyan());
            println!();

            let rows: Vec<BacktestRow> = accuracy
                .actual
                .iter()
                .zip(&accuracy.predicted)
                .enumerate()
                .map(|(i, (actual, predicted))| BacktestRow {
                    step: i + 1,
                    actual: format_value(*actual),
                    predicted: format_value(*predicted),
                    error: format_value(predicted - actual),
                })
                .collect();
            print_table(&rows);
        }
    }

    Ok(())
}
