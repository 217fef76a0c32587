//! Regression fitting command

use anyhow::{bail, Result};
use colored::Colorize;
use forecast_lib::{EngineService, RegressionMethod};
use std::path::Path;
use tabled::Tabled;

use crate::input::read_points;
use crate::output::{
    color_r2, format_optional, format_value, print_heading, print_json, print_table,
    print_warning, OutputFormat,
};

/// Row for the fitted values table
#[derive(Tabled)]
struct FitRow {
    #[tabled(rename = "x")]
    x: String,
    #[tabled(rename = "y")]
    y: String,
    #[tabled(rename = "Predicted")]
    predicted: String,
}

/// Fit a regression model to the points in `input`
pub fn run_fit(
    service: &EngineService,
    input: &Path,
    method: &str,
    degree: Option<usize>,
    window: Option<usize>,
    format: OutputFormat,
) -> Result<()> {
    let parameter = method_parameter(method, degree, window)?;
    let data = read_points(input)?;
    let method = RegressionMethod::from_name(method, parameter)?;
    let model = service.fit(&data, method)?;

    match format {
        OutputFormat::Json => print_json(&model)?,
        OutputFormat::Table => {
            print_heading("Regression Fit");
            println!("Method:     {}", method.to_string().cyan());
            println!("Formula:    {}", model.formula().bold());
            println!("R²:         {}", color_r2(model.r2()));
            println!("MAE:        {}", format_value(model.mae()));
            println!("RMSE:       {}", format_value(model.rmse()));
            println!();

            if model.r2().is_none() {
                print_warning("R² is undefined: the observed y values are constant");
            }

            let rows: Vec<FitRow> = data
                .iter()
                .zip(model.predictions())
                .map(|(obs, predicted)| FitRow {
                    x: format_value(obs.x),
                    y: format_value(obs.y),
                    predicted: format_optional(*predicted),
                })
                .collect();
            print_table(&rows);
        }
    }

    Ok(())
}

/// Pick the flag that parameterises `method`, rejecting the one that does not apply
fn method_parameter(method: &str, degree: Option<usize>, window: Option<usize>) -> Result<Option<usize>> {
    // Only the variant matters here, not the placeholder parameter
    let parameter = match RegressionMethod::from_name(method, Some(0))? {
        RegressionMethod::Polynomial { .. } => {
            if window.is_some() {
                bail!("--window only applies to moving-average fits, not polynomial");
            }
            degree
        }
        RegressionMethod::MovingAverage { .. } => {
            if degree.is_some() {
                bail!("--degree only applies to polynomial fits, not moving-average");
            }
            window
        }
        other => {
            if degree.is_some() || window.is_some() {
                bail!("{} fits take neither --degree nor --window", other.name());
            }
            None
        }
    };
    Ok(parameter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_parameter_matches_flag_to_method() {
        assert_eq!(method_parameter("polynomial", Some(3), None).unwrap(), Some(3));
        assert_eq!(method_parameter("polynomial", None, None).unwrap(), None);
        assert_eq!(method_parameter("moving-average", None, Some(4)).unwrap(), Some(4));
        assert_eq!(method_parameter("linear", None, None).unwrap(), None);
    }

    #[test]
    fn test_method_parameter_rejects_mismatched_flag() {
        let err = method_parameter("polynomial", None, Some(3)).unwrap_err();
        assert!(err.to_string().contains("--window"));

        let err = method_parameter("moving-average", Some(2), Some(3)).unwrap_err();
        assert!(err.to_string().contains("--degree"));

        let err = method_parameter("exponential", Some(2), None).unwrap_err();
        assert!(err.to_string().contains("exponential"));
    }

    #[test]
    fn test_method_parameter_reports_unknown_method() {
        let err = method_parameter("spline", Some(2), None).unwrap_err();
        assert!(err.to_string().contains("unknown regression type"));
    }
}
