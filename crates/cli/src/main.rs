//! Curve fitting and forecasting CLI
//!
//! A command-line tool for fitting regression models to point sets and
//! producing recursive forecasts from time series stored as JSON files.

mod commands;
mod config;
mod input;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{fit, forecast, models};
use forecast_lib::EngineService;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Predictor used when neither the command line nor the config file names one
const DEFAULT_PREDICTOR: &str = "mean";

/// Curve fitting and forecasting CLI
#[derive(Parser)]
#[command(name = "fcast")]
#[command(author, version, about = "CLI for curve fitting and recursive forecasting", long_about = None)]
pub struct Cli {
    /// Output format (defaults to the config file's default_format, then table)
    #[arg(long, short, global = true)]
    pub format: Option<output::OutputFormat>,

    /// Config file (defaults to ~/.config/fcast/config.json)
    #[arg(long, env = "FCAST_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fit a regression model to {x, y} points
    Fit {
        /// JSON file with an array of {x, y} points
        #[arg(long, short)]
        input: PathBuf,

        /// linear, polynomial, exponential, power, logarithmic or moving-average
        #[arg(long, short, default_value = "linear")]
        method: String,

        /// Polynomial degree (2-6)
        #[arg(long)]
        degree: Option<usize>,

        /// Moving-average window
        #[arg(long)]
        window: Option<usize>,
    },

    /// Forecast future values of a series
    Forecast {
        /// JSON file with an array of numbers or {date, value} points
        #[arg(long, short)]
        input: PathBuf,

        /// Predictor key (see `fcast models`)
        #[arg(long, short)]
        predictor: Option<String>,

        /// Number of steps to forecast (0-30)
        #[arg(long, default_value_t = 7)]
        horizon: usize,

        /// Directory of ONNX models with JSON descriptions
        #[arg(long, env = "FCAST_MODEL_DIR")]
        model_dir: Option<PathBuf>,
    },

    /// Forecast the tail of a series from its head and report the errors
    Backtest {
        /// JSON file with an array of numbers or {date, value} points
        #[arg(long, short)]
        input: PathBuf,

        /// Predictor key (see `fcast models`)
        #[arg(long, short)]
        predictor: Option<String>,

        /// Number of trailing values to hold out
        #[arg(long, default_value_t = 7)]
        holdout: usize,

        /// Directory of ONNX models with JSON descriptions
        #[arg(long, env = "FCAST_MODEL_DIR")]
        model_dir: Option<PathBuf>,
    },

    /// List available predictors
    Models {
        /// Directory of ONNX models with JSON descriptions
        #[arg(long, env = "FCAST_MODEL_DIR")]
        model_dir: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        tracing_subscriber::fmt()
            .compact()
            .with_writer(std::io::stderr)
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
            )
            .init();
    }

    let config = config::Config::load(cli.config.as_deref())?;
    let format = cli
        .format
        .or_else(|| {
            config
                .default_format
                .as_deref()
                .and_then(output::OutputFormat::from_name)
        })
        .unwrap_or_default();
    let default_predictor = config
        .default_predictor
        .clone()
        .unwrap_or_else(|| DEFAULT_PREDICTOR.to_string());
    let config_model_dir = config.model_dir.as_ref().map(PathBuf::from);

    let service = EngineService::new("fcast");

    match cli.command {
        Commands::Fit {
            input,
            method,
            degree,
            window,
        } => {
            fit::run_fit(&service, &input, &method, degree, window, format)?;
        }
        Commands::Forecast {
            input,
            predictor,
            horizon,
            model_dir,
        } => {
            let registry = commands::load_registry(model_dir.or(config_model_dir).as_deref())?;
            let predictor = predictor.unwrap_or(default_predictor);
            forecast::run_forecast(&service, &registry, &input, &predictor, horizon, format)?;
        }
        Commands::Backtest {
            input,
            predictor,
            holdout,
            model_dir,
        } => {
            let registry = commands::load_registry(model_dir.or(config_model_dir).as_deref())?;
            let predictor = predictor.unwrap_or(default_predictor);
            forecast::run_backtest(&service, &registry, &input, &predictor, holdout, format)?;
        }
        Commands::Models { model_dir } => {
            let registry = commands::load_registry(model_dir.or(config_model_dir).as_deref())?;
            models::list_models(&registry, format)?;
        }
    }

    Ok(())
}
