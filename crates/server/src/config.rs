//! Server configuration

use anyhow::{Context, Result};
use serde::Deserialize;

/// Server configuration, read from `FORECAST_*` environment variables
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Name attached to every structured log event
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// HTTP port for the API, health and metrics
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory of `<name>.onnx` + `<name>.json` model pairs
    #[serde(default)]
    pub model_dir: Option<String>,

    /// Per-request deadline for fits and forecasts
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// First member of the hybrid ensemble
    #[serde(default = "default_hybrid_primary")]
    pub hybrid_primary: String,

    /// Second member of the hybrid ensemble
    #[serde(default = "default_hybrid_secondary")]
    pub hybrid_secondary: String,

    /// Weight of the first hybrid member
    #[serde(default = "default_hybrid_weight")]
    pub hybrid_weight: f64,
}

fn default_service_name() -> String {
    "forecast-server".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout_ms() -> u64 {
    5000
}

fn default_hybrid_primary() -> String {
    "xgb".to_string()
}

fn default_hybrid_secondary() -> String {
    "lstm".to_string()
}

fn default_hybrid_weight() -> f64 {
    forecast_lib::predictor::DEFAULT_PRIMARY_WEIGHT
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            port: default_port(),
            model_dir: None,
            request_timeout_ms: default_request_timeout_ms(),
            hybrid_primary: default_hybrid_primary(),
            hybrid_secondary: default_hybrid_secondary(),
            hybrid_weight: default_hybrid_weight(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from the environment
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("FORECAST").try_parsing(true))
            .build()?;

        config
            .try_deserialize()
            .context("Invalid FORECAST_* configuration")
    }
}
