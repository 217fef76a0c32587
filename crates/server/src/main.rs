//! Forecast server - curve fitting and recursive forecasting over HTTP

use anyhow::Result;
use forecast_lib::EngineService;
use forecast_server::{api, build_registry, config::ServerConfig};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting forecast-server");

    let config = ServerConfig::load()?;
    info!(
        port = config.port,
        model_dir = ?config.model_dir,
        timeout_ms = config.request_timeout_ms,
        "Server configured"
    );

    let service = EngineService::new(&config.service_name);
    let registry = build_registry(&config, service.logger())?;
    service.metrics().set_models_loaded(registry.len() as i64);
    service.logger().log_startup(SERVER_VERSION, registry.len());

    let app_state = Arc::new(api::AppState::new(
        service.clone(),
        registry,
        Duration::from_millis(config.request_timeout_ms),
    ));

    let api_handle = tokio::spawn(api::serve(config.port, app_state));

    tokio::select! {
        result = api_handle => {
            match result {
                Ok(Ok(())) => service.logger().log_shutdown("server stopped"),
                Ok(Err(e)) => {
                    error!(error = %e, "API server failed");
                    return Err(e);
                }
                Err(e) => return Err(e.into()),
            }
        }
        signal = tokio::signal::ctrl_c() => {
            signal?;
            service.logger().log_shutdown("SIGINT received");
            info!("Shutting down");
        }
    }

    Ok(())
}
