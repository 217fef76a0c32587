//! HTTP service exposing the curve fitting and forecasting engine

pub mod api;
pub mod config;

use anyhow::Result;
use crate::config::ServerConfig;
use forecast_lib::{ModelRegistry, StructuredLogger};
use std::path::Path;
use tracing::warn;

/// Key the hybrid ensemble is registered under
pub const HYBRID_KEY: &str = "hybrid";

/// Build the predictor catalogue: built-ins, models from `model_dir`, and
/// the hybrid ensemble when both of its members are available.
pub fn build_registry(config: &ServerConfig, logger: &StructuredLogger) -> Result<ModelRegistry> {
    let mut registry = ModelRegistry::with_builtins();

    if let Some(dir) = &config.model_dir {
        match registry.load_dir(Path::new(dir)) {
            Ok(_) => {
                for entry in registry.entries() {
                    if entry.mae.is_some() {
                        logger.log_model_loaded(&entry.key, &entry.name);
                    }
                }
            }
            Err(e) => {
                let reason = format!("{:#}", e);
                warn!(dir = %dir, error = %reason, "Model directory unavailable, using built-in predictors");
            }
        }
    }

    let primary = registry.get(&config.hybrid_primary).is_some();
    let secondary = registry.get(&config.hybrid_secondary).is_some();
    if primary && secondary {
        registry.add_ensemble(
            HYBRID_KEY,
            &config.hybrid_primary,
            &config.hybrid_secondary,
            config.hybrid_weight,
        )?;
        logger.log_model_loaded(HYBRID_KEY, "Hybrid ensemble");
    }

    Ok(registry)
}
