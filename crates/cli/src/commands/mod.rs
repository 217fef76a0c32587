//! CLI command implementations

pub mod fit;
pub mod forecast;
pub mod models;

use anyhow::{Context, Result};
use forecast_lib::predictor::DEFAULT_PRIMARY_WEIGHT;
use forecast_lib::{ModelRegistry, SharedPredictor};
use std::path::Path;
use tracing::debug;

/// Members of the hybrid ensemble when both models are in the model directory
const HYBRID_MEMBERS: (&str, &str) = ("xgb", "lstm");

/// Built-in predictors plus every model found in `model_dir`
pub fn load_registry(model_dir: Option<&Path>) -> Result<ModelRegistry> {
    let mut registry = ModelRegistry::with_builtins();
    if let Some(dir) = model_dir {
        registry.load_dir(dir)?;
        let (primary, secondary) = HYBRID_MEMBERS;
        if registry.get(primary).is_some() && registry.get(secondary).is_some() {
            registry.add_ensemble("hybrid", primary, secondary, DEFAULT_PRIMARY_WEIGHT)?;
        }
    }
    debug!(predictors = registry.len(), "Predictor registry ready");
    Ok(registry)
}

/// Look up a predictor by key, listing the alternatives when it is missing
pub fn resolve_predictor(registry: &ModelRegistry, key: &str) -> Result<SharedPredictor> {
    registry.get(key).with_context(|| {
        format!(
            "Unknown predictor '{}', available: {}",
            key,
            registry.keys().join(", ")
        )
    })
}
