//! Model descriptions and the predictor catalogue
//!
//! A trained model is an opaque ONNX artifact plus a JSON sidecar
//! ([`ModelSpec`]) describing how to feed it. The [`ModelRegistry`] maps
//! request-facing keys to ready-to-use predictors, built-in heuristics
//! included.

use super::features::NUM_TABULAR_FEATURES;
use super::{
    MeanReversion, OnnxPredictor, Persistence, SharedPredictor, TrendPredictor, WeightedEnsemble,
    WindowMean, DEFAULT_REVERSION_STRENGTH,
};
use crate::regression::RegressionMethod;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Context length of the built-in heuristics
pub const DEFAULT_CONTEXT_LEN: usize = 7;

/// How a model expects its input tensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputLayout {
    /// Raw trailing values, shape [1, 7, 1]
    Sequence,
    /// Engineered lag and rolling features, shape [1, 7]
    Tabular,
}

/// Per-feature standardisation fitted at training time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl FeatureScaler {
    pub fn transform(&self, features: &[f64]) -> Vec<f64> {
        features
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(v, (m, s))| (v - m) / s)
            .collect()
    }
}

/// Standardisation of the target series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetScaler {
    pub mean: f64,
    pub scale: f64,
}

impl TargetScaler {
    pub fn transform(&self, value: f64) -> f64 {
        (value - self.mean) / self.scale
    }

    pub fn inverse(&self, scaled: f64) -> f64 {
        scaled * self.scale + self.mean
    }
}

/// Sidecar description of a trained model artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelSpec {
    pub name: String,
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    /// Published validation MAE
    pub mae: f64,
    /// Published validation RMSE
    pub rmse: f64,
    pub layout: InputLayout,
    #[serde(default)]
    pub feature_scaler: Option<FeatureScaler>,
    #[serde(default)]
    pub target_scaler: Option<TargetScaler>,
}

impl ModelSpec {
    /// Check scaler shapes against the layout
    pub fn validate(&self) -> Result<()> {
        if let Some(scaler) = &self.feature_scaler {
            if self.layout != InputLayout::Tabular {
                bail!("model '{}': feature scaler requires the tabular layout", self.name);
            }
            if scaler.mean.len() != NUM_TABULAR_FEATURES || scaler.scale.len() != NUM_TABULAR_FEATURES {
                bail!(
                    "model '{}': feature scaler needs {} means and scales, got {} and {} \
                     (only lag and rolling features are built; calendar features are not supported)",
                    self.name,
                    NUM_TABULAR_FEATURES,
                    scaler.mean.len(),
                    scaler.scale.len()
                );
            }
            if scaler.scale.iter().any(|s| *s == 0.0 || !s.is_finite()) {
                bail!("model '{}': feature scales must be finite and non-zero", self.name);
            }
        }
        if let Some(scaler) = &self.target_scaler {
            if scaler.scale == 0.0 || !scaler.scale.is_finite() || !scaler.mean.is_finite() {
                bail!("model '{}': target scale must be finite and non-zero", self.name);
            }
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let spec: Self = serde_json::from_str(json).context("Failed to parse model spec")?;
        spec.validate()?;
        Ok(spec)
    }
}

/// Request-facing metadata for a registered predictor
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogEntry {
    #[serde(rename = "type")]
    pub key: String,
    pub name: String,
    pub description: String,
    pub mae: Option<f64>,
    pub rmse: Option<f64>,
}

/// Catalogue of predictors addressable by key
#[derive(Clone, Default)]
pub struct ModelRegistry {
    entries: BTreeMap<String, (CatalogEntry, SharedPredictor)>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with the deterministic heuristics
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.insert(
            "mean",
            "Window Mean",
            "Mean of the last 7 values",
            Arc::new(WindowMean::new(DEFAULT_CONTEXT_LEN)),
        );
        registry.insert(
            "persistence",
            "Persistence",
            "Repeats the last observed value",
            Arc::new(Persistence),
        );
        registry.insert(
            "mean-reversion",
            "Mean Reversion",
            "Moves the last value halfway towards the 7-value mean",
            Arc::new(MeanReversion::new(DEFAULT_CONTEXT_LEN, DEFAULT_REVERSION_STRENGTH)),
        );
        registry.insert(
            "linear-trend",
            "Linear Trend",
            "Extrapolates a least-squares line through the last 7 values",
            Arc::new(TrendPredictor::new(RegressionMethod::Linear, DEFAULT_CONTEXT_LEN)),
        );
        registry
    }

    /// Register a predictor without published accuracy figures
    pub fn insert(
        &mut self,
        key: &str,
        name: &str,
        description: &str,
        predictor: SharedPredictor,
    ) {
        let entry = CatalogEntry {
            key: key.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            mae: None,
            rmse: None,
        };
        self.entries.insert(key.to_string(), (entry, predictor));
    }

    /// Register a loaded ONNX model under its spec name
    pub fn insert_model(&mut self, predictor: OnnxPredictor) {
        let spec = predictor.spec();
        let entry = CatalogEntry {
            key: spec.name.clone(),
            name: spec.display_name.clone(),
            description: spec.description.clone(),
            mae: Some(spec.mae),
            rmse: Some(spec.rmse),
        };
        let predictor: SharedPredictor = Arc::new(predictor);
        self.entries.insert(entry.key.clone(), (entry, predictor));
    }

    /// Load every `<name>.json` + `<name>.onnx` pair in `dir`.
    ///
    /// Pairs that fail to load are skipped with a warning. Returns the
    /// number of models loaded.
    pub fn load_dir(&mut self, dir: &Path) -> Result<usize> {
        let entries = std::fs::read_dir(dir)
            .with_context(|| format!("Failed to read model directory {}", dir.display()))?;

        let mut loaded = 0;
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match Self::load_pair(&path) {
                Ok(predictor) => {
                    info!(model = %predictor.spec().name, path = %path.display(), "Model loaded");
                    self.insert_model(predictor);
                    loaded += 1;
                }
                Err(e) => {
                    let reason = format!("{:#}", e);
                    warn!(path = %path.display(), error = %reason, "Skipping model");
                }
            }
        }
        Ok(loaded)
    }

    fn load_pair(spec_path: &Path) -> Result<OnnxPredictor> {
        let json = std::fs::read_to_string(spec_path)
            .with_context(|| format!("Failed to read {}", spec_path.display()))?;
        let spec = ModelSpec::from_json(&json)?;
        OnnxPredictor::from_file(&spec_path.with_extension("onnx"), spec)
    }

    /// Register a weighted ensemble of two already registered predictors
    pub fn add_ensemble(&mut self, key: &str, primary: &str, secondary: &str, weight: f64) -> Result<()> {
        let (first_entry, first) = self
            .entries
            .get(primary)
            .cloned()
            .with_context(|| format!("Unknown ensemble member '{}'", primary))?;
        let (second_entry, second) = self
            .entries
            .get(secondary)
            .cloned()
            .with_context(|| format!("Unknown ensemble member '{}'", secondary))?;

        let ensemble = WeightedEnsemble::new(key, first, second, weight)?;
        let weight = ensemble.weight();
        let combine = |a: Option<f64>, b: Option<f64>| Some(weight * a? + (1.0 - weight) * b?);

        let entry = CatalogEntry {
            key: key.to_string(),
            name: format!("Hybrid {} + {}", first_entry.name, second_entry.name),
            description: format!(
                "Weighted ensemble: {:.0}% {}, {:.0}% {}",
                weight * 100.0,
                primary,
                (1.0 - weight) * 100.0,
                secondary
            ),
            // Weighted published errors, as an indication only
            mae: combine(first_entry.mae, second_entry.mae),
            rmse: combine(first_entry.rmse, second_entry.rmse),
        };
        let ensemble: SharedPredictor = Arc::new(ensemble);
        self.entries.insert(key.to_string(), (entry, ensemble));
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<SharedPredictor> {
        self.entries.get(key).map(|(_, p)| p.clone())
    }

    pub fn entry(&self, key: &str) -> Option<&CatalogEntry> {
        self.entries.get(key).map(|(e, _)| e)
    }

    pub fn entries(&self) -> Vec<&CatalogEntry> {
        self.entries.values().map(|(e, _)| e).collect()
    }

    pub fn keys(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
