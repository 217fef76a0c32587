//! ONNX inference using tract
//!
//! Runs trained one-step models exported to ONNX. Inputs are prepared from
//! the trailing context according to the model's [`ModelSpec`]: sequence
//! models take the target-scaled values as a [1, 7, 1] tensor, tabular
//! models take feature-scaled lag and rolling statistics as a [1, 7] tensor.

use super::features::{tabular_features, NUM_TABULAR_FEATURES, SEQUENCE_LEN};
use super::registry::{InputLayout, ModelSpec};
use super::OneStepPredictor;
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tract_onnx::prelude::*;
use tracing::{debug, warn};

/// Maximum inference latency before warning (5ms target)
pub const MAX_INFERENCE_MS: u128 = 5;

type TractModel = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// ONNX-based one-step predictor using tract for lightweight inference
pub struct OnnxPredictor {
    model: TractModel,
    spec: ModelSpec,
    inference_count: AtomicU64,
    slow_inference_count: AtomicU64,
}

impl OnnxPredictor {
    /// Create a predictor from model bytes and its description
    pub fn new(model_bytes: &[u8], spec: ModelSpec) -> Result<Self> {
        spec.validate()?;
        let model = Self::load_model(model_bytes, spec.layout)
            .with_context(|| format!("Failed to load model '{}'", spec.name))?;
        Ok(Self {
            model,
            spec,
            inference_count: AtomicU64::new(0),
            slow_inference_count: AtomicU64::new(0),
        })
    }

    /// Create a predictor from an `.onnx` file
    pub fn from_file(path: &Path, spec: ModelSpec) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read model file {}", path.display()))?;
        Self::new(&bytes, spec)
    }

    /// Load and optimize an ONNX model from bytes
    fn load_model(model_bytes: &[u8], layout: InputLayout) -> Result<TractModel> {
        let input_fact = match layout {
            InputLayout::Sequence => f32::fact([1, SEQUENCE_LEN, 1]),
            InputLayout::Tabular => f32::fact([1, NUM_TABULAR_FEATURES]),
        };
        let model = tract_onnx::onnx()
            .model_for_read(&mut std::io::Cursor::new(model_bytes))
            .context("Failed to parse ONNX model")?
            .with_input_fact(0, input_fact.into())
            .context("Failed to set input shape")?
            .into_optimized()
            .context("Failed to optimize model")?
            .into_runnable()
            .context("Failed to create runnable model")?;
        Ok(model)
    }

    fn to_tensor(&self, input: Vec<f32>) -> Result<Tensor> {
        let tensor = match self.spec.layout {
            InputLayout::Sequence => {
                tract_ndarray::Array3::from_shape_vec((1, SEQUENCE_LEN, 1), input)?.into()
            }
            InputLayout::Tabular => {
                tract_ndarray::Array2::from_shape_vec((1, NUM_TABULAR_FEATURES), input)?.into()
            }
        };
        Ok(tensor)
    }

    pub fn spec(&self) -> &ModelSpec {
        &self.spec
    }

    /// Get inference statistics
    pub fn stats(&self) -> InferenceStats {
        InferenceStats {
            total_inferences: self.inference_count.load(Ordering::Relaxed),
            slow_inferences: self.slow_inference_count.load(Ordering::Relaxed),
        }
    }
}

/// Build the model input values from the trailing context
pub(crate) fn prepare_input(spec: &ModelSpec, context: &[f64]) -> Result<Vec<f32>> {
    if context.len() < SEQUENCE_LEN {
        anyhow::bail!(
            "model '{}' needs {} values, got {}",
            spec.name,
            SEQUENCE_LEN,
            context.len()
        );
    }
    let window = &context[context.len() - SEQUENCE_LEN..];

    let values: Vec<f64> = match spec.layout {
        InputLayout::Sequence => match &spec.target_scaler {
            Some(scaler) => window.iter().map(|v| scaler.transform(*v)).collect(),
            None => window.to_vec(),
        },
        InputLayout::Tabular => {
            let features = tabular_features(window)
                .context("not enough values for tabular features")?;
            match &spec.feature_scaler {
                Some(scaler) => scaler.transform(&features),
                None => features.to_vec(),
            }
        }
    };
    Ok(values.into_iter().map(|v| v as f32).collect())
}

/// Map the first model output back to the original scale
pub(crate) fn decode_output(spec: &ModelSpec, raw: &[f32]) -> Result<f64> {
    let first = *raw
        .first()
        .with_context(|| format!("model '{}' produced an empty output", spec.name))?;
    let value = first as f64;
    Ok(match (spec.layout, &spec.target_scaler) {
        (InputLayout::Sequence, Some(scaler)) => scaler.inverse(value),
        _ => value,
    })
}

impl OneStepPredictor for OnnxPredictor {
    fn context_len(&self) -> usize {
        SEQUENCE_LEN
    }

    fn predict(&self, context: &[f64]) -> Result<f64> {
        let start = Instant::now();

        let input = self.to_tensor(prepare_input(&self.spec, context)?)?;
        let result = self.model.run(tvec!(input.into()))?;
        let output = result.first().context("No output from model")?;
        let view = output.to_array_view::<f32>()?;
        let values: Vec<f32> = view.iter().copied().collect();

        let elapsed = start.elapsed();
        self.inference_count.fetch_add(1, Ordering::Relaxed);

        if elapsed.as_millis() > MAX_INFERENCE_MS {
            self.slow_inference_count.fetch_add(1, Ordering::Relaxed);
            warn!(
                model = %self.spec.name,
                elapsed_ms = elapsed.as_millis(),
                "Inference exceeded {}ms target",
                MAX_INFERENCE_MS
            );
        } else {
            debug!(model = %self.spec.name, elapsed_us = elapsed.as_micros(), "Inference completed");
        }

        decode_output(&self.spec, &values)
    }

    fn name(&self) -> &str {
        &self.spec.name
    }
}

/// Inference statistics
#[derive(Debug, Clone)]
pub struct InferenceStats {
    pub total_inferences: u64,
    pub slow_inferences: u64,
}
