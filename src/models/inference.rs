//! Scoring engine: default-probability inference and attribution.

use crate::models::loader::{LoadedModel, ModelLoader};
use crate::training::ProbabilityModel;
use crate::types::decision::Explanation;
use anyhow::{Context, Result};
use ort::value::{DowncastableTarget, DynMapValueType, DynSequenceValueType};
use std::path::Path;
use std::sync::RwLock;
use tracing::{debug, warn};

/// Runs the exported gradient-boosting classifier over extracted feature
/// vectors and produces default probabilities plus per-feature
/// attributions.
pub struct ScoringEngine {
    /// Loaded ONNX model (RwLock because ort sessions need &mut to run)
    model: RwLock<LoadedModel>,
    /// Feature names aligned with the extraction order
    feature_names: Vec<String>,
}

impl ScoringEngine {
    /// Load the classifier and bind it to a feature naming.
    pub fn new<P: AsRef<Path>>(
        model_path: P,
        feature_names: Vec<String>,
        onnx_threads: usize,
    ) -> Result<Self> {
        let loader = ModelLoader::with_threads(onnx_threads)?;
        let model = loader.load_model(model_path, "gradient_boosting")?;
        Ok(Self {
            model: RwLock::new(model),
            feature_names,
        })
    }

    /// Number of features the engine expects per input vector.
    pub fn feature_count(&self) -> usize {
        self.feature_names.len()
    }

    /// Default probability for one feature vector.
    pub fn predict_proba(&self, features: &[f32]) -> Result<f64> {
        if features.len() != self.feature_names.len() {
            anyhow::bail!(
                "feature vector has {} entries, model expects {}",
                features.len(),
                self.feature_names.len()
            );
        }

        let mut model = self
            .model
            .write()
            .map_err(|e| anyhow::anyhow!("Lock error: {}", e))?;
        self.run_model(&mut model, features)
    }

    /// Default probabilities for a batch of feature vectors.
    pub fn predict_batch(&self, features_batch: &[Vec<f32>]) -> Result<Vec<f64>> {
        features_batch
            .iter()
            .map(|f| self.predict_proba(f))
            .collect()
    }

    /// Per-feature attribution by baseline occlusion.
    ///
    /// `base_value` is the model's output on an all-zero background;
    /// `values[i]` is the probability shift when feature `i` is occluded
    /// back to that background. Costs one model run per feature plus two.
    pub fn explain(&self, features: &[f32]) -> Result<Explanation> {
        let full = self.predict_proba(features)?;
        let base_value = self.predict_proba(&vec![0.0; features.len()])?;

        let mut values = Vec::with_capacity(features.len());
        let mut occluded = features.to_vec();
        for i in 0..features.len() {
            let original = occluded[i];
            occluded[i] = 0.0;
            let without = self.predict_proba(&occluded)?;
            occluded[i] = original;
            values.push(full - without);
        }

        Ok(Explanation {
            values,
            base_value,
            feature_names: self.feature_names.clone(),
        })
    }

    fn run_model(&self, model: &mut LoadedModel, features: &[f32]) -> Result<f64> {
        use ort::value::Tensor;

        // Input shape [1, num_features]
        let shape = vec![1_i64, features.len() as i64];
        let input_tensor = Tensor::from_array((shape, features.to_vec()))
            .context("Failed to create input tensor")?;

        let model_name = model.name.clone();

        let outputs = model
            .session
            .run(ort::inputs![&model.input_name => input_tensor])?;

        self.extract_probability(&outputs, &model.output_name, &model_name)
    }

    /// Extract the default-class probability from model output.
    ///
    /// Handles plain tensor outputs as well as the seq(map) shape that
    /// sklearn's ZipMap node emits for classifier probabilities.
    fn extract_probability(
        &self,
        outputs: &ort::session::SessionOutputs,
        output_name: &str,
        model_name: &str,
    ) -> Result<f64> {
        if let Some(output) = outputs.get(output_name) {
            let dtype = output.dtype();

            if let Ok(tensor) = output.try_extract_tensor::<f32>() {
                let (shape, data) = tensor;
                let prob = self.default_prob_from_tensor(&shape, data);
                debug!(model = %model_name, prob = prob, "Extracted from tensor");
                return Ok(prob);
            }

            if DynSequenceValueType::can_downcast(&dtype) {
                if let Ok(prob) = self.extract_from_sequence_map(output, model_name) {
                    return Ok(prob);
                }
            }
        }

        // Fallback: iterate all outputs and try extraction
        for (name, output) in outputs.iter() {
            if name.contains("label") {
                continue;
            }

            let dtype = output.dtype();

            if let Ok(tensor) = output.try_extract_tensor::<f32>() {
                let (shape, data) = tensor;
                let prob = self.default_prob_from_tensor(&shape, data);
                debug!(model = %model_name, output = %name, prob = prob, "Extracted from tensor (fallback)");
                return Ok(prob);
            }

            if DynSequenceValueType::can_downcast(&dtype) {
                if let Ok(prob) = self.extract_from_sequence_map(&output, model_name) {
                    return Ok(prob);
                }
            }
        }

        warn!(model = %model_name, "Could not extract probability, using neutral 0.5");
        Ok(0.5)
    }

    /// Extract the class-1 probability from seq(map(int64, float)).
    fn extract_from_sequence_map(
        &self,
        output: &ort::value::DynValue,
        model_name: &str,
    ) -> Result<f64> {
        let sequence = output
            .downcast_ref::<DynSequenceValueType>()
            .map_err(|e| anyhow::anyhow!("Failed to downcast to sequence: {}", e))?;

        let maps = sequence.try_extract_sequence::<DynMapValueType>()?;

        if maps.is_empty() {
            return Err(anyhow::anyhow!("Empty sequence"));
        }

        // Batch size is always 1, so the first map is the prediction.
        let map_value = &maps[0];
        let kv_pairs = map_value.try_extract_key_values::<i64, f32>()?;

        // Class 1 is the default class.
        for (class_id, prob) in &kv_pairs {
            if *class_id == 1 {
                debug!(model = %model_name, prob = *prob, "Extracted from seq(map)");
                return Ok(*prob as f64);
            }
        }

        for (class_id, prob) in &kv_pairs {
            if *class_id == 0 {
                return Ok(1.0 - *prob as f64);
            }
        }

        Err(anyhow::anyhow!("No probability found in map"))
    }

    /// Extract the default probability from tensor data.
    fn default_prob_from_tensor(&self, shape: &ort::value::Shape, data: &[f32]) -> f64 {
        let dims: Vec<i64> = shape.iter().copied().collect();

        if dims.len() == 2 {
            let num_classes = dims[1] as usize;
            if num_classes >= 2 {
                // [batch, num_classes]: default class at index 1
                return data[1] as f64;
            } else if num_classes == 1 {
                return data[0] as f64;
            }
        } else if dims.len() == 1 {
            let num_classes = dims[0] as usize;
            if num_classes >= 2 {
                return data[1] as f64;
            } else if num_classes == 1 {
                return data[0] as f64;
            }
        }

        data.last().map(|&v| v as f64).unwrap_or(0.5)
    }
}

impl ProbabilityModel for ScoringEngine {
    fn predict_proba(&self, features: &[f32]) -> Result<f64> {
        ScoringEngine::predict_proba(self, features)
    }
}

#[cfg(test)]
mod tests {
    // Inference tests require an exported ONNX model file; probability
    // extraction paths are covered end to end by the calibrate tool run
    // against a real export.
}
