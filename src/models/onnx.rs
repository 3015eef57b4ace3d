//! ONNX Runtime backed classifier

use crate::error::{DashboardError, Result};
use crate::models::Classifier;
use ort::memory::Allocator;
use ort::session::{builder::GraphOptimizationLevel, Session, SessionOutputs};
use ort::value::{DowncastableTarget, DynMapValueType, DynSequenceValueType, DynValue, Tensor};
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info};

/// Sidecar file listing the model's training features
#[derive(Debug, Deserialize)]
struct FeatureInfo {
    feature_names: Vec<String>,
}

fn model_err<E: std::fmt::Display>(e: E) -> DashboardError {
    DashboardError::Model(e.to_string())
}

/// Classifier exported to ONNX (XGBoost, LightGBM, scikit-learn, ...).
///
/// ONNX graphs carry no attribution mechanism, so explanations are
/// reported as unsupported.
pub struct OnnxClassifier {
    name: String,
    session: Mutex<Session>,
    input_name: String,
    output_name: String,
    feature_names: Vec<String>,
}

impl OnnxClassifier {
    /// Path of the feature sidecar: `model.onnx` -> `model.features.json`
    pub fn feature_info_path(model_path: &Path) -> PathBuf {
        model_path.with_extension("features.json")
    }

    /// Load a model and its feature sidecar
    pub fn load<P: AsRef<Path>>(path: P, onnx_threads: usize) -> Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "onnx".to_string());

        ort::init().commit().map_err(model_err)?;
        info!(model = %name, path = %path.display(), threads = onnx_threads, "Loading ONNX model");

        let session = Session::builder()
            .map_err(model_err)?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(model_err)?
            .with_intra_threads(onnx_threads)
            .map_err(model_err)?
            .commit_from_file(path)
            .map_err(|e| {
                DashboardError::Model(format!("failed to load model from {:?}: {}", path, e))
            })?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .unwrap_or_else(|| "float_input".to_string());

        let output_name = session
            .outputs
            .iter()
            .find(|o| o.name.contains("prob"))
            .map(|o| o.name.clone())
            .unwrap_or_else(|| {
                session
                    .outputs
                    .last()
                    .map(|o| o.name.clone())
                    .unwrap_or_else(|| "probabilities".to_string())
            });

        let sidecar = Self::feature_info_path(path);
        let info: FeatureInfo = serde_json::from_reader(BufReader::new(
            File::open(&sidecar).map_err(|e| {
                DashboardError::Model(format!(
                    "missing feature list {}: {}",
                    sidecar.display(),
                    e
                ))
            })?,
        ))?;

        info!(
            model = %name,
            input = %input_name,
            output = %output_name,
            features = info.feature_names.len(),
            "Model loaded successfully"
        );

        Ok(Self {
            name,
            session: Mutex::new(session),
            input_name,
            output_name,
            feature_names: info.feature_names,
        })
    }

    /// Extract fraud probabilities from the session outputs.
    /// Handles both tensor outputs (XGBoost, Random Forest) and seq(map)
    /// outputs (CatBoost, LightGBM).
    fn extract_probabilities(&self, outputs: &SessionOutputs, batch: usize) -> Result<Vec<f64>> {
        let output = outputs
            .get(self.output_name.as_str())
            .ok_or_else(|| model_err(format!("model has no output {}", self.output_name)))?;

        if let Ok((shape, data)) = output.try_extract_tensor::<f32>() {
            let dims: Vec<i64> = shape.iter().copied().collect();
            return fraud_probs_from_tensor(&dims, data, batch);
        }

        if DynSequenceValueType::can_downcast(&output.dtype()) {
            return self.extract_from_sequence_map(output, batch);
        }

        Err(model_err(format!(
            "unsupported output type for {}",
            self.output_name
        )))
    }

    /// Extract probabilities from seq(map(int64, float)), one map per row
    fn extract_from_sequence_map(&self, output: &DynValue, batch: usize) -> Result<Vec<f64>> {
        let allocator = Allocator::default();

        let sequence = output
            .downcast_ref::<DynSequenceValueType>()
            .map_err(model_err)?;
        let maps = sequence
            .try_extract_sequence::<DynMapValueType>(&allocator)
            .map_err(model_err)?;

        if maps.len() != batch {
            return Err(model_err(format!(
                "expected {} probability maps, got {}",
                batch,
                maps.len()
            )));
        }

        maps.iter()
            .map(|map_value| {
                let kv_pairs = map_value
                    .try_extract_key_values::<i64, f32>()
                    .map_err(model_err)?;
                fraud_prob_from_pairs(&kv_pairs)
            })
            .collect()
    }
}

/// f32 rounding in softmax/ZipMap outputs may overshoot `[0, 1]` by this much
const PROBABILITY_TOLERANCE: f64 = 1e-6;

/// `[legit, fraud]` pairs with rounding overshoot pulled back into `[0, 1]`.
/// Values further out are left for the scoring pipeline to reject.
fn class_distribution(probs: Vec<f64>) -> Vec<[f64; 2]> {
    probs
        .into_iter()
        .map(|p| {
            let p = if (-PROBABILITY_TOLERANCE..0.0).contains(&p) {
                0.0
            } else if p > 1.0 && p <= 1.0 + PROBABILITY_TOLERANCE {
                1.0
            } else {
                p
            };
            [1.0 - p, p]
        })
        .collect()
}

/// Fraud probability from a `{class_id: probability}` map
fn fraud_prob_from_pairs(pairs: &[(i64, f32)]) -> Result<f64> {
    if let Some((_, prob)) = pairs.iter().find(|(class_id, _)| *class_id == 1) {
        return Ok(*prob as f64);
    }
    if let Some((_, prob)) = pairs.iter().find(|(class_id, _)| *class_id == 0) {
        return Ok(1.0 - *prob as f64);
    }
    Err(model_err("no class probability found in map"))
}

/// Fraud probabilities from a dense probability tensor.
///
/// Accepts `[batch, classes]` (fraud class at index 1, or the only column
/// when there is one) and `[batch]` shapes.
fn fraud_probs_from_tensor(dims: &[i64], data: &[f32], batch: usize) -> Result<Vec<f64>> {
    match dims {
        [rows, classes] if *rows as usize == batch && *classes >= 1 => {
            let classes = *classes as usize;
            let col = if classes >= 2 { 1 } else { 0 };
            Ok((0..batch).map(|i| data[i * classes + col] as f64).collect())
        }
        [rows] if *rows as usize == batch => Ok(data.iter().map(|&v| v as f64).collect()),
        _ => Err(model_err(format!(
            "unexpected probability tensor shape {:?} for batch of {}",
            dims, batch
        ))),
    }
}

impl Classifier for OnnxClassifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn predict_proba(&self, rows: &[Vec<f64>]) -> Result<Vec<[f64; 2]>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let width = self.feature_names.len();
        let mut data = Vec::with_capacity(rows.len() * width);
        for row in rows {
            if row.len() != width {
                return Err(model_err(format!(
                    "expected {} features, got {}",
                    width,
                    row.len()
                )));
            }
            data.extend(row.iter().map(|&v| v as f32));
        }

        let shape = vec![rows.len() as i64, width as i64];
        let input_tensor = Tensor::from_array((shape, data)).map_err(model_err)?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| model_err(format!("lock error: {}", e)))?;
        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => input_tensor])
            .map_err(model_err)?;

        let probs = self.extract_probabilities(&outputs, rows.len())?;
        debug!(model = %self.name, rows = rows.len(), "ONNX batch scored");

        Ok(class_distribution(probs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_sidecar_path() {
        let path = OnnxClassifier::feature_info_path(Path::new("models/xgboost.onnx"));
        assert_eq!(path, PathBuf::from("models/xgboost.features.json"));
    }

    #[test]
    fn test_two_class_tensor() {
        let probs = fraud_probs_from_tensor(&[2, 2], &[0.9, 0.1, 0.3, 0.7], 2).unwrap();
        assert!((probs[0] - 0.1).abs() < 1e-6);
        assert!((probs[1] - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_single_column_tensor() {
        let probs = fraud_probs_from_tensor(&[2, 1], &[0.25, 0.75], 2).unwrap();
        assert_eq!(probs, vec![0.25, 0.75]);

        let probs = fraud_probs_from_tensor(&[2], &[0.25, 0.75], 2).unwrap();
        assert_eq!(probs, vec![0.25, 0.75]);
    }

    #[test]
    fn test_tensor_batch_mismatch() {
        assert!(fraud_probs_from_tensor(&[1, 2], &[0.5, 0.5], 2).is_err());
        assert!(fraud_probs_from_tensor(&[1, 2, 2], &[0.5; 4], 1).is_err());
    }

    #[test]
    fn test_rounding_overshoot_is_clamped() {
        let probs = vec![1.000_000_1_f32 as f64, -1e-7, 0.4];
        let dist = class_distribution(probs);
        assert_eq!(dist[0], [0.0, 1.0]);
        assert_eq!(dist[1], [1.0, 0.0]);
        assert!((dist[2][1] - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_large_overshoot_is_kept() {
        let dist = class_distribution(vec![1.5, -0.2]);
        assert_eq!(dist[0][1], 1.5);
        assert_eq!(dist[1][1], -0.2);
    }

    #[test]
    fn test_probability_map() {
        assert_eq!(fraud_prob_from_pairs(&[(0, 0.75), (1, 0.25)]).unwrap(), 0.25);
        assert_eq!(fraud_prob_from_pairs(&[(0, 0.75)]).unwrap(), 0.25);
        assert!(fraud_prob_from_pairs(&[(4, 0.75)]).is_err());
    }
}
