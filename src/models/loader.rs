//! Model artifact loader

use crate::error::{DashboardError, Result};
use crate::models::{Classifier, TreeEnsemble};
use std::path::Path;
use tracing::info;

/// Loads a classifier, choosing the provider from the file extension:
/// `.json` tree ensembles and `.onnx` graphs.
pub struct ModelLoader {
    /// Number of threads for ONNX inference
    onnx_threads: usize,
}

impl ModelLoader {
    /// Create a new model loader with default settings (1 thread)
    pub fn new() -> Self {
        Self::with_threads(1)
    }

    /// Create a new model loader with specified number of threads
    pub fn with_threads(onnx_threads: usize) -> Self {
        Self {
            onnx_threads: onnx_threads.max(1),
        }
    }

    /// Load a classifier from file
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<Box<dyn Classifier>> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        let model: Box<dyn Classifier> = match extension.as_deref() {
            Some("json") => Box::new(TreeEnsemble::load(path)?),
            Some("onnx") => self.load_onnx(path)?,
            _ => {
                return Err(DashboardError::Model(format!(
                    "unsupported model artifact {}",
                    path.display()
                )))
            }
        };

        info!(
            model = %model.name(),
            features = model.feature_names().len(),
            "Classifier ready"
        );

        Ok(model)
    }

    #[cfg(feature = "onnx")]
    fn load_onnx(&self, path: &Path) -> Result<Box<dyn Classifier>> {
        Ok(Box::new(crate::models::OnnxClassifier::load(
            path,
            self.onnx_threads,
        )?))
    }

    #[cfg(not(feature = "onnx"))]
    fn load_onnx(&self, path: &Path) -> Result<Box<dyn Classifier>> {
        Err(DashboardError::Model(format!(
            "{} requires the `onnx` feature ({} threads requested)",
            path.display(),
            self.onnx_threads
        )))
    }
}

impl Default for ModelLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_extension() {
        let err = ModelLoader::new().load("models/rf_model.joblib").err().unwrap();
        assert!(matches!(err, DashboardError::Model(_)));
    }

    #[test]
    fn test_missing_json_artifact() {
        let err = ModelLoader::new()
            .load("does/not/exist/model.json")
            .err()
            .unwrap();
        assert!(matches!(err, DashboardError::Io(_)));
    }

    #[test]
    fn test_thread_count_is_at_least_one() {
        assert_eq!(ModelLoader::with_threads(0).onnx_threads, 1);
    }
}
