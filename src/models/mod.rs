//! Classifier abstractions and model providers
//!
//! The dashboard only needs three things from a model: the ordered feature
//! names it was trained on, fraud probabilities for a batch of rows, and
//! (for tree models) per-feature attributions for a single row.

pub mod forest;
pub mod loader;
#[cfg(feature = "onnx")]
pub mod onnx;

use crate::error::{DashboardError, Result};
use ndarray::ArrayD;

pub use forest::TreeEnsemble;
pub use loader::ModelLoader;
#[cfg(feature = "onnx")]
pub use onnx::OnnxClassifier;

/// Trained binary classifier
pub trait Classifier: Send + Sync {
    /// Model type, used in logs and error messages
    fn name(&self) -> &str;

    /// Feature names in training order
    fn feature_names(&self) -> &[String];

    /// Class probabilities `[P(legit), P(fraud)]` for each row
    fn predict_proba(&self, rows: &[Vec<f64>]) -> Result<Vec<[f64; 2]>>;

    /// Per-feature attribution values for one row.
    ///
    /// Models without a tree attribution mechanism keep the default, which
    /// reports [`DashboardError::ExplainabilityUnsupported`].
    fn attributions(&self, _row: &[f64]) -> Result<AttributionOutput> {
        Err(DashboardError::ExplainabilityUnsupported {
            model: self.name().to_string(),
        })
    }
}

/// Raw output of an attribution mechanism
#[derive(Debug, Clone, PartialEq)]
pub enum AttributionOutput {
    /// One array aligned with the input features (possibly with a trailing
    /// class axis)
    Single(ArrayD<f64>),
    /// One array per output class, indexed by class
    PerClass(Vec<ArrayD<f64>>),
}

impl AttributionOutput {
    /// Flattened attribution values for the fraud class.
    ///
    /// For per-class output the final class is the fraud class. Values are
    /// flattened in row-major order, so a `Single` array that still carries
    /// a class axis yields more values than there are features.
    pub fn fraud_class_values(self) -> Vec<f64> {
        let array = match self {
            AttributionOutput::Single(array) => Some(array),
            AttributionOutput::PerClass(arrays) => arrays.into_iter().last(),
        };

        array
            .map(|a| a.iter().copied().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, arr2};

    struct OpaqueModel {
        features: Vec<String>,
    }

    impl Classifier for OpaqueModel {
        fn name(&self) -> &str {
            "opaque"
        }

        fn feature_names(&self) -> &[String] {
            &self.features
        }

        fn predict_proba(&self, rows: &[Vec<f64>]) -> Result<Vec<[f64; 2]>> {
            Ok(rows.iter().map(|_| [0.5, 0.5]).collect())
        }
    }

    #[test]
    fn test_default_attributions_unsupported() {
        let model = OpaqueModel {
            features: vec!["V1".to_string()],
        };
        let err = model.attributions(&[1.0]).unwrap_err();
        assert!(matches!(
            err,
            DashboardError::ExplainabilityUnsupported { ref model } if model == "opaque"
        ));
    }

    #[test]
    fn test_per_class_selects_last_class() {
        let output = AttributionOutput::PerClass(vec![
            arr1(&[-0.1, -0.2]).into_dyn(),
            arr1(&[0.1, 0.2]).into_dyn(),
        ]);
        assert_eq!(output.fraud_class_values(), vec![0.1, 0.2]);
    }

    #[test]
    fn test_single_output_is_flattened_row_major() {
        let output = AttributionOutput::Single(arr2(&[[1.0, 2.0], [3.0, 4.0]]).into_dyn());
        assert_eq!(output.fraud_class_values(), vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_empty_per_class_output() {
        assert!(AttributionOutput::PerClass(Vec::new())
            .fraud_class_values()
            .is_empty());
    }
}
