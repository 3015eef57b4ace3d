//! Shared, read-only state for dashboard interactions.

use crate::dataset::Dataset;
use crate::error::Result;
use crate::models::{Classifier, ModelLoader};
use std::path::Path;
use tracing::info;

/// Dataset and model loaded once per process.
///
/// Every pipeline call receives the context explicitly; nothing mutates it
/// after construction, so it can be shared behind an `Arc` without locking.
pub struct DashboardContext {
    dataset: Dataset,
    model: Box<dyn Classifier>,
}

impl DashboardContext {
    pub fn new(dataset: Dataset, model: Box<dyn Classifier>) -> Self {
        Self { dataset, model }
    }

    /// Load the dataset and model artifacts from disk
    pub fn load<D, M>(
        dataset_path: D,
        label_column: Option<&str>,
        model_path: M,
        loader: &ModelLoader,
    ) -> Result<Self>
    where
        D: AsRef<Path>,
        M: AsRef<Path>,
    {
        let dataset = Dataset::load(dataset_path, label_column)?;
        let model = loader.load(model_path)?;

        info!(
            rows = dataset.len(),
            model = %model.name(),
            "Dashboard context initialized"
        );

        Ok(Self::new(dataset, model))
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn model(&self) -> &dyn Classifier {
        self.model.as_ref()
    }

    /// Model feature names in training order
    pub fn feature_names(&self) -> &[String] {
        self.model.feature_names()
    }
}
