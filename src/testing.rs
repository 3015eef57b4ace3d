//! Fixtures shared by unit tests

use crate::dataset::Dataset;
use crate::error::Result;
use crate::models::{AttributionOutput, Classifier};

/// Classifier whose fraud probability is the value of its first feature.
pub struct PassthroughModel {
    pub features: Vec<String>,
    pub attribution: Option<AttributionOutput>,
}

impl PassthroughModel {
    pub fn new(features: &[&str]) -> Self {
        Self {
            features: features.iter().map(|s| s.to_string()).collect(),
            attribution: None,
        }
    }

    pub fn with_attribution(mut self, output: AttributionOutput) -> Self {
        self.attribution = Some(output);
        self
    }
}

impl Classifier for PassthroughModel {
    fn name(&self) -> &str {
        "passthrough"
    }

    fn feature_names(&self) -> &[String] {
        &self.features
    }

    fn predict_proba(&self, rows: &[Vec<f64>]) -> Result<Vec<[f64; 2]>> {
        Ok(rows.iter().map(|r| [1.0 - r[0], r[0]]).collect())
    }

    fn attributions(&self, _row: &[f64]) -> Result<AttributionOutput> {
        match &self.attribution {
            Some(output) => Ok(output.clone()),
            None => Err(crate::error::DashboardError::ExplainabilityUnsupported {
                model: self.name().to_string(),
            }),
        }
    }
}

/// Dataset with a `Score` column the passthrough model reads back.
/// Each tuple is `(amount, score, label)`.
pub fn scored_dataset(rows: &[(f64, f64, u8)]) -> Dataset {
    let mut csv = String::from("Time,Score,V2,Amount,Class\n");
    for (i, (amount, score, label)) in rows.iter().enumerate() {
        csv.push_str(&format!("{},{},{},{},{}\n", i, score, i as f64 * 0.1, amount, label));
    }
    Dataset::from_reader(csv.as_bytes(), None).unwrap()
}
