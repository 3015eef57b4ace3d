//! Per-transaction feature attribution.
//!
//! Attribution output is not guaranteed to have one value per model feature
//! (a trailing class axis, for instance, multiplies the count). Names and
//! values are paired positionally after truncating both to the shorter
//! length, and every mismatch is logged and reported with the explanation.

use crate::context::DashboardContext;
use crate::error::Result;
use crate::feature_extractor::FeatureExtractor;
use crate::models::Classifier;
use crate::types::transaction::TransactionRecord;
use serde::Serialize;
use tracing::{debug, warn};

/// Attributions kept per explanation
pub const TOP_ATTRIBUTIONS: usize = 10;

/// Signed contribution of one feature to the fraud score
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureAttribution {
    pub feature: String,
    pub impact: f64,
}

/// Feature list and attribution output disagreed in length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LengthMismatch {
    pub features: usize,
    pub values: usize,
}

/// Top attributions for one transaction, by descending absolute impact
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Explanation {
    pub attributions: Vec<FeatureAttribution>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length_mismatch: Option<LengthMismatch>,
}

impl Explanation {
    pub fn is_empty(&self) -> bool {
        self.attributions.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AttributionExplainer {
    top_k: usize,
}

impl AttributionExplainer {
    pub fn new(top_k: usize) -> Self {
        Self { top_k }
    }

    /// Explain the first of `rows` (feature vectors in model order).
    ///
    /// No rows yields an empty explanation. Models without an attribution
    /// mechanism fail with `ExplainabilityUnsupported`.
    pub fn explain(
        &self,
        model: &dyn Classifier,
        feature_names: &[String],
        rows: &[Vec<f64>],
    ) -> Result<Explanation> {
        let Some(row) = rows.first() else {
            debug!("No transaction selected, nothing to explain");
            return Ok(Explanation::default());
        };

        let values = model.attributions(row)?.fraud_class_values();
        Ok(self.pair(feature_names, &values))
    }

    /// Explain a dataset record using the context's model
    pub fn explain_record(
        &self,
        ctx: &DashboardContext,
        record: &TransactionRecord,
    ) -> Result<Explanation> {
        let extractor = FeatureExtractor::new(ctx.dataset(), ctx.feature_names())?;
        let rows = vec![extractor.extract(record)];
        self.explain(ctx.model(), extractor.feature_names(), &rows)
    }

    /// Pair names with values, truncating both to the shorter length, and
    /// keep the `top_k` largest by absolute value.
    pub fn pair(&self, feature_names: &[String], values: &[f64]) -> Explanation {
        let len = feature_names.len().min(values.len());

        let length_mismatch = if feature_names.len() != values.len() {
            warn!(
                features = feature_names.len(),
                values = values.len(),
                kept = len,
                "Attribution length differs from feature list; truncating both"
            );
            Some(LengthMismatch {
                features: feature_names.len(),
                values: values.len(),
            })
        } else {
            None
        };

        let mut attributions: Vec<FeatureAttribution> = feature_names[..len]
            .iter()
            .zip(&values[..len])
            .map(|(feature, &impact)| FeatureAttribution {
                feature: feature.clone(),
                impact,
            })
            .collect();

        attributions.sort_by(|a, b| b.impact.abs().total_cmp(&a.impact.abs()));
        attributions.truncate(self.top_k);

        Explanation {
            attributions,
            length_mismatch,
        }
    }
}

impl Default for AttributionExplainer {
    fn default() -> Self {
        Self::new(TOP_ATTRIBUTIONS)
    }
}
