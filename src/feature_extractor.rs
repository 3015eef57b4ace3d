//! Feature extraction for model inference.
//!
//! Resolves the classifier's expected feature names against the dataset
//! columns once, then pulls each record's values out in the exact order the
//! model was trained on.

use crate::dataset::Dataset;
use crate::error::{DashboardError, Result};
use crate::types::transaction::TransactionRecord;

/// Column positions for a model's feature list.
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    names: Vec<String>,
    positions: Vec<usize>,
}

impl FeatureExtractor {
    /// Map feature names onto dataset columns.
    ///
    /// Fails with [`DashboardError::SchemaMismatch`] naming every feature the
    /// dataset does not provide.
    pub fn new(dataset: &Dataset, feature_names: &[String]) -> Result<Self> {
        let mut positions = Vec::with_capacity(feature_names.len());
        let mut missing = Vec::new();

        for name in feature_names {
            match dataset.column_position(name) {
                Some(pos) => positions.push(pos),
                None => missing.push(name.clone()),
            }
        }

        if !missing.is_empty() {
            return Err(DashboardError::SchemaMismatch { missing });
        }

        Ok(Self {
            names: feature_names.to_vec(),
            positions,
        })
    }

    /// Extract one record's feature vector in model order.
    pub fn extract(&self, tx: &TransactionRecord) -> Vec<f64> {
        self.positions.iter().map(|&pos| tx.values[pos]).collect()
    }

    /// Extract a batch of records.
    pub fn extract_batch<'a, I>(&self, records: I) -> Vec<Vec<f64>>
    where
        I: IntoIterator<Item = &'a TransactionRecord>,
    {
        records.into_iter().map(|tx| self.extract(tx)).collect()
    }

    /// Get the number of features produced.
    pub fn feature_count(&self) -> usize {
        self.positions.len()
    }

    /// Get feature names in model order.
    pub fn feature_names(&self) -> &[String] {
        &self.names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset() -> Dataset {
        let csv = "Time,V1,V2,Amount,Class\n0,0.5,-1.2,10.0,0\n1,1.5,0.3,250.0,1\n";
        Dataset::from_reader(csv.as_bytes(), None).unwrap()
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_feature_extraction_follows_model_order() {
        let ds = dataset();
        let extractor = FeatureExtractor::new(&ds, &names(&["Amount", "V2", "V1"])).unwrap();

        let features = extractor.extract(ds.record(1).unwrap());
        assert_eq!(features, vec![250.0, 0.3, 1.5]);
        assert_eq!(extractor.feature_count(), 3);
        assert_eq!(extractor.feature_names(), names(&["Amount", "V2", "V1"]).as_slice());
    }

    #[test]
    fn test_missing_features_are_all_named() {
        let ds = dataset();
        let err = FeatureExtractor::new(&ds, &names(&["V1", "V3", "V4"])).unwrap_err();
        match err {
            DashboardError::SchemaMismatch { missing } => {
                assert_eq!(missing, names(&["V3", "V4"]));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_batch_extraction() {
        let ds = dataset();
        let extractor = FeatureExtractor::new(&ds, &names(&["V1"])).unwrap();
        let batch = extractor.extract_batch(ds.records());
        assert_eq!(batch, vec![vec![0.5], vec![1.5]]);
    }
}
