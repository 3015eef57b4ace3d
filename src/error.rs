//! Error types for the risk dashboard library.

use thiserror::Error;

/// Library result type alias.
pub type Result<T> = std::result::Result<T, DashboardError>;

/// Errors raised while loading data, scoring or explaining transactions.
#[derive(Error, Debug)]
pub enum DashboardError {
    /// IO error while reading a dataset or model artifact.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed CSV input.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// One or more required columns are absent from the dataset.
    #[error("Schema mismatch: missing column(s) {}", missing.join(", "))]
    SchemaMismatch { missing: Vec<String> },

    /// No usable fraud label column was found.
    #[error(
        "No fraud label column found (looked for {}); available columns: {}",
        candidates.join(", "),
        available.join(", ")
    )]
    LabelColumnNotFound {
        candidates: Vec<String>,
        available: Vec<String>,
    },

    /// A cell could not be parsed as a number.
    #[error("Invalid value {value:?} in column {column} at row {row}")]
    InvalidValue {
        row: usize,
        column: String,
        value: String,
    },

    /// A label cell was not 0 or 1.
    #[error("Invalid fraud label {value} at row {row} (expected 0 or 1)")]
    InvalidLabel { row: usize, value: f64 },

    /// The dataset has a header but no rows.
    #[error("Dataset contains no transactions")]
    EmptyDataset,

    /// Amount filter bounds are inverted or not finite.
    #[error("Invalid amount range [{lo}, {hi}]")]
    InvalidRange { lo: f64, hi: f64 },

    /// Model loading or inference failure.
    #[error("Model error: {0}")]
    Model(String),

    /// The model has no attribution mechanism.
    #[error("Explainability unsupported for model type {model}")]
    ExplainabilityUnsupported { model: String },
}

impl DashboardError {
    /// Whether the error is confined to the explanation panel.
    ///
    /// Everything else invalidates the whole view for the current interaction.
    pub fn is_local(&self) -> bool {
        matches!(self, DashboardError::ExplainabilityUnsupported { .. })
    }
}

impl From<serde_json::Error> for DashboardError {
    fn from(e: serde_json::Error) -> Self {
        DashboardError::Model(format!("invalid model artifact: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_mismatch_names_missing_features() {
        let err = DashboardError::SchemaMismatch {
            missing: vec!["V3".to_string(), "V7".to_string()],
        };
        assert_eq!(err.to_string(), "Schema mismatch: missing column(s) V3, V7");
        assert!(!err.is_local());
    }

    #[test]
    fn test_explainability_errors_are_local() {
        let err = DashboardError::ExplainabilityUnsupported {
            model: "onnx".to_string(),
        };
        assert!(err.is_local());
    }
}
