//! Transaction records loaded from the dataset

use serde::Serialize;

/// One row of the transaction dataset.
///
/// `values` holds every numeric column of the row, aligned with the
/// dataset's column list; `time`, `amount` and `label` are copies of the
/// corresponding cells kept for quick access.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionRecord {
    /// Zero-based position of the row in the source file
    pub row: usize,

    /// Seconds elapsed since the first transaction in the dataset
    pub time: f64,

    /// Transaction amount
    pub amount: f64,

    /// Ground-truth label (1 = known fraud, 0 = known legitimate)
    pub label: u8,

    /// All column values of the row
    #[serde(skip)]
    pub values: Vec<f64>,
}

impl TransactionRecord {
    /// Whether the transaction is labelled as fraud
    pub fn is_fraud(&self) -> bool {
        self.label == 1
    }

    /// Amount falls within `[lo, hi]` inclusive
    pub fn amount_in(&self, lo: f64, hi: f64) -> bool {
        self.amount >= lo && self.amount <= hi
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(amount: f64, label: u8) -> TransactionRecord {
        TransactionRecord {
            row: 0,
            time: 0.0,
            amount,
            label,
            values: vec![0.0, amount, label as f64],
        }
    }

    #[test]
    fn test_amount_bounds_are_inclusive() {
        let tx = record(100.0, 0);
        assert!(tx.amount_in(100.0, 100.0));
        assert!(tx.amount_in(0.0, 100.0));
        assert!(!tx.amount_in(100.01, 200.0));
    }

    #[test]
    fn test_serialization_skips_raw_values() {
        let json = serde_json::to_value(record(42.5, 1)).unwrap();
        assert_eq!(json["amount"], 42.5);
        assert_eq!(json["label"], 1);
        assert!(json.get("values").is_none());
    }
}
