//! Transaction dataset loading and amount filtering.
//!
//! The dataset is read once from CSV and never mutated afterwards. Filtering
//! by amount produces an [`AmountView`] of borrowed records.

use crate::error::{DashboardError, Result};
use crate::types::transaction::TransactionRecord;
use serde::Serialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// Monetary amount column
pub const AMOUNT_COLUMN: &str = "Amount";
/// Elapsed time column
pub const TIME_COLUMN: &str = "Time";
/// Label column names probed, in order, when none is configured
pub const LABEL_CANDIDATES: [&str; 6] = ["Class", "class", "is_fraud", "fraud", "target", "label"];

/// Inclusive amount interval used to filter transactions
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AmountRange {
    pub lo: f64,
    pub hi: f64,
}

impl AmountRange {
    pub fn new(lo: f64, hi: f64) -> Result<Self> {
        if !lo.is_finite() || !hi.is_finite() || lo > hi {
            return Err(DashboardError::InvalidRange { lo, hi });
        }
        Ok(Self { lo, hi })
    }

    pub fn contains(&self, amount: f64) -> bool {
        amount >= self.lo && amount <= self.hi
    }
}

/// Headline dataset statistics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetSummary {
    pub total_transactions: usize,
    pub fraud_transactions: usize,
    /// Share of fraud-labelled rows, in percent
    pub fraud_rate_pct: f64,
    pub mean_amount: f64,
    pub min_amount: f64,
    pub max_amount: f64,
    /// 95th percentile of the amount column
    pub p95_amount: f64,
}

/// Records whose amount lies within a range
#[derive(Debug, Clone)]
pub struct AmountView<'a> {
    range: AmountRange,
    records: Vec<&'a TransactionRecord>,
}

impl<'a> AmountView<'a> {
    pub fn range(&self) -> AmountRange {
        self.range
    }

    pub fn records(&self) -> &[&'a TransactionRecord] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a TransactionRecord> + '_ {
        self.records.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// In-memory transaction table
#[derive(Debug, Clone)]
pub struct Dataset {
    columns: Vec<String>,
    column_index: HashMap<String, usize>,
    label_column: String,
    records: Vec<TransactionRecord>,
}

impl Dataset {
    /// Load a dataset from a CSV file.
    ///
    /// `label_column` names the fraud label column; when `None` the
    /// [`LABEL_CANDIDATES`] are probed once and the first match wins.
    pub fn load<P: AsRef<Path>>(path: P, label_column: Option<&str>) -> Result<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading transaction dataset");

        let file = File::open(path)?;
        Self::from_reader(file, label_column)
    }

    /// Load a dataset from any CSV source with a header row.
    pub fn from_reader<R: Read>(reader: R, label_column: Option<&str>) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let columns: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
        let column_index: HashMap<String, usize> = columns
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();

        let missing: Vec<String> = [TIME_COLUMN, AMOUNT_COLUMN]
            .iter()
            .filter(|c| !column_index.contains_key(**c))
            .map(|c| c.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(DashboardError::SchemaMismatch { missing });
        }

        let label_column = resolve_label_column(&columns, label_column)?;
        let time_idx = column_index[TIME_COLUMN];
        let amount_idx = column_index[AMOUNT_COLUMN];
        let label_idx = column_index[&label_column];

        let mut records = Vec::new();
        for (row, result) in rdr.records().enumerate() {
            let raw = result?;
            let mut values = Vec::with_capacity(columns.len());
            for (column, field) in columns.iter().zip(raw.iter()) {
                // NaN and infinities parse but poison the summary statistics
                let value = field
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| DashboardError::InvalidValue {
                        row,
                        column: column.clone(),
                        value: field.to_string(),
                    })?;
                values.push(value);
            }

            let label = match values[label_idx] {
                v if v == 0.0 => 0,
                v if v == 1.0 => 1,
                value => return Err(DashboardError::InvalidLabel { row, value }),
            };

            records.push(TransactionRecord {
                row,
                time: values[time_idx],
                amount: values[amount_idx],
                label,
                values,
            });
        }

        if records.is_empty() {
            return Err(DashboardError::EmptyDataset);
        }

        info!(
            rows = records.len(),
            columns = columns.len(),
            label_column = %label_column,
            "Dataset loaded"
        );

        Ok(Self {
            columns,
            column_index,
            label_column,
            records,
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Position of a column in each record's `values`
    pub fn column_position(&self, name: &str) -> Option<usize> {
        self.column_index.get(name).copied()
    }

    pub fn label_column(&self) -> &str {
        &self.label_column
    }

    pub fn records(&self) -> &[TransactionRecord] {
        &self.records
    }

    /// Record at a given file row
    pub fn record(&self, row: usize) -> Option<&TransactionRecord> {
        self.records.get(row)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Select rows with `range.lo <= Amount <= range.hi`
    pub fn filter_by_amount(&self, range: AmountRange) -> AmountView<'_> {
        let records: Vec<&TransactionRecord> = self
            .records
            .iter()
            .filter(|r| range.contains(r.amount))
            .collect();

        debug!(
            lo = range.lo,
            hi = range.hi,
            selected = records.len(),
            total = self.records.len(),
            "Applied amount filter"
        );

        AmountView { range, records }
    }

    /// Compute headline statistics
    pub fn summary(&self) -> DatasetSummary {
        let total = self.records.len();
        let fraud = self.records.iter().filter(|r| r.is_fraud()).count();

        let mut amounts: Vec<f64> = self.records.iter().map(|r| r.amount).collect();
        amounts.sort_by(f64::total_cmp);

        let (fraud_rate_pct, mean_amount) = if total > 0 {
            (
                fraud as f64 / total as f64 * 100.0,
                amounts.iter().sum::<f64>() / total as f64,
            )
        } else {
            (0.0, 0.0)
        };

        DatasetSummary {
            total_transactions: total,
            fraud_transactions: fraud,
            fraud_rate_pct,
            mean_amount,
            min_amount: amounts.first().copied().unwrap_or(0.0),
            max_amount: amounts.last().copied().unwrap_or(0.0),
            p95_amount: quantile(&amounts, 0.95),
        }
    }

    /// Build the active amount range.
    ///
    /// Missing bounds default to `0` and the 95th percentile; every bound is
    /// clamped into the dataset's min/max amount.
    pub fn amount_range(&self, lo: Option<f64>, hi: Option<f64>) -> Result<AmountRange> {
        let summary = self.summary();
        let clamp = |v: f64| v.clamp(summary.min_amount, summary.max_amount);

        let lo = clamp(lo.unwrap_or(0.0));
        let hi = clamp(hi.unwrap_or(summary.p95_amount));
        AmountRange::new(lo, hi)
    }
}

/// Resolve the label column against the header.
pub fn resolve_label_column(columns: &[String], configured: Option<&str>) -> Result<String> {
    let candidates: Vec<&str> = match configured {
        Some(name) => vec![name],
        None => LABEL_CANDIDATES.to_vec(),
    };

    candidates
        .iter()
        .find(|c| columns.iter().any(|col| col == *c))
        .map(|c| c.to_string())
        .ok_or_else(|| DashboardError::LabelColumnNotFound {
            candidates: candidates.iter().map(|c| c.to_string()).collect(),
            available: columns.to_vec(),
        })
}

/// Quantile of sorted values with linear interpolation between closest ranks
fn quantile(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        n => {
            let pos = q.clamp(0.0, 1.0) * (n - 1) as f64;
            let lower = pos.floor() as usize;
            let upper = pos.ceil() as usize;
            let frac = pos - lower as f64;
            sorted[lower] + (sorted[upper] - sorted[lower]) * frac
        }
    }
}
