//! Fraud Risk Dashboard Library
//!
//! Scores a transaction dataset with a pre-trained fraud classifier, bins
//! the scores into risk tiers, estimates the business impact of acting on
//! the high-risk tier and explains individual flagged transactions.

pub mod config;
pub mod context;
pub mod dataset;
pub mod error;
pub mod explain;
pub mod feature_extractor;
pub mod impact;
pub mod models;
pub mod report;
pub mod scoring;
pub mod types;

#[cfg(test)]
mod testing;

pub use config::AppConfig;
pub use context::DashboardContext;
pub use dataset::{AmountRange, Dataset};
pub use error::{DashboardError, Result};
pub use explain::{AttributionExplainer, Explanation};
pub use feature_extractor::FeatureExtractor;
pub use impact::{ImpactEstimate, ImpactEstimator};
pub use models::{Classifier, ModelLoader};
pub use report::{DashboardReport, ReportOptions};
pub use scoring::{RiskScoringPipeline, ScoredSet};
pub use types::{tier::RiskTier, transaction::TransactionRecord};
