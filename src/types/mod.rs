//! Type definitions shared across the risk dashboard

pub mod tier;
pub mod transaction;

pub use tier::{RiskTier, TierBoundaries, HIGH_RISK_CUT};
pub use transaction::TransactionRecord;
