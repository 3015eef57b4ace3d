//! Business impact estimate for the high-risk tier

use crate::scoring::ScoredTransaction;
use serde::{Deserialize, Serialize};

/// Loss avoided per fraudulent transaction caught
pub const FRAUD_COST: f64 = 1000.0;
/// Friction cost per legitimate transaction flagged
pub const FALSE_ALERT_COST: f64 = 20.0;

/// Estimated monetary impact of acting on the high-risk tier
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ImpactEstimate {
    /// High-tier rows labelled fraud
    pub true_positives: usize,
    /// High-tier rows labelled legitimate
    pub false_positives: usize,
    pub fraud_loss_prevented: f64,
    pub friction_cost: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImpactEstimator {
    fraud_cost: f64,
    false_alert_cost: f64,
}

impl ImpactEstimator {
    pub fn new(fraud_cost: f64, false_alert_cost: f64) -> Self {
        Self {
            fraud_cost,
            false_alert_cost,
        }
    }

    /// Count true/false positives among High-tier rows and price them.
    pub fn estimate(&self, rows: &[ScoredTransaction<'_>]) -> ImpactEstimate {
        let (true_positives, false_positives) = rows
            .iter()
            .filter(|s| s.is_high_risk())
            .fold((0, 0), |(tp, fp), s| {
                if s.record.is_fraud() {
                    (tp + 1, fp)
                } else {
                    (tp, fp + 1)
                }
            });

        ImpactEstimate {
            true_positives,
            false_positives,
            fraud_loss_prevented: true_positives as f64 * self.fraud_cost,
            friction_cost: false_positives as f64 * self.false_alert_cost,
        }
    }
}

impl Default for ImpactEstimator {
    fn default() -> Self {
        Self::new(FRAUD_COST, FALSE_ALERT_COST)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::tier::RiskTier;
    use crate::types::transaction::TransactionRecord;

    fn record(row: usize, label: u8) -> TransactionRecord {
        TransactionRecord {
            row,
            time: row as f64,
            amount: 10.0,
            label,
            values: Vec::new(),
        }
    }

    fn scored(record: &TransactionRecord, tier: RiskTier) -> ScoredTransaction<'_> {
        ScoredTransaction {
            record,
            risk_score: match tier {
                RiskTier::Low => 0.1,
                RiskTier::Medium => 0.5,
                RiskTier::High => 0.9,
            },
            risk_tier: Some(tier),
        }
    }

    #[test]
    fn test_high_tier_impact() {
        let records = [record(0, 1), record(1, 1), record(2, 0)];
        let rows: Vec<ScoredTransaction> = records.iter().map(|r| scored(r, RiskTier::High)).collect();

        let estimate = ImpactEstimator::new(1000.0, 20.0).estimate(&rows);
        assert_eq!(estimate.true_positives, 2);
        assert_eq!(estimate.false_positives, 1);
        assert_eq!(estimate.fraud_loss_prevented, 2000.0);
        assert_eq!(estimate.friction_cost, 20.0);
    }

    #[test]
    fn test_lower_tiers_are_ignored() {
        let records = [record(0, 1), record(1, 0), record(2, 1)];
        let rows = vec![
            scored(&records[0], RiskTier::Low),
            scored(&records[1], RiskTier::Medium),
            scored(&records[2], RiskTier::High),
        ];

        let estimate = ImpactEstimator::default().estimate(&rows);
        assert_eq!(estimate.fraud_loss_prevented, FRAUD_COST);
        assert_eq!(estimate.friction_cost, 0.0);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(ImpactEstimator::default().estimate(&[]), ImpactEstimate::default());
    }
}
