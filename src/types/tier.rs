//! Risk tier classification

use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed boundary between the Medium and High tiers.
pub const HIGH_RISK_CUT: f64 = 0.6;

/// Discretized risk category
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl RiskTier {
    pub const ALL: [RiskTier; 3] = [RiskTier::Low, RiskTier::Medium, RiskTier::High];

    /// Assign a tier from bin edges `[0, risk_threshold, 0.6, 1]`.
    ///
    /// Bins are right-closed and the first bin also includes 0, so a score
    /// of exactly zero is Low. Scores outside `[0, 1]` (or NaN) get no tier.
    /// When `risk_threshold >= 0.6` the Medium bin is empty.
    pub fn classify(score: f64, bounds: &TierBoundaries) -> Option<Self> {
        if !(0.0..=1.0).contains(&score) {
            return None;
        }

        if score <= bounds.risk_threshold {
            Some(RiskTier::Low)
        } else if score <= bounds.high_cut {
            Some(RiskTier::Medium)
        } else {
            Some(RiskTier::High)
        }
    }

    /// Recommended handling for transactions in this tier
    pub fn decision(&self) -> &'static str {
        match self {
            RiskTier::Low => "Auto-approve",
            RiskTier::Medium => "Step-up authentication",
            RiskTier::High => "Block or manual review",
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RiskTier::Low => "Low",
            RiskTier::Medium => "Medium",
            RiskTier::High => "High",
        };
        f.write_str(name)
    }
}

/// Tier cut points
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierBoundaries {
    /// Boundary between Low and Medium (user adjustable)
    pub risk_threshold: f64,
    /// Boundary between Medium and High
    pub high_cut: f64,
}

impl TierBoundaries {
    pub fn new(risk_threshold: f64) -> Self {
        Self {
            risk_threshold,
            high_cut: HIGH_RISK_CUT,
        }
    }

    /// Medium tier can never be populated with these boundaries
    pub fn is_degenerate(&self) -> bool {
        self.risk_threshold >= self.high_cut
    }
}

impl Default for TierBoundaries {
    fn default() -> Self {
        Self::new(0.3)
    }
}
