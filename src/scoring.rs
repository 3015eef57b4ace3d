//! Risk scoring pipeline.
//!
//! Filters the dataset by amount, scores every selected row with the
//! classifier and bins the scores into risk tiers.

use crate::context::DashboardContext;
use crate::dataset::{AmountRange, AmountView};
use crate::error::{DashboardError, Result};
use crate::feature_extractor::FeatureExtractor;
use crate::types::tier::{RiskTier, TierBoundaries};
use crate::types::transaction::TransactionRecord;
use serde::Serialize;
use tracing::{debug, info, warn};

/// Rows shown in the high-risk transaction table
pub const TOP_HIGH_RISK: usize = 20;

/// Default number of rows per `predict_proba` call
pub const DEFAULT_BATCH_SIZE: usize = 256;

/// A transaction with its model score and tier
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredTransaction<'a> {
    #[serde(flatten)]
    pub record: &'a TransactionRecord,
    pub risk_score: f64,
    pub risk_tier: Option<RiskTier>,
}

impl ScoredTransaction<'_> {
    pub fn is_high_risk(&self) -> bool {
        self.risk_tier == Some(RiskTier::High)
    }
}

/// Number of rows per tier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TierCounts {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
    /// Rows whose score fell outside every bin
    pub unassigned: usize,
}

impl TierCounts {
    pub fn get(&self, tier: RiskTier) -> usize {
        match tier {
            RiskTier::Low => self.low,
            RiskTier::Medium => self.medium,
            RiskTier::High => self.high,
        }
    }

    pub fn total(&self) -> usize {
        self.low + self.medium + self.high + self.unassigned
    }
}

/// Output of one scoring pass
#[derive(Debug, Clone)]
pub struct ScoredSet<'a> {
    range: AmountRange,
    bounds: TierBoundaries,
    rows: Vec<ScoredTransaction<'a>>,
}

impl<'a> ScoredSet<'a> {
    pub fn range(&self) -> AmountRange {
        self.range
    }

    pub fn bounds(&self) -> TierBoundaries {
        self.bounds
    }

    /// Scored rows in dataset order
    pub fn rows(&self) -> &[ScoredTransaction<'a>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Scored row for a dataset row index
    pub fn get(&self, row: usize) -> Option<&ScoredTransaction<'a>> {
        self.rows.iter().find(|s| s.record.row == row)
    }

    pub fn tier_counts(&self) -> TierCounts {
        let mut counts = TierCounts::default();
        for scored in &self.rows {
            match scored.risk_tier {
                Some(RiskTier::Low) => counts.low += 1,
                Some(RiskTier::Medium) => counts.medium += 1,
                Some(RiskTier::High) => counts.high += 1,
                None => counts.unassigned += 1,
            }
        }
        counts
    }

    /// High-tier rows in dataset order
    pub fn high_risk(&self) -> impl Iterator<Item = &ScoredTransaction<'a>> + '_ {
        self.rows.iter().filter(|s| s.is_high_risk())
    }

    /// Up to `limit` high-tier rows by descending score; ties keep dataset order
    pub fn top_high_risk(&self, limit: usize) -> Vec<&ScoredTransaction<'a>> {
        let mut high: Vec<&ScoredTransaction<'a>> = self.high_risk().collect();
        high.sort_by(|a, b| b.risk_score.total_cmp(&a.risk_score));
        high.truncate(limit);
        high
    }
}

/// Scores filtered transactions against the context's model
pub struct RiskScoringPipeline<'c> {
    ctx: &'c DashboardContext,
    batch_size: usize,
}

impl<'c> RiskScoringPipeline<'c> {
    pub fn new(ctx: &'c DashboardContext) -> Self {
        Self {
            ctx,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Filter by amount, then score and tier the selected rows
    pub fn score(&self, range: AmountRange, bounds: TierBoundaries) -> Result<ScoredSet<'c>> {
        let view = self.ctx.dataset().filter_by_amount(range);
        self.score_view(&view, bounds)
    }

    /// Score and tier an already filtered view
    pub fn score_view(&self, view: &AmountView<'c>, bounds: TierBoundaries) -> Result<ScoredSet<'c>> {
        let model = self.ctx.model();
        let extractor = FeatureExtractor::new(self.ctx.dataset(), model.feature_names())?;
        debug!(
            model = %model.name(),
            features = extractor.feature_count(),
            rows = view.len(),
            "Scoring amount view"
        );

        if bounds.is_degenerate() {
            warn!(
                risk_threshold = bounds.risk_threshold,
                high_cut = bounds.high_cut,
                "Risk threshold is not below the high-risk cut; Medium tier will be empty"
            );
        }

        let mut rows = Vec::with_capacity(view.len());
        for chunk in view.records().chunks(self.batch_size) {
            let features = extractor.extract_batch(chunk.iter().copied());
            let probs = model.predict_proba(&features)?;

            if probs.len() != chunk.len() {
                return Err(DashboardError::Model(format!(
                    "{} returned {} predictions for {} rows",
                    model.name(),
                    probs.len(),
                    chunk.len()
                )));
            }

            for (record, proba) in chunk.iter().copied().zip(probs) {
                let risk_score = proba[1];
                if !risk_score.is_finite() || !(0.0..=1.0).contains(&risk_score) {
                    return Err(DashboardError::Model(format!(
                        "{} produced fraud probability {} for row {}",
                        model.name(),
                        risk_score,
                        record.row
                    )));
                }

                rows.push(ScoredTransaction {
                    record,
                    risk_score,
                    risk_tier: RiskTier::classify(risk_score, &bounds),
                });
            }

            debug!(batch = chunk.len(), "Scored batch");
        }

        let scored = ScoredSet {
            range: view.range(),
            bounds,
            rows,
        };

        let counts = scored.tier_counts();
        info!(
            lo = scored.range.lo,
            hi = scored.range.hi,
            risk_threshold = bounds.risk_threshold,
            scored = scored.len(),
            low = counts.low,
            medium = counts.medium,
            high = counts.high,
            "Risk scoring complete"
        );

        Ok(scored)
    }
}
