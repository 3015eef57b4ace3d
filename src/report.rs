//! Dashboard report assembly and rendering.
//!
//! One [`DashboardReport`] corresponds to one interaction: the current amount
//! filter, risk threshold and selected transaction. It renders as a text
//! dashboard or serializes to JSON.

use crate::context::DashboardContext;
use crate::dataset::{AmountRange, DatasetSummary};
use crate::error::Result;
use crate::explain::{AttributionExplainer, Explanation};
use crate::impact::{ImpactEstimate, ImpactEstimator};
use crate::scoring::{RiskScoringPipeline, ScoredSet, TierCounts, DEFAULT_BATCH_SIZE, TOP_HIGH_RISK};
use crate::types::tier::{RiskTier, TierBoundaries};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::{self, Write};
use tracing::warn;
use uuid::Uuid;

const BAR_WIDTH: usize = 40;

/// Settings for a single dashboard interaction
#[derive(Debug, Clone, Copy)]
pub struct ReportOptions {
    pub range: AmountRange,
    pub bounds: TierBoundaries,
    pub impact: ImpactEstimator,
    /// Dataset row to explain; defaults to the first high-risk row
    pub explain_row: Option<usize>,
    pub batch_size: usize,
}

impl ReportOptions {
    pub fn new(range: AmountRange, bounds: TierBoundaries) -> Self {
        Self {
            range,
            bounds,
            impact: ImpactEstimator::default(),
            explain_row: None,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// Row of the high-risk transaction table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HighRiskRow {
    pub row: usize,
    pub time: f64,
    pub amount: f64,
    pub risk_score: f64,
}

/// Content of the explanation panel
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExplanationPanel {
    Explained { row: usize, explanation: Explanation },
    Notice { message: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardReport {
    pub report_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub summary: DatasetSummary,
    pub amount_range: AmountRange,
    pub risk_threshold: f64,
    pub scored_transactions: usize,
    pub tier_counts: TierCounts,
    pub high_risk: Vec<HighRiskRow>,
    pub impact: ImpactEstimate,
    pub explanation: ExplanationPanel,
}

impl DashboardReport {
    /// Run the full pipeline for one interaction.
    ///
    /// Data, schema and model errors abort the report; an unsupported
    /// attribution mechanism only replaces the explanation with a notice.
    pub fn build(ctx: &DashboardContext, options: &ReportOptions) -> Result<Self> {
        let scored = RiskScoringPipeline::new(ctx)
            .with_batch_size(options.batch_size)
            .score(options.range, options.bounds)?;

        let high_risk = scored
            .top_high_risk(TOP_HIGH_RISK)
            .into_iter()
            .map(|s| HighRiskRow {
                row: s.record.row,
                time: s.record.time,
                amount: s.record.amount,
                risk_score: s.risk_score,
            })
            .collect();

        let explanation = explanation_panel(ctx, &scored, options.explain_row)?;

        Ok(Self {
            report_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            summary: ctx.dataset().summary(),
            amount_range: scored.range(),
            risk_threshold: options.bounds.risk_threshold,
            scored_transactions: scored.len(),
            tier_counts: scored.tier_counts(),
            high_risk,
            impact: options.impact.estimate(scored.rows()),
            explanation,
        })
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn explanation_panel(
    ctx: &DashboardContext,
    scored: &ScoredSet<'_>,
    requested: Option<usize>,
) -> Result<ExplanationPanel> {
    let target = match requested {
        Some(row) => scored.get(row).filter(|s| s.is_high_risk()),
        None => scored.high_risk().next(),
    };

    let Some(target) = target else {
        let message = match requested {
            Some(row) if scored.high_risk().next().is_some() => {
                format!("Transaction {} is not in the current high-risk set.", row)
            }
            _ => "No high-risk transactions available for explanation.".to_string(),
        };
        return Ok(ExplanationPanel::Notice { message });
    };

    match AttributionExplainer::default().explain_record(ctx, target.record) {
        Ok(explanation) => Ok(ExplanationPanel::Explained {
            row: target.record.row,
            explanation,
        }),
        Err(e) if e.is_local() => {
            warn!(row = target.record.row, error = %e, "Explanation unavailable");
            Ok(ExplanationPanel::Notice {
                message: e.to_string(),
            })
        }
        Err(e) => Err(e),
    }
}

/// `1234567.0` -> `$1,234,567`
fn format_currency(value: f64) -> String {
    let rounded = value.round() as i64;
    let digits = rounded.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if rounded < 0 {
        format!("-${}", grouped)
    } else {
        format!("${}", grouped)
    }
}

fn bar(count: usize, max: usize) -> String {
    if max == 0 {
        return String::new();
    }
    let len = (count as f64 / max as f64 * BAR_WIDTH as f64).round() as usize;
    "█".repeat(len)
}

impl fmt::Display for DashboardReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        let rule = "═".repeat(64);

        writeln!(out, "╔{}╗", rule)?;
        writeln!(out, "║{:^64}║", "CREDIT CARD FRAUD RISK DASHBOARD")?;
        writeln!(out, "╚{}╝", rule)?;
        writeln!(
            out,
            "Total Transactions: {}  │  Fraud Rate: {:.3}%  │  Avg Amount: {:.2}",
            self.summary.total_transactions, self.summary.fraud_rate_pct, self.summary.mean_amount
        )?;
        writeln!(
            out,
            "Amount filter: [{:.2}, {:.2}]  │  Risk threshold: {:.2}  │  Scored: {}",
            self.amount_range.lo, self.amount_range.hi, self.risk_threshold, self.scored_transactions
        )?;

        writeln!(out, "\nRisk Tier Distribution")?;
        let max = RiskTier::ALL
            .iter()
            .map(|t| self.tier_counts.get(*t))
            .max()
            .unwrap_or(0);
        for tier in RiskTier::ALL {
            let count = self.tier_counts.get(tier);
            writeln!(out, "  {:<7} {:>8}  {}", tier.to_string(), count, bar(count, max))?;
        }
        if self.tier_counts.unassigned > 0 {
            writeln!(out, "  {:<7} {:>8}", "None", self.tier_counts.unassigned)?;
        }

        writeln!(out, "\nHigh Risk Transactions")?;
        if self.high_risk.is_empty() {
            writeln!(out, "  (none)")?;
        } else {
            writeln!(out, "  {:>8}  {:>12}  {:>12}  {:>10}", "Row", "Time", "Amount", "Risk")?;
            for row in &self.high_risk {
                writeln!(
                    out,
                    "  {:>8}  {:>12.0}  {:>12.2}  {:>10.4}",
                    row.row, row.time, row.amount, row.risk_score
                )?;
            }
        }

        writeln!(out, "\nEstimated Business Impact")?;
        writeln!(
            out,
            "  Fraud Loss Prevented:   {:>14}  ({} caught)",
            format_currency(self.impact.fraud_loss_prevented),
            self.impact.true_positives
        )?;
        writeln!(
            out,
            "  Customer Friction Cost: {:>14}  ({} false alerts)",
            format_currency(self.impact.friction_cost),
            self.impact.false_positives
        )?;

        writeln!(out, "\nWhy was this transaction flagged?")?;
        match &self.explanation {
            ExplanationPanel::Explained { row, explanation } => {
                writeln!(out, "  Transaction row {}", row)?;
                if let Some(mismatch) = explanation.length_mismatch {
                    writeln!(
                        out,
                        "  ! {} attribution values for {} features; showing the first {}",
                        mismatch.values,
                        mismatch.features,
                        mismatch.values.min(mismatch.features)
                    )?;
                }
                let max = explanation
                    .attributions
                    .iter()
                    .map(|a| a.impact.abs())
                    .fold(0.0_f64, f64::max);
                for a in &explanation.attributions {
                    let len = if max > 0.0 {
                        (a.impact.abs() / max * 20.0).round() as usize
                    } else {
                        0
                    };
                    let (sign, glyph) = if a.impact > 0.0 { ("+", "▲") } else { ("-", "▼") };
                    writeln!(
                        out,
                        "  {:<16} {}{:<10.5} {} {}",
                        a.feature,
                        sign,
                        a.impact.abs(),
                        glyph,
                        "█".repeat(len)
                    )?;
                }
            }
            ExplanationPanel::Notice { message } => writeln!(out, "  {}", message)?,
        }

        writeln!(out, "\nDecision Strategy")?;
        for tier in RiskTier::ALL {
            writeln!(out, "  {:<7} → {}", tier.to_string(), tier.decision())?;
        }

        f.write_str(&out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AttributionOutput;
    use crate::testing::{scored_dataset, PassthroughModel};
    use ndarray::arr1;

    fn rows() -> Vec<(f64, f64, u8)> {
        vec![
            (10.0, 0.1, 0),
            (20.0, 0.7, 1),
            (30.0, 0.95, 1),
            (40.0, 0.4, 0),
            (50.0, 0.8, 0),
        ]
    }

    fn options() -> ReportOptions {
        ReportOptions::new(AmountRange::new(0.0, 100.0).unwrap(), TierBoundaries::new(0.3))
    }

    #[test]
    fn test_report_without_attribution_support() {
        let ctx = DashboardContext::new(
            scored_dataset(&rows()),
            Box::new(PassthroughModel::new(&["Score"])),
        );
        let report = DashboardReport::build(&ctx, &options()).unwrap();

        assert_eq!(report.scored_transactions, 5);
        assert_eq!(report.tier_counts.high, 3);
        assert_eq!(report.high_risk[0].row, 2);
        assert_eq!(report.impact.fraud_loss_prevented, 2000.0);
        assert_eq!(report.impact.friction_cost, 20.0);
        assert!(matches!(report.explanation, ExplanationPanel::Notice { .. }));
    }

    #[test]
    fn test_report_explains_first_high_risk_row() {
        let model = PassthroughModel::new(&["Score", "V2"])
            .with_attribution(AttributionOutput::Single(arr1(&[0.3, -0.05]).into_dyn()));
        let ctx = DashboardContext::new(scored_dataset(&rows()), Box::new(model));
        let report = DashboardReport::build(&ctx, &options()).unwrap();

        match &report.explanation {
            ExplanationPanel::Explained { row, explanation } => {
                assert_eq!(*row, 1);
                assert_eq!(explanation.attributions.len(), 2);
            }
            other => panic!("unexpected panel: {:?}", other),
        }

        let text = report.to_string();
        assert!(text.contains("High Risk Transactions"));
        assert!(text.contains("$2,000"));
        assert!(text.contains("Block or manual review"));
    }

    #[test]
    fn test_requested_row_outside_high_tier() {
        let ctx = DashboardContext::new(
            scored_dataset(&rows()),
            Box::new(PassthroughModel::new(&["Score"])),
        );
        let mut opts = options();
        opts.explain_row = Some(0);
        let report = DashboardReport::build(&ctx, &opts).unwrap();

        match report.explanation {
            ExplanationPanel::Notice { message } => assert!(message.contains("not in")),
            other => panic!("unexpected panel: {:?}", other),
        }
    }

    #[test]
    fn test_empty_high_tier_is_not_an_error() {
        let ctx = DashboardContext::new(
            scored_dataset(&[(10.0, 0.1, 0), (20.0, 0.2, 1)]),
            Box::new(PassthroughModel::new(&["Score"])),
        );
        let report = DashboardReport::build(&ctx, &options()).unwrap();
        assert!(report.high_risk.is_empty());
        assert_eq!(report.impact, ImpactEstimate::default());
        assert!(report.to_string().contains("No high-risk transactions"));
    }

    #[test]
    fn test_json_report() {
        let ctx = DashboardContext::new(
            scored_dataset(&rows()),
            Box::new(PassthroughModel::new(&["Score"])),
        );
        let report = DashboardReport::build(&ctx, &options()).unwrap();
        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();

        assert_eq!(json["tier_counts"]["high"], 3);
        assert_eq!(json["explanation"]["status"], "notice");
        assert_eq!(json["high_risk"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(0.0), "$0");
        assert_eq!(format_currency(20.0), "$20");
        assert_eq!(format_currency(2000.0), "$2,000");
        assert_eq!(format_currency(1234567.0), "$1,234,567");
        assert_eq!(format_currency(-1500.0), "-$1,500");
    }
}
