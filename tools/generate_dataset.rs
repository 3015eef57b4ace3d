//! Synthetic Dataset Generator
//!
//! Writes a transaction CSV (`Time, V1..V5, Amount, Class`) and a matching
//! demo tree ensemble so the dashboard can run without external artifacts.
//!
//! ```bash
//! generate-dataset data/transactions.csv models/demo_forest.json 5000 0.02 42
//! ```

use fraud_risk_dashboard::models::forest::{DecisionTree, TreeEnsemble, TreeNode};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::info;

/// One CSV row
#[derive(Debug, Clone, Serialize)]
struct TransactionRow {
    #[serde(rename = "Time")]
    time: f64,
    #[serde(rename = "V1")]
    v1: f64,
    #[serde(rename = "V2")]
    v2: f64,
    #[serde(rename = "V3")]
    v3: f64,
    #[serde(rename = "V4")]
    v4: f64,
    #[serde(rename = "V5")]
    v5: f64,
    #[serde(rename = "Amount")]
    amount: f64,
    #[serde(rename = "Class")]
    class: u8,
}

/// Transaction generator for testing
struct TransactionGenerator {
    rng: StdRng,
    clock: f64,
}

impl TransactionGenerator {
    fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            clock: 0.0,
        }
    }

    fn tick(&mut self) -> f64 {
        self.clock += self.rng.gen_range(0.0..120.0_f64).round();
        self.clock
    }

    /// Generate a random legitimate transaction
    fn generate_legitimate(&mut self) -> TransactionRow {
        TransactionRow {
            time: self.tick(),
            v1: self.rng.gen_range(-1.0..1.0),
            v2: self.rng.gen_range(-1.0..1.0),
            v3: self.rng.gen_range(-1.0..1.0),
            v4: self.rng.gen_range(-2.0..2.0),
            v5: self.rng.gen_range(-2.0..2.0),
            amount: round_cents(self.rng.gen_range(1.0..250.0)),
            class: 0,
        }
    }

    /// Generate a fraudulent transaction; each signal fires with high
    /// probability so some fraud stays hard to catch
    fn generate_suspicious(&mut self) -> TransactionRow {
        let v1 = if self.rng.gen_bool(0.85) {
            self.rng.gen_range(1.5..4.0)
        } else {
            self.rng.gen_range(-1.0..1.0)
        };
        let v2 = if self.rng.gen_bool(0.8) {
            self.rng.gen_range(-4.0..-1.5)
        } else {
            self.rng.gen_range(-1.0..1.0)
        };

        TransactionRow {
            time: self.tick(),
            v1,
            v2,
            v3: self.rng.gen_range(0.5..3.0),
            v4: self.rng.gen_range(-2.0..2.0),
            v5: self.rng.gen_range(-2.0..2.0),
            amount: round_cents(self.rng.gen_range(100.0..2000.0)),
            class: 1,
        }
    }
}

fn round_cents(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Decision stumps matching the generator's fraud signals
fn demo_model(fraud_rate: f64) -> anyhow::Result<TreeEnsemble> {
    let stump = |feature: usize, threshold: f64, left: f64, right: f64| DecisionTree {
        nodes: vec![
            TreeNode::split(fraud_rate, feature, threshold, 1, 2),
            TreeNode::leaf(left),
            TreeNode::leaf(right),
        ],
    };

    let amount_tree = DecisionTree {
        nodes: vec![
            TreeNode::split(fraud_rate, 5, 250.0, 1, 2),
            TreeNode::split(fraud_rate * 0.8, 2, 0.9, 3, 4),
            TreeNode::leaf(0.9),
            TreeNode::leaf(0.02),
            TreeNode::leaf(0.6),
        ],
    };

    let features = ["V1", "V2", "V3", "V4", "V5", "Amount"]
        .iter()
        .map(|s| s.to_string())
        .collect();

    Ok(TreeEnsemble::new(
        "demo_forest",
        features,
        vec![
            stump(0, 1.0, 0.02, 0.92),
            stump(1, -1.25, 0.9, 0.03),
            stump(2, 0.9, 0.04, 0.75),
            amount_tree,
        ],
    )?)
}

fn ensure_parent(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("generate_dataset=info".parse()?),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let csv_path = args.get(1).map(|s| s.as_str()).unwrap_or("data/fraud_processed.csv");
    let model_path = args.get(2).map(|s| s.as_str()).unwrap_or("models/rf_model.json");
    let count: u64 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(10_000);
    let fraud_rate: f64 = args.get(4).and_then(|s| s.parse().ok()).unwrap_or(0.02);
    let seed: u64 = args.get(5).and_then(|s| s.parse().ok()).unwrap_or(42);

    anyhow::ensure!(
        (0.0..=1.0).contains(&fraud_rate),
        "fraud rate must be within [0, 1], got {}",
        fraud_rate
    );

    info!(
        csv = %csv_path,
        model = %model_path,
        count = count,
        fraud_rate = fraud_rate,
        seed = seed,
        "Configuration loaded"
    );

    let csv_path = Path::new(csv_path);
    ensure_parent(csv_path)?;
    let mut writer = csv::Writer::from_path(csv_path)?;

    let mut generator = TransactionGenerator::new(seed);
    let mut legitimate_count = 0;
    let mut suspicious_count = 0;

    for _ in 0..count {
        let row = if generator.rng.gen_bool(fraud_rate) {
            suspicious_count += 1;
            generator.generate_suspicious()
        } else {
            legitimate_count += 1;
            generator.generate_legitimate()
        };
        writer.serialize(row)?;
    }
    writer.flush()?;

    info!(
        "Wrote {} transactions ({} legitimate, {} fraud) to {}",
        count,
        legitimate_count,
        suspicious_count,
        csv_path.display()
    );

    let model_path = Path::new(model_path);
    ensure_parent(model_path)?;
    demo_model(fraud_rate)?.save(model_path)?;
    info!("Wrote demo model to {}", model_path.display());

    Ok(())
}
