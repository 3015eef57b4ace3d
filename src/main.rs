//! Fraud Risk Dashboard - Main Entry Point
//!
//! Loads the transaction dataset and classifier once, scores the selected
//! amount range and prints the dashboard report.
//!
//! ```bash
//! fraud-dashboard --config config/dashboard.toml --threshold 0.4 --explain 541
//! fraud-dashboard --dataset data/tx.csv --model models/forest.json --format json
//! ```

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use fraud_risk_dashboard::{
    config::{AppConfig, DEFAULT_CONFIG_PATH},
    types::TierBoundaries,
    DashboardContext, DashboardReport, ImpactEstimator, ModelLoader, ReportOptions,
};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Credit card fraud risk dashboard
#[derive(Debug, Parser)]
#[command(name = "fraud-dashboard")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (default: config/dashboard.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Transaction CSV, overrides dataset.path
    #[arg(long)]
    dataset: Option<String>,

    /// Model artifact (.json or .onnx), overrides model.path
    #[arg(long)]
    model: Option<String>,

    /// Fraud label column, overrides dataset.label_column
    #[arg(long)]
    label_column: Option<String>,

    /// Lower bound of the amount filter
    #[arg(long)]
    min_amount: Option<f64>,

    /// Upper bound of the amount filter
    #[arg(long)]
    max_amount: Option<f64>,

    /// Boundary between the Low and Medium tiers (0.1 - 0.9)
    #[arg(short, long)]
    threshold: Option<f64>,

    /// Dataset row of the high-risk transaction to explain
    #[arg(short, long)]
    explain: Option<usize>,

    /// Report format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from_path(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => AppConfig::load()?,
        None => AppConfig::default(),
    };

    if let Some(path) = &cli.dataset {
        config.dataset.path = path.clone();
    }
    if let Some(path) = &cli.model {
        config.model.path = path.clone();
    }
    if let Some(label) = &cli.label_column {
        config.dataset.label_column = Some(label.clone());
    }
    if cli.min_amount.is_some() {
        config.scoring.min_amount = cli.min_amount;
    }
    if cli.max_amount.is_some() {
        config.scoring.max_amount = cli.max_amount;
    }
    if let Some(threshold) = cli.threshold {
        config.scoring.risk_threshold = threshold;
    }

    config.validate()?;
    Ok(config)
}

fn init_logging(config: &AppConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"))
        .add_directive(format!("fraud_risk_dashboard={}", config.logging.level).parse()?);

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if config.logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    init_logging(&config)?;

    info!(
        dataset = %config.dataset.path,
        model = %config.model.path,
        risk_threshold = config.scoring.risk_threshold,
        "Starting fraud risk dashboard"
    );

    let loader = ModelLoader::with_threads(config.model.onnx_threads);
    let ctx = DashboardContext::load(
        &config.dataset.path,
        config.dataset.label_column.as_deref(),
        &config.model.path,
        &loader,
    )
    .context("Failed to initialize dashboard")?;

    let range = ctx
        .dataset()
        .amount_range(config.scoring.min_amount, config.scoring.max_amount)?;

    let options = ReportOptions {
        range,
        bounds: TierBoundaries::new(config.scoring.risk_threshold),
        impact: ImpactEstimator::new(config.impact.fraud_cost, config.impact.false_alert_cost),
        explain_row: cli.explain,
        batch_size: config.model.batch_size,
    };

    let report = DashboardReport::build(&ctx, &options).context("Failed to build dashboard")?;

    match cli.format {
        OutputFormat::Text => print!("{}", report),
        OutputFormat::Json => println!("{}", report.to_json()?),
    }

    Ok(())
}
