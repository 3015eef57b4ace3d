//! Configuration management for the risk dashboard

use crate::impact::{FALSE_ALERT_COST, FRAUD_COST};
use crate::scoring::DEFAULT_BATCH_SIZE;
use anyhow::{bail, Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use std::path::Path;

/// Default configuration file location
pub const DEFAULT_CONFIG_PATH: &str = "config/dashboard.toml";

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub dataset: DatasetConfig,
    pub model: ModelConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub impact: ImpactConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Transaction dataset configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatasetConfig {
    /// CSV file with the transactions
    pub path: String,
    /// Fraud label column; probed from a fixed candidate list when unset
    #[serde(default)]
    pub label_column: Option<String>,
}

/// Model artifact configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// `.json` tree ensemble or `.onnx` model
    pub path: String,
    /// Number of threads for ONNX inference (default: 1)
    #[serde(default = "default_onnx_threads")]
    pub onnx_threads: usize,
    /// Rows per inference call
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

fn default_onnx_threads() -> usize {
    1
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

/// Scoring defaults for the interactive controls
#[derive(Debug, Clone, Deserialize)]
pub struct ScoringConfig {
    /// Boundary between the Low and Medium tiers
    #[serde(default = "default_risk_threshold")]
    pub risk_threshold: f64,
    /// Lower amount bound (default: 0, clamped to the dataset minimum)
    #[serde(default)]
    pub min_amount: Option<f64>,
    /// Upper amount bound (default: 95th percentile of Amount)
    #[serde(default)]
    pub max_amount: Option<f64>,
}

fn default_risk_threshold() -> f64 {
    0.3
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            risk_threshold: default_risk_threshold(),
            min_amount: None,
            max_amount: None,
        }
    }
}

/// Unit costs for the impact estimate
#[derive(Debug, Clone, Deserialize)]
pub struct ImpactConfig {
    #[serde(default = "default_fraud_cost")]
    pub fraud_cost: f64,
    #[serde(default = "default_false_alert_cost")]
    pub false_alert_cost: f64,
}

fn default_fraud_cost() -> f64 {
    FRAUD_COST
}

fn default_false_alert_cost() -> f64 {
    FALSE_ALERT_COST
}

impl Default for ImpactConfig {
    fn default() -> Self {
        Self {
            fraud_cost: FRAUD_COST,
            false_alert_cost: FALSE_ALERT_COST,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// Allowed range for the risk threshold control
pub const RISK_THRESHOLD_RANGE: (f64, f64) = (0.1, 0.9);

impl AppConfig {
    /// Load configuration from the default file
    pub fn load() -> Result<Self> {
        Self::load_from_path(DEFAULT_CONFIG_PATH)
    }

    /// Load configuration from a specific path.
    ///
    /// `FRAUD_DASHBOARD__SECTION__KEY` environment variables override file
    /// values.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("FRAUD_DASHBOARD")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        Self::finish(config)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(toml: &str) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .context("Failed to build configuration")?;

        Self::finish(config)
    }

    fn finish(config: Config) -> Result<Self> {
        let app: Self = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        app.validate()?;
        Ok(app)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        let (min_t, max_t) = RISK_THRESHOLD_RANGE;
        let t = self.scoring.risk_threshold;
        if !(min_t..=max_t).contains(&t) {
            bail!("risk_threshold {} outside [{}, {}]", t, min_t, max_t);
        }

        if let (Some(lo), Some(hi)) = (self.scoring.min_amount, self.scoring.max_amount) {
            if lo > hi {
                bail!("min_amount {} is greater than max_amount {}", lo, hi);
            }
        }

        if self.impact.fraud_cost < 0.0 || self.impact.false_alert_cost < 0.0 {
            bail!("impact costs must not be negative");
        }

        if self.model.batch_size == 0 {
            bail!("model.batch_size must be at least 1");
        }

        match self.logging.format.as_str() {
            "json" | "pretty" => Ok(()),
            other => bail!("unknown log format {:?} (expected json or pretty)", other),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            dataset: DatasetConfig {
                path: "data/fraud_processed.csv".to_string(),
                label_column: None,
            },
            model: ModelConfig {
                path: "models/rf_model.json".to_string(),
                onnx_threads: 1,
                batch_size: DEFAULT_BATCH_SIZE,
            },
            scoring: ScoringConfig::default(),
            impact: ImpactConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}
