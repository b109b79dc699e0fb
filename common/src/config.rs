use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration, every section optional in the TOML file.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct TrackerConfig {
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub price: PriceConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LedgerConfig {
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
    /// Fail a recording when the last total cannot be read, instead of
    /// continuing from 0.
    #[serde(default)]
    pub strict_last_total: bool,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PriceConfig {
    #[serde(default = "default_price_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_coin_id")]
    pub coin_id: String,
    #[serde(default = "default_fiat_code")]
    pub fiat_code: String,
    #[serde(default = "default_price_timeout")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ReportConfig {
    #[serde(default = "default_chart_path")]
    pub output_path: PathBuf,
    #[serde(default = "default_chart_width")]
    pub width: u32,
    #[serde(default = "default_chart_height")]
    pub height: u32,
}

impl TrackerConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Loads `path` if given, otherwise falls back to built-in defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            strict_last_total: false,
        }
    }
}

impl Default for PriceConfig {
    fn default() -> Self {
        Self {
            endpoint: default_price_endpoint(),
            coin_id: default_coin_id(),
            fiat_code: default_fiat_code(),
            timeout_seconds: default_price_timeout(),
        }
    }
}

impl PriceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_path: default_chart_path(),
            width: default_chart_width(),
            height: default_chart_height(),
        }
    }
}

// Default functions
fn default_database_path() -> PathBuf {
    PathBuf::from("bitcoin_tracker.db")
}

fn default_price_endpoint() -> String {
    "https://api.coingecko.com/api/v3".to_string()
}

fn default_coin_id() -> String {
    "bitcoin".to_string()
}

fn default_fiat_code() -> String {
    "eur".to_string()
}

fn default_price_timeout() -> u64 {
    10
}

fn default_chart_path() -> PathBuf {
    PathBuf::from("earnings_chart.svg")
}

fn default_chart_width() -> u32 {
    1400
}

fn default_chart_height() -> u32 {
    700
}
