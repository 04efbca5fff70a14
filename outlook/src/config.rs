//! Configuration file support for the outlook pipeline.
//!
//! Every setting has a default, so an empty file is a valid configuration.
//! Dates are written as quoted `YYYY-MM-DD` strings.

use crate::error::{OutlookError, Result};
use chrono::NaiveDate;
use forecast_trade::models::{ArimaConfig, LstmConfig};
use forecast_trade::uncertainty::UncertaintyConfig;
use forecast_trade::volatility::RiskConfig;
use portfolio_trade::backtest::{BacktestConfig, BacktestWindow};
use portfolio_trade::WeightVector;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Complete pipeline configuration loaded from a file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutlookConfig {
    #[serde(default)]
    pub data: DataSettings,
    #[serde(default)]
    pub forecast: ForecastSettings,
    #[serde(default)]
    pub arima: ArimaConfig,
    #[serde(default)]
    pub lstm: LstmConfig,
    #[serde(default)]
    pub uncertainty: UncertaintyConfig,
    #[serde(default)]
    pub risk: RiskConfig,
    #[serde(default)]
    pub backtest: BacktestSettings,
    #[serde(default)]
    pub service: ServiceSettings,
}

/// Input and output locations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSettings {
    /// Wide price CSV, `date,<asset>,...`
    #[serde(default = "default_prices")]
    pub prices: PathBuf,
    /// Optimizer output, `{"TSLA": 0.27, ...}`
    #[serde(default = "default_weights")]
    pub weights: PathBuf,
    /// Directory of persisted artifacts
    #[serde(default = "default_artifacts")]
    pub artifacts: PathBuf,
}

fn default_prices() -> PathBuf {
    PathBuf::from("data/prices.csv")
}

fn default_weights() -> PathBuf {
    PathBuf::from("data/optimal_weights.json")
}

fn default_artifacts() -> PathBuf {
    PathBuf::from("artifacts")
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            prices: default_prices(),
            weights: default_weights(),
            artifacts: default_artifacts(),
        }
    }
}

/// Forecasting settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSettings {
    /// Asset to forecast.
    #[serde(default = "default_asset")]
    pub asset: String,
    /// Last training date; overrides `test_fraction` when set.
    #[serde(default)]
    pub cut_date: Option<NaiveDate>,
    /// Share of observations held out for evaluation.
    #[serde(default = "default_test_fraction")]
    pub test_fraction: f64,
    /// Business days to forecast past the last observation.
    #[serde(default = "default_horizon")]
    pub horizon: usize,
}

fn default_asset() -> String {
    "TSLA".to_string()
}

fn default_test_fraction() -> f64 {
    0.2
}

fn default_horizon() -> usize {
    252
}

impl Default for ForecastSettings {
    fn default() -> Self {
        Self {
            asset: default_asset(),
            cut_date: None,
            test_fraction: default_test_fraction(),
            horizon: default_horizon(),
        }
    }
}

/// Backtest settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestSettings {
    #[serde(default = "default_start")]
    pub start: NaiveDate,
    #[serde(default = "default_end")]
    pub end: NaiveDate,
    /// Equity leg of the 60/40 benchmark.
    #[serde(default = "default_equity")]
    pub equity: String,
    /// Bond leg of the 60/40 benchmark.
    #[serde(default = "default_bonds")]
    pub bonds: String,
    /// Strategy weights given inline instead of the weights file.
    #[serde(default)]
    pub strategy: Option<WeightVector>,
    #[serde(flatten)]
    pub simulator: BacktestConfig,
}

fn default_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 8, 1).unwrap_or(NaiveDate::MIN)
}

fn default_end() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 7, 31).unwrap_or(NaiveDate::MAX)
}

fn default_equity() -> String {
    "SPY".to_string()
}

fn default_bonds() -> String {
    "BND".to_string()
}

impl Default for BacktestSettings {
    fn default() -> Self {
        Self {
            start: default_start(),
            end: default_end(),
            equity: default_equity(),
            bonds: default_bonds(),
            strategy: None,
            simulator: BacktestConfig::default(),
        }
    }
}

impl BacktestSettings {
    pub fn window(&self) -> BacktestWindow {
        BacktestWindow::new(self.start, self.end)
    }

    pub fn benchmark(&self) -> WeightVector {
        WeightVector::sixty_forty(&self.equity, &self.bonds)
    }
}

/// Read-side settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceSettings {
    /// Serve the reference metrics when no comparison has been computed.
    #[serde(default = "default_true")]
    pub allow_metric_fallback: bool,
}

fn default_true() -> bool {
    true
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            allow_metric_fallback: true,
        }
    }
}

impl OutlookConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading configuration from: {}", path.display());

        let content = fs::read_to_string(path)?;
        let config: OutlookConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| OutlookError::Config(e.to_string()))?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Check settings that the individual components cannot check alone.
    pub fn validate(&self) -> Result<()> {
        let forecast = &self.forecast;
        if forecast.asset.is_empty() {
            return Err(OutlookError::Config("forecast.asset is empty".to_string()));
        }
        if forecast.horizon == 0 {
            return Err(OutlookError::Config(
                "forecast.horizon must be at least 1".to_string(),
            ));
        }
        if forecast.cut_date.is_none()
            && !(forecast.test_fraction > 0.0 && forecast.test_fraction < 1.0)
        {
            return Err(OutlookError::Config(format!(
                "forecast.test_fraction must be in (0, 1), got {}",
                forecast.test_fraction
            )));
        }
        if self.backtest.start > self.backtest.end {
            return Err(OutlookError::Config(format!(
                "Backtest starts {} after it ends {}",
                self.backtest.start, self.backtest.end
            )));
        }
        if !(self.uncertainty.z.is_finite() && self.uncertainty.z >= 0.0) {
            return Err(OutlookError::Config(format!(
                "uncertainty.z must be non-negative, got {}",
                self.uncertainty.z
            )));
        }

        self.lstm.validate()?;
        self.backtest.simulator.validate()?;
        Ok(())
    }

    /// Generate an example configuration file.
    pub fn example() -> &'static str {
        include_str!("../outlook.example.toml")
    }

    /// Resolve relative data paths against `base`.
    pub fn resolve_paths(mut self, base: &Path) -> Self {
        for path in [
            &mut self.data.prices,
            &mut self.data.weights,
            &mut self.data.artifacts,
        ] {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
        self
    }
}
