//! Artifact storage
//!
//! Pipeline outputs are written once as JSON files in a single directory and
//! read back by the serving layer. Floats round-trip exactly.

use crate::error::{ForecastError, Result};
use crate::metrics::ModelComparison;
use crate::models::{Forecast, ModelKind, TrainedForecastModel, TrainedModel};
use crate::uncertainty::{ConfidenceBand, ForecastSummary};
use crate::volatility::RiskProfile;
use chrono::NaiveDate;
use portfolio_trade::BacktestComparison;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const FORECAST_FILE: &str = "forecast.json";
pub const FORECAST_CSV_FILE: &str = "forecast.csv";
pub const SUMMARY_FILE: &str = "forecast_summary.json";
pub const COMPARISON_FILE: &str = "model_comparison.json";
pub const BACKTEST_FILE: &str = "backtest.json";
pub const RISK_FILE: &str = "risk_profile.json";

/// File name of a persisted trained model
pub fn model_file(kind: ModelKind) -> &'static str {
    match kind {
        ModelKind::Statistical => "arima_model.json",
        ModelKind::Sequence => "lstm_model.json",
    }
}

/// Forecast of the selected model with its band
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastArtifact {
    pub forecast: Forecast,
    pub band: ConfidenceBand,
}

impl ForecastArtifact {
    pub fn new(forecast: Forecast, band: ConfidenceBand) -> Result<Self> {
        if forecast.horizon() != band.len() {
            return Err(ForecastError::LengthMismatch {
                expected: forecast.horizon(),
                actual: band.len(),
            });
        }
        Ok(Self { forecast, band })
    }
}

/// One row of the forecast CSV export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRow {
    pub date: NaiveDate,
    pub forecast: f64,
    pub lower: f64,
    pub upper: f64,
}

/// Directory of JSON artifacts
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    /// Use `root`, creating it if needed
    pub fn create(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Use an existing directory without creating it
    pub fn open(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    pub fn exists(&self, name: &str) -> bool {
        self.path(name).is_file()
    }

    pub fn write_json<T: Serialize>(&self, name: &str, value: &T) -> Result<PathBuf> {
        let path = self.path(name);
        let mut writer = BufWriter::new(File::create(&path)?);
        serde_json::to_writer_pretty(&mut writer, value)?;
        writer.flush()?;
        debug!("Wrote artifact {}", path.display());
        Ok(path)
    }

    /// Read an artifact; [`ForecastError::DataUnavailable`] if it is absent
    pub fn read_json<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let path = self.path(name);
        if !path.is_file() {
            return Err(ForecastError::DataUnavailable(path.display().to_string()));
        }
        let reader = BufReader::new(File::open(&path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn save_model(&self, model: &TrainedModel) -> Result<PathBuf> {
        self.write_json(model_file(model.kind()), model)
    }

    pub fn load_model(&self, kind: ModelKind) -> Result<TrainedModel> {
        self.read_json(model_file(kind))
    }

    pub fn save_forecast(&self, artifact: &ForecastArtifact) -> Result<PathBuf> {
        self.write_json(FORECAST_FILE, artifact)
    }

    pub fn load_forecast(&self) -> Result<ForecastArtifact> {
        self.read_json(FORECAST_FILE)
    }

    pub fn save_summary(&self, summary: &ForecastSummary) -> Result<PathBuf> {
        self.write_json(SUMMARY_FILE, summary)
    }

    pub fn load_summary(&self) -> Result<ForecastSummary> {
        self.read_json(SUMMARY_FILE)
    }

    pub fn save_comparison(&self, comparison: &ModelComparison) -> Result<PathBuf> {
        self.write_json(COMPARISON_FILE, comparison)
    }

    pub fn load_comparison(&self) -> Result<ModelComparison> {
        self.read_json(COMPARISON_FILE)
    }

    pub fn save_backtest(&self, comparison: &BacktestComparison) -> Result<PathBuf> {
        self.write_json(BACKTEST_FILE, comparison)
    }

    pub fn load_backtest(&self) -> Result<BacktestComparison> {
        self.read_json(BACKTEST_FILE)
    }

    pub fn save_risk(&self, profile: &RiskProfile) -> Result<PathBuf> {
        self.write_json(RISK_FILE, profile)
    }

    pub fn load_risk(&self) -> Result<RiskProfile> {
        self.read_json(RISK_FILE)
    }

    /// Write the forecast and its band as `date,forecast,lower,upper`
    pub fn export_forecast_csv(&self, artifact: &ForecastArtifact) -> Result<PathBuf> {
        let path = self.path(FORECAST_CSV_FILE);
        let mut writer = csv::Writer::from_path(&path)?;

        for ((point, lower), upper) in artifact
            .forecast
            .points()
            .iter()
            .zip(&artifact.band.lower)
            .zip(&artifact.band.upper)
        {
            writer.serialize(ForecastRow {
                date: point.date,
                forecast: point.value,
                lower: *lower,
                upper: *upper,
            })?;
        }
        writer.flush()?;

        info!("Exported forecast to {}", path.display());
        Ok(path)
    }
}

/// Read a forecast CSV written by [`ArtifactStore::export_forecast_csv`]
pub fn read_forecast_csv(path: impl AsRef<Path>) -> Result<Vec<ForecastRow>> {
    let mut reader = csv::Reader::from_path(path)?;
    let rows = reader
        .deserialize()
        .collect::<std::result::Result<Vec<ForecastRow>, csv::Error>>()?;
    Ok(rows)
}
