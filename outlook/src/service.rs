//! Read-only views over persisted artifacts
//!
//! The service never trains or forecasts. Every view is read from the
//! artifact store written by [`crate::pipeline::Pipeline::run`], except the
//! strategy weights and historical returns, which come from the inputs.

use crate::config::OutlookConfig;
use crate::error::{OutlookError, Result};
use crate::pipeline::strategy_weights;
use chrono::NaiveDate;
use forecast_trade::metrics::select_best;
use forecast_trade::metrics::{ErrorMetrics, ModelScore};
use forecast_trade::models::Forecast;
use forecast_trade::persistence::ArtifactStore;
use forecast_trade::uncertainty::{ConfidenceBand, ForecastSummary};
use forecast_trade::volatility::RiskProfile;
use forecast_trade::{DataLoader, ForecastError, ModelComparison, ModelKind};
use portfolio_trade::WeightVector;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, warn};

/// Reference test-period metrics served when no comparison was computed
pub const FALLBACK_METRICS: [(ModelKind, &str, f64, f64); 2] = [
    (ModelKind::Statistical, "ARIMA", 9.12, 6.8),
    (ModelKind::Sequence, "LSTM", 6.38, 4.9),
];

/// Where a model comparison came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricsSource {
    /// Scored by the pipeline on the test period
    Computed,
    /// Reference values; no comparison artifact was available
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetrics {
    pub kind: ModelKind,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mae: Option<f64>,
    pub rmse: f64,
    pub mape: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelComparisonReport {
    pub models: Vec<ModelMetrics>,
    pub best: ModelKind,
    pub source: MetricsSource,
}

impl ModelComparisonReport {
    /// Report a computed comparison, rounded to two decimals
    pub fn computed(comparison: &ModelComparison) -> Self {
        Self {
            models: comparison
                .scores
                .iter()
                .map(|score| ModelMetrics {
                    kind: score.kind,
                    name: score.name.clone(),
                    mae: Some(round2(score.metrics.mae)),
                    rmse: round2(score.metrics.rmse),
                    mape: round2(score.metrics.mape),
                })
                .collect(),
            best: comparison.best,
            source: MetricsSource::Computed,
        }
    }

    /// Report the reference metrics
    pub fn fallback() -> Self {
        let scores: Vec<ModelScore> = FALLBACK_METRICS
            .iter()
            .map(|&(kind, name, rmse, mape)| ModelScore {
                kind,
                name: name.to_string(),
                metrics: ErrorMetrics {
                    mae: f64::NAN,
                    rmse,
                    mape,
                },
            })
            .collect();
        let best = select_best(&scores).map_or(ModelKind::Sequence, |s| s.kind);

        Self {
            models: scores
                .into_iter()
                .map(|score| ModelMetrics {
                    kind: score.kind,
                    name: score.name,
                    mae: None,
                    rmse: score.metrics.rmse,
                    mape: score.metrics.mape,
                })
                .collect(),
            best,
            source: MetricsSource::Fallback,
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Headline backtest figures
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BacktestReport {
    /// Total return in percent
    pub strategy_return: f64,
    pub benchmark_return: f64,
    pub strategy_sharpe: f64,
    pub benchmark_sharpe: f64,
    pub outperformed: bool,
}

/// Simple return of one asset ending on `date`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReturnPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Serving-facing read API
#[derive(Debug, Clone)]
pub struct OutlookService {
    store: ArtifactStore,
    prices: PathBuf,
    config: OutlookConfig,
}

impl OutlookService {
    pub fn new(config: OutlookConfig) -> Self {
        Self {
            store: ArtifactStore::open(&config.data.artifacts),
            prices: config.data.prices.clone(),
            config,
        }
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// The first `horizon` steps of the persisted forecast
    pub fn get_forecast(&self, horizon: usize) -> Result<Forecast> {
        let artifact = self.store.load_forecast()?;
        Ok(artifact.forecast.truncated(horizon)?)
    }

    /// The first `horizon` steps of the persisted confidence band
    pub fn get_confidence_band(&self, horizon: usize) -> Result<ConfidenceBand> {
        let artifact = self.store.load_forecast()?;
        Ok(artifact.band.truncated(horizon)?)
    }

    /// Test-period metrics of both models
    ///
    /// Falls back to [`FALLBACK_METRICS`] when the comparison artifact is
    /// absent and fallback is allowed; the report is then marked
    /// [`MetricsSource::Fallback`]. An unreadable artifact is an error.
    pub fn get_model_comparison(&self) -> Result<ModelComparisonReport> {
        match self.store.load_comparison() {
            Ok(comparison) => Ok(ModelComparisonReport::computed(&comparison)),
            Err(ForecastError::DataUnavailable(path))
                if self.config.service.allow_metric_fallback =>
            {
                warn!("Using fallback model comparison metrics, {} not found", path);
                Ok(ModelComparisonReport::fallback())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn get_backtest_result(&self) -> Result<BacktestReport> {
        let comparison = self.store.load_backtest()?;
        Ok(BacktestReport {
            strategy_return: comparison.strategy.total_return_pct,
            benchmark_return: comparison.benchmark.total_return_pct,
            strategy_sharpe: comparison.strategy.sharpe_ratio,
            benchmark_sharpe: comparison.benchmark.sharpe_ratio,
            outperformed: comparison.outperformed(),
        })
    }

    pub fn get_forecast_summary(&self) -> Result<ForecastSummary> {
        Ok(self.store.load_summary()?)
    }

    pub fn get_risk_profile(&self) -> Result<RiskProfile> {
        Ok(self.store.load_risk()?)
    }

    pub fn get_strategy_weights(&self) -> Result<WeightVector> {
        strategy_weights(&self.config)
    }

    /// Daily simple returns of `asset` from the price file
    pub fn get_returns(&self, asset: &str) -> Result<Vec<ReturnPoint>> {
        let series = DataLoader::load_series(&self.prices, asset)?;
        if series.len() < 2 {
            return Err(OutlookError::Unavailable(format!(
                "{} has a single observation, no returns",
                asset
            )));
        }

        let returns: Vec<ReturnPoint> = series.dates()[1..]
            .iter()
            .zip(series.returns())
            .map(|(date, value)| ReturnPoint { date: *date, value })
            .collect();
        debug!("Serving {} returns for {}", returns.len(), asset);
        Ok(returns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_report() {
        let report = ModelComparisonReport::fallback();
        assert_eq!(report.source, MetricsSource::Fallback);
        assert_eq!(report.best, ModelKind::Sequence);
        assert_eq!(report.models.len(), 2);
        assert_eq!(report.models[0].name, "ARIMA");
        assert_eq!(report.models[0].rmse, 9.12);
        assert_eq!(report.models[1].mape, 4.9);
        assert!(report.models.iter().all(|m| m.mae.is_none()));
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(6.3849), 6.38);
        assert_eq!(round2(4.906), 4.91);
    }
}
