//! End-to-end outlook run
//!
//! Loads prices, fits both model families on the training period, selects the
//! better one on the test period, forecasts past the last observation with a
//! confidence band, backtests the strategy weights against 60/40 and writes
//! every result to the artifact store.

use crate::config::OutlookConfig;
use crate::error::{OutlookError, Result};
use forecast_trade::metrics::compare_models;
use forecast_trade::models::{
    AutoArima, ForecastModel, LstmRegressor, TrainedForecastModel, TrainedModel,
};
use forecast_trade::persistence::{ArtifactStore, ForecastArtifact};
use forecast_trade::split::{split, split_ratio, Split};
use forecast_trade::uncertainty::{ForecastSummary, UncertaintyProjector};
use forecast_trade::volatility::RiskProfile;
use forecast_trade::{DataLoader, ModelComparison};
use portfolio_trade::{BacktestComparison, BacktestSimulator, PriceFrame, PriceSeries, WeightVector};
use std::path::PathBuf;
use tracing::info;

/// Outputs of the forecasting half of a run
#[derive(Debug, Clone)]
pub struct ForecastOutcome {
    pub split: Split,
    pub models: Vec<TrainedModel>,
    pub comparison: ModelComparison,
    pub artifact: ForecastArtifact,
    pub summary: ForecastSummary,
    pub risk: RiskProfile,
}

impl ForecastOutcome {
    /// The model the forecast was produced with
    pub fn selected(&self) -> Option<&TrainedModel> {
        self.models
            .iter()
            .find(|m| m.kind() == self.comparison.best)
    }
}

/// Everything a full run produced and persisted
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub forecast: ForecastOutcome,
    pub backtest: BacktestComparison,
    pub written: Vec<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct Pipeline {
    config: OutlookConfig,
}

impl Pipeline {
    pub fn new(config: OutlookConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &OutlookConfig {
        &self.config
    }

    /// Run both subsystems and persist the results
    pub fn run(&self) -> Result<PipelineReport> {
        self.config.validate()?;

        let frame = DataLoader::from_csv(&self.config.data.prices)?;
        let forecast = self.forecast(&frame)?;
        let backtest = self.backtest(&frame)?;

        let store = ArtifactStore::create(&self.config.data.artifacts)?;
        let written = self.persist(&store, &forecast, &backtest)?;

        info!(
            "Outlook complete: {} selected, {} artifacts in {}",
            forecast.comparison.best,
            written.len(),
            store.root().display()
        );

        Ok(PipelineReport {
            forecast,
            backtest,
            written,
        })
    }

    /// Train, compare and forecast the configured asset
    pub fn forecast(&self, frame: &PriceFrame) -> Result<ForecastOutcome> {
        let settings = &self.config.forecast;
        let series = frame.series(&settings.asset)?;
        let split = self.split(&series)?;

        info!(
            "Forecasting {}: {} training and {} test observations (cut {})",
            series.asset(),
            split.train.len(),
            split.test.len(),
            split.cut_date
        );

        // Models only ever see the training period
        let arima = AutoArima::new(self.config.arima).train(&split.train)?;
        let lstm = LstmRegressor::new(self.config.lstm).train(&split.train)?;

        let comparison =
            compare_models(&[&arima as &dyn TrainedForecastModel, &lstm], &split)?;
        let models: Vec<TrainedModel> = vec![arima.into(), lstm.into()];

        let selected = models
            .iter()
            .find(|m| m.kind() == comparison.best)
            .ok_or_else(|| {
                OutlookError::Unavailable(format!("No trained {} model", comparison.best))
            })?;
        info!("Selected {} for the future forecast", selected.name());

        let forecast = selected.forecast_future(&series, settings.horizon)?;
        let projector = UncertaintyProjector::new(self.config.uncertainty);
        let band = projector.project(&series, &forecast)?;
        let summary = ForecastSummary::new(&series, &forecast, &band, &projector)?;
        let risk = RiskProfile::from_series(&series, &self.config.risk)?;

        Ok(ForecastOutcome {
            split,
            models,
            comparison,
            artifact: ForecastArtifact::new(forecast, band)?,
            summary,
            risk,
        })
    }

    /// Strategy weights against the 60/40 benchmark over the configured window
    pub fn backtest(&self, frame: &PriceFrame) -> Result<BacktestComparison> {
        let settings = &self.config.backtest;
        let strategy = self.strategy_weights()?;
        let simulator = BacktestSimulator::new(settings.simulator);

        Ok(simulator.compare(frame, &settings.window(), &strategy, &settings.benchmark())?)
    }

    /// Inline weights from the configuration, otherwise the weights file
    pub fn strategy_weights(&self) -> Result<WeightVector> {
        strategy_weights(&self.config)
    }

    fn split(&self, series: &PriceSeries) -> Result<Split> {
        let settings = &self.config.forecast;
        let split = match settings.cut_date {
            Some(cut) => split(series, cut)?,
            None => split_ratio(series, settings.test_fraction)?,
        };
        Ok(split)
    }

    fn persist(
        &self,
        store: &ArtifactStore,
        forecast: &ForecastOutcome,
        backtest: &BacktestComparison,
    ) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();
        for model in &forecast.models {
            written.push(store.save_model(model)?);
        }
        written.push(store.save_comparison(&forecast.comparison)?);
        written.push(store.save_forecast(&forecast.artifact)?);
        written.push(store.save_summary(&forecast.summary)?);
        written.push(store.save_risk(&forecast.risk)?);
        written.push(store.save_backtest(backtest)?);
        written.push(store.export_forecast_csv(&forecast.artifact)?);
        Ok(written)
    }
}

/// Inline weights from `config`, otherwise the weights file
pub fn strategy_weights(config: &OutlookConfig) -> Result<WeightVector> {
    if let Some(weights) = &config.backtest.strategy {
        return Ok(weights.clone());
    }

    info!(
        "Loading strategy weights from: {}",
        config.data.weights.display()
    );
    Ok(WeightVector::from_json_file(&config.data.weights)?)
}
