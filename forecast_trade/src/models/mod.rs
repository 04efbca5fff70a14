//! Forecasting models for daily price series
//!
//! Both model families implement [`ForecastModel`] to train on a price series
//! and produce a [`TrainedForecastModel`]. [`TrainedModel`] wraps either kind
//! so the evaluator, pipeline and artifact store can treat them uniformly.

use crate::error::{ForecastError, Result};
use crate::split::Split;
use crate::utils::future_dates;
use chrono::NaiveDate;
use portfolio_trade::PriceSeries;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug};

pub mod arima;
pub mod lstm;

pub use arima::{ArimaConfig, AutoArima, TrainedArima};
pub use lstm::{ForecastMode, LstmConfig, LstmRegressor, TrainedLstm};

/// Model family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ModelKind {
    /// ARIMA-class statistical model
    #[serde(rename = "ARIMA")]
    Statistical,
    /// LSTM-class sequence model
    #[serde(rename = "LSTM")]
    Sequence,
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelKind::Statistical => write!(f, "ARIMA"),
            ModelKind::Sequence => write!(f, "LSTM"),
        }
    }
}

/// One forecasted observation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Future price path produced by a trained model
///
/// Dates are consecutive business days starting right after the history the
/// forecast continues.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    asset: String,
    model: String,
    points: Vec<ForecastPoint>,
}

impl Forecast {
    /// Create a forecast from dates and values
    pub fn new(
        asset: impl Into<String>,
        model: impl Into<String>,
        dates: Vec<NaiveDate>,
        values: Vec<f64>,
    ) -> Result<Self> {
        if values.is_empty() {
            return Err(ForecastError::Forecast(
                "Forecast must contain at least one step".to_string(),
            ));
        }
        if dates.len() != values.len() {
            return Err(ForecastError::LengthMismatch {
                expected: values.len(),
                actual: dates.len(),
            });
        }
        if let Some(v) = values.iter().find(|v| !v.is_finite()) {
            return Err(ForecastError::Forecast(format!(
                "Forecast contains non-finite value {}",
                v
            )));
        }

        Ok(Self {
            asset: asset.into(),
            model: model.into(),
            points: dates
                .into_iter()
                .zip(values)
                .map(|(date, value)| ForecastPoint { date, value })
                .collect(),
        })
    }

    /// Date the values as the business days following `history`
    pub fn continuing(history: &PriceSeries, model: impl Into<String>, values: Vec<f64>) -> Result<Self> {
        let dates = future_dates(history.last_date(), values.len())?;
        Self::new(history.asset(), model, dates, values)
    }

    pub fn asset(&self) -> &str {
        &self.asset
    }

    /// Name of the producing model
    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn points(&self) -> &[ForecastPoint] {
        &self.points
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }

    /// Number of forecast steps
    pub fn horizon(&self) -> usize {
        self.points.len()
    }

    /// The first `horizon` steps
    pub fn truncated(&self, horizon: usize) -> Result<Self> {
        if horizon == 0 || horizon > self.horizon() {
            return Err(ForecastError::Forecast(format!(
                "Requested horizon {} but {} steps are available",
                horizon,
                self.horizon()
            )));
        }

        Ok(Self {
            asset: self.asset.clone(),
            model: self.model.clone(),
            points: self.points[..horizon].to_vec(),
        })
    }
}

/// Trained forecast model
pub trait TrainedForecastModel: Debug {
    /// Model family
    fn kind(&self) -> ModelKind;

    /// Name including the fitted configuration, e.g. `ARIMA(1,1,0)`
    fn name(&self) -> String;

    /// Predictions aligned index-for-index with `split.test`
    fn predict_test(&self, split: &Split) -> Result<Vec<f64>>;

    /// Forecast `horizon` business days past the end of `history`
    fn forecast_future(&self, history: &PriceSeries, horizon: usize) -> Result<Forecast>;
}

/// Forecast model that can be trained on a price series
pub trait ForecastModel: Debug + Clone {
    /// The type of trained model produced
    type Trained: TrainedForecastModel;

    /// Train the model on a (training) price series
    fn train(&self, series: &PriceSeries) -> Result<Self::Trained>;

    /// Get the name of the model
    fn name(&self) -> &str;
}

/// Either trained model, as persisted and selected
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "model")]
pub enum TrainedModel {
    Statistical(TrainedArima),
    Sequence(TrainedLstm),
}

impl TrainedForecastModel for TrainedModel {
    fn kind(&self) -> ModelKind {
        match self {
            TrainedModel::Statistical(m) => m.kind(),
            TrainedModel::Sequence(m) => m.kind(),
        }
    }

    fn name(&self) -> String {
        match self {
            TrainedModel::Statistical(m) => m.name(),
            TrainedModel::Sequence(m) => m.name(),
        }
    }

    fn predict_test(&self, split: &Split) -> Result<Vec<f64>> {
        match self {
            TrainedModel::Statistical(m) => m.predict_test(split),
            TrainedModel::Sequence(m) => m.predict_test(split),
        }
    }

    fn forecast_future(&self, history: &PriceSeries, horizon: usize) -> Result<Forecast> {
        match self {
            TrainedModel::Statistical(m) => m.forecast_future(history, horizon),
            TrainedModel::Sequence(m) => m.forecast_future(history, horizon),
        }
    }
}

impl From<TrainedArima> for TrainedModel {
    fn from(model: TrainedArima) -> Self {
        TrainedModel::Statistical(model)
    }
}

impl From<TrainedLstm> for TrainedModel {
    fn from(model: TrainedLstm) -> Self {
        TrainedModel::Sequence(model)
    }
}
