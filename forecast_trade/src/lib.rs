//! # Forecast Trade
//!
//! A Rust library for daily price forecasting with model selection and
//! uncertainty bands.
//!
//! ## Features
//!
//! - Price data loading from wide CSV files (polars)
//! - Chronological train/test splitting
//! - ARIMA with KPSS-based differencing and information-criterion order search
//! - LSTM sequence regressor with direct and recursive forecasting
//! - MAE / RMSE / MAPE evaluation and model selection
//! - Volatility-scaled confidence bands and forecast summaries
//! - Risk profile: VaR, rolling volatility, Sharpe ratio, stationarity
//! - JSON artifacts and CSV export
//!
//! ## Quick Start
//!
//! ```no_run
//! use forecast_trade::data::DataLoader;
//! use forecast_trade::metrics::compare_models;
//! use forecast_trade::models::{
//!     ArimaConfig, AutoArima, ForecastModel, LstmConfig, LstmRegressor, TrainedForecastModel,
//! };
//! use forecast_trade::split::split_ratio;
//! use forecast_trade::uncertainty::UncertaintyProjector;
//!
//! let series = DataLoader::load_series("data/prices.csv", "TSLA")?;
//! let split = split_ratio(&series, 0.2)?;
//!
//! let arima = AutoArima::new(ArimaConfig::default()).train(&split.train)?;
//! let lstm = LstmRegressor::new(LstmConfig { seed: Some(42), ..LstmConfig::default() })
//!     .train(&split.train)?;
//!
//! let comparison = compare_models(&[&arima as &dyn TrainedForecastModel, &lstm], &split)?;
//! println!("Best model: {}", comparison.best);
//!
//! let forecast = lstm.forecast_future(&series, 252)?;
//! let band = UncertaintyProjector::default().project(&series, &forecast)?;
//! # Ok::<(), forecast_trade::ForecastError>(())
//! ```

pub mod data;
pub mod error;
pub mod metrics;
pub mod models;
pub mod persistence;
pub mod split;
pub mod uncertainty;
pub mod utils;
pub mod volatility;

// Re-export commonly used types
pub use crate::data::DataLoader;
pub use crate::error::{ForecastError, Result};
pub use crate::metrics::{ErrorMetrics, ModelComparison};
pub use crate::models::{
    Forecast, ForecastModel, ModelKind, TrainedForecastModel, TrainedModel,
};
pub use crate::persistence::ArtifactStore;
pub use crate::split::Split;
pub use crate::uncertainty::{ConfidenceBand, UncertaintyProjector};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
