//! # Outlook
//!
//! Price outlook for a single asset: ARIMA and LSTM forecasts compared on a
//! held-out period, a year-ahead forecast from the better model with a
//! confidence band, and a fixed-weight portfolio backtest against 60/40.
//!
//! [`Pipeline`] computes and persists everything; [`OutlookService`] serves
//! the persisted results.
//!
//! ## Example
//!
//! ```no_run
//! use outlook::{OutlookConfig, OutlookService, Pipeline};
//!
//! let config = OutlookConfig::load("outlook.toml")?;
//! Pipeline::new(config.clone()).run()?;
//!
//! let service = OutlookService::new(config);
//! let forecast = service.get_forecast(126)?;
//! let comparison = service.get_model_comparison()?;
//! println!("{} steps, best model {}", forecast.horizon(), comparison.best);
//! # Ok::<(), outlook::OutlookError>(())
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod service;

pub use crate::config::OutlookConfig;
pub use crate::error::{OutlookError, Result};
pub use crate::pipeline::{Pipeline, PipelineReport};
pub use crate::service::{
    BacktestReport, MetricsSource, ModelComparisonReport, OutlookService,
};
