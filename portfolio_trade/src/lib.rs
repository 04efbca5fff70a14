//! # Portfolio Trade
//!
//! `portfolio_trade` holds the daily price data model shared by the forecasting
//! and backtest subsystems, and a backtest engine that replays historical
//! returns under fixed portfolio weights.
//!
//! ## Usage Example
//!
//! ```no_run
//! use chrono::NaiveDate;
//! use portfolio_trade::backtest::{BacktestConfig, BacktestSimulator, BacktestWindow};
//! use portfolio_trade::utils::generate_test_frame;
//! use portfolio_trade::WeightVector;
//!
//! let frame = generate_test_frame(&[("SPY", 400.0, 0.01), ("BND", 70.0, 0.003)], 300, 7).unwrap();
//! let strategy = WeightVector::from_pairs([("SPY", 0.3), ("BND", 0.7)]).unwrap();
//! let benchmark = WeightVector::sixty_forty("SPY", "BND");
//!
//! let window = BacktestWindow::new(
//!     NaiveDate::from_ymd_opt(2023, 3, 1).unwrap(),
//!     NaiveDate::from_ymd_opt(2023, 12, 29).unwrap(),
//! );
//! let simulator = BacktestSimulator::new(BacktestConfig::default());
//! let comparison = simulator.compare(&frame, &window, &strategy, &benchmark).unwrap();
//! println!("{}", comparison.verdict.description());
//! ```

use thiserror::Error;

pub mod backtest;
pub mod frame;
pub mod utils;
pub mod weights;

pub use backtest::{BacktestComparison, BacktestResult, BacktestSimulator, Verdict};
pub use frame::{CalendarFill, PriceFrame, PriceSeries};
pub use weights::WeightVector;

/// Errors that can occur while building price data or running a backtest
#[derive(Error, Debug)]
pub enum PortfolioError {
    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Data unavailable: {0}")]
    DataUnavailable(String),

    #[error("Asset not found in price data: {0}")]
    MissingAsset(String),

    #[error("Invalid weights: {0}")]
    InvalidWeights(String),

    #[error("Backtest window has no usable data: {0}")]
    EmptyWindow(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for portfolio operations
pub type Result<T> = std::result::Result<T, PortfolioError>;
