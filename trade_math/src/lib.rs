//! # Trade Math
//!
//! Mathematical building blocks shared by the forecasting and backtest crates.
//! Everything here works on plain `f64` slices so that both subsystems can use
//! the same volatility estimator without sharing any other state.
//!
//! - Return statistics, VaR, drawdown and Sharpe ratio
//! - Differencing, integration and least squares for ARIMA fitting
//! - Min-max scaling for sequence models
//! - KPSS stationarity test

use thiserror::Error;

pub mod forecasting;
pub mod scaling;
pub mod stationarity;
pub mod volatility;

/// Errors that can occur in trading-related calculations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Result type for trading math operations
pub type Result<T> = std::result::Result<T, MathError>;
