//! Error types for the forecast_trade crate

use polars::prelude::PolarsError;
use portfolio_trade::PortfolioError;
use thiserror::Error;
use trade_math::MathError;

/// Custom error types for the forecast_trade crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Input data is malformed or unusable for the requested operation
    #[error("Data error: {0}")]
    Data(String),

    /// A required input file does not exist
    #[error("Data unavailable: {0}")]
    DataUnavailable(String),

    /// The cut date leaves one side of a split empty
    #[error("Invalid split: {0}")]
    InvalidSplit(String),

    /// No model candidate could be estimated
    #[error("Fit error: {0}")]
    Fit(String),

    /// Fewer observations than the model's window needs
    #[error("Insufficient history: need {required} observations, have {available}")]
    InsufficientHistory { required: usize, available: usize },

    #[error("Forecasting error: {0}")]
    Forecast(String),

    #[error("Length mismatch: expected {expected} values, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Math(#[from] MathError),

    #[error(transparent)]
    Portfolio(#[from] PortfolioError),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<PolarsError> for ForecastError {
    fn from(err: PolarsError) -> Self {
        ForecastError::Polars(err.to_string())
    }
}
