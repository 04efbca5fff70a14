//! Error types for the outlook crate

use forecast_trade::ForecastError;
use portfolio_trade::PortfolioError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OutlookError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A persisted artifact or input the request depends on is missing
    #[error("Not available: {0}")]
    Unavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Forecast(#[from] ForecastError),

    #[error(transparent)]
    Portfolio(#[from] PortfolioError),
}

impl OutlookError {
    /// Whether the error means an input or artifact does not exist yet
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            OutlookError::Unavailable(_)
                | OutlookError::Forecast(ForecastError::DataUnavailable(_))
                | OutlookError::Forecast(ForecastError::Portfolio(
                    PortfolioError::DataUnavailable(_)
                ))
                | OutlookError::Portfolio(PortfolioError::DataUnavailable(_))
        )
    }
}

pub type Result<T> = std::result::Result<T, OutlookError>;
