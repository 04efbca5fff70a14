//! # Outlook workspace
//!
//! Re-exports the workspace crates under one roof.
//!
//! - [`trade_math`]: return statistics, differencing, least squares, scaling
//!   and the KPSS test
//! - [`portfolio_trade`]: price series, weight vectors and the fixed-weight
//!   backtest
//! - [`forecast_trade`]: ARIMA and LSTM forecasting, model selection and
//!   confidence bands
//! - [`outlook`]: configuration, the end-to-end pipeline and the read API
//!
//! ## Example
//!
//! ```
//! use outlook_workspace::portfolio_trade::WeightVector;
//!
//! let benchmark = WeightVector::sixty_forty("SPY", "BND");
//! assert_eq!(benchmark.weight("SPY"), 0.6);
//! ```

pub use forecast_trade;
pub use outlook;
pub use portfolio_trade;
pub use trade_math;
