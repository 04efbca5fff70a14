//! Volatility and risk profile of a price series
//!
//! Exploratory statistics reported next to the forecast: daily and annualized
//! volatility, historical Value at Risk, rolling volatility, a stand-alone
//! Sharpe ratio and a KPSS stationarity check on prices and returns.

use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use portfolio_trade::PriceSeries;
use serde::{Deserialize, Serialize};
use trade_math::stationarity::{kpss_test, KpssResult};
use trade_math::volatility::{
    annualize_volatility, historical_var, rolling_volatility, sample_std_dev, sharpe_ratio,
};

/// Settings for [`RiskProfile::from_series`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    pub var_confidence: f64,
    pub rolling_window: usize,
    pub risk_free_rate: f64,
    pub trading_days: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            var_confidence: 0.95,
            rolling_window: 30,
            risk_free_rate: 0.0,
            trading_days: 252.0,
        }
    }
}

/// Rolling volatility ending on `date`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RollingPoint {
    pub date: NaiveDate,
    pub volatility: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskProfile {
    pub asset: String,
    pub daily_volatility: f64,
    pub annualized_volatility: f64,
    /// Return not undercut with `var_confidence` probability (usually negative)
    pub value_at_risk: f64,
    pub var_confidence: f64,
    pub sharpe_ratio: f64,
    pub rolling_volatility: Vec<RollingPoint>,
    pub price_stationarity: KpssResult,
    pub return_stationarity: KpssResult,
}

impl RiskProfile {
    pub fn from_series(series: &PriceSeries, config: &RiskConfig) -> Result<Self> {
        let returns = series.returns();
        if returns.len() < config.rolling_window.max(3) {
            return Err(ForecastError::Data(format!(
                "{} has {} returns, risk profile needs at least {}",
                series.asset(),
                returns.len(),
                config.rolling_window.max(3)
            )));
        }

        let daily_volatility = sample_std_dev(&returns)?;
        let rolling = rolling_volatility(&returns, config.rolling_window)?;
        // Return i ends on date i + 1
        let rolling_volatility = series.dates()[config.rolling_window..]
            .iter()
            .zip(rolling)
            .map(|(date, volatility)| RollingPoint {
                date: *date,
                volatility,
            })
            .collect();

        Ok(Self {
            asset: series.asset().to_string(),
            daily_volatility,
            annualized_volatility: annualize_volatility(daily_volatility, config.trading_days),
            value_at_risk: historical_var(&returns, config.var_confidence)?,
            var_confidence: config.var_confidence,
            sharpe_ratio: sharpe_ratio(
                &returns,
                config.risk_free_rate / config.trading_days,
                config.trading_days,
            ),
            rolling_volatility,
            price_stationarity: kpss_test(series.prices())?,
            return_stationarity: kpss_test(&returns)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portfolio_trade::utils::generate_test_series;

    #[test]
    fn test_rolling_points_align_with_dates() {
        let series = generate_test_series("X", 100.0, 0.02, 60, 4).unwrap();
        let profile = RiskProfile::from_series(&series, &RiskConfig::default()).unwrap();

        assert_eq!(profile.rolling_volatility.len(), 59 - 30 + 1);
        assert_eq!(profile.rolling_volatility[0].date, series.dates()[30]);
        assert_eq!(
            profile.rolling_volatility.last().unwrap().date,
            series.last_date()
        );
        assert!(profile.value_at_risk < 0.0);
        assert!(profile.annualized_volatility > profile.daily_volatility);
    }

    #[test]
    fn test_short_series_rejected() {
        let series = generate_test_series("X", 100.0, 0.02, 10, 4).unwrap();
        assert!(RiskProfile::from_series(&series, &RiskConfig::default()).is_err());
    }
}
