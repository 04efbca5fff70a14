//! Utility functions for the forecast_trade crate

use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use portfolio_trade::utils::business_days_after;

/// Business days per calendar month, used for monthly growth rates
pub const TRADING_DAYS_PER_MONTH: f64 = 21.0;

/// Create future business-day dates for forecasting
pub fn future_dates(last_date: NaiveDate, horizon: usize) -> Result<Vec<NaiveDate>> {
    Ok(business_days_after(last_date, horizon)?)
}

/// Percentage change from `from` to `to`
pub fn percent_change(from: f64, to: f64) -> Result<f64> {
    if from == 0.0 || !from.is_finite() || !to.is_finite() {
        return Err(ForecastError::Data(format!(
            "Cannot compute a percent change from {} to {}",
            from, to
        )));
    }
    Ok((to / from - 1.0) * 100.0)
}

/// Average compound monthly growth, in percent, over `steps` trading days
pub fn monthly_growth(from: f64, to: f64, steps: usize) -> Result<f64> {
    if steps == 0 {
        return Err(ForecastError::InvalidParameter(
            "Growth needs at least one step".to_string(),
        ));
    }
    if from <= 0.0 || to <= 0.0 {
        return Err(ForecastError::Data(format!(
            "Growth is undefined from {} to {}",
            from, to
        )));
    }

    let months = steps as f64 / TRADING_DAYS_PER_MONTH;
    Ok(((to / from).powf(1.0 / months) - 1.0) * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_future_dates_skip_weekends() {
        // 2025-07-31 is a Thursday
        let last = NaiveDate::from_ymd_opt(2025, 7, 31).unwrap();
        let dates = future_dates(last, 3).unwrap();
        assert_eq!(dates[0], NaiveDate::from_ymd_opt(2025, 8, 1).unwrap());
        assert_eq!(dates[1], NaiveDate::from_ymd_opt(2025, 8, 4).unwrap());
        assert_eq!(dates[2], NaiveDate::from_ymd_opt(2025, 8, 5).unwrap());
    }

    #[test]
    fn test_percent_change() {
        assert_approx_eq!(percent_change(200.0, 250.0).unwrap(), 25.0, 1e-9);
        assert!(percent_change(0.0, 1.0).is_err());
    }

    #[test]
    fn test_monthly_growth_compounds() {
        // 21 steps is exactly one month
        assert_approx_eq!(monthly_growth(100.0, 110.0, 21).unwrap(), 10.0, 1e-9);
        // Two months of 10% compound to 21%
        assert_approx_eq!(monthly_growth(100.0, 121.0, 42).unwrap(), 10.0, 1e-9);
    }
}
