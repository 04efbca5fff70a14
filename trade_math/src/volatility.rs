//! Return and volatility statistics
//!
//! Contains the volatility estimator shared by the uncertainty projection and
//! the backtest engine, plus the risk statistics reported alongside them:
//! - Simple returns
//! - Sample mean and standard deviation
//! - Historical Value at Risk
//! - Rolling volatility
//! - Annualized Sharpe ratio
//! - Maximum drawdown

use crate::{MathError, Result};

/// Period-over-period fractional change, one element shorter than `prices`
pub fn simple_returns(prices: &[f64]) -> Vec<f64> {
    if prices.len() < 2 {
        return Vec::new();
    }

    prices.windows(2).map(|w| (w[1] / w[0]) - 1.0).collect()
}

/// Arithmetic mean
pub fn mean(values: &[f64]) -> Result<f64> {
    if values.is_empty() {
        return Err(MathError::InsufficientData(
            "Cannot take the mean of an empty series".to_string(),
        ));
    }

    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1 denominator)
pub fn sample_std_dev(values: &[f64]) -> Result<f64> {
    if values.len() < 2 {
        return Err(MathError::InsufficientData(format!(
            "Sample standard deviation needs at least 2 values, have {}",
            values.len()
        )));
    }

    let mean = mean(values)?;
    let variance = values.iter().map(|&v| (v - mean).powi(2)).sum::<f64>()
        / (values.len() - 1) as f64;

    Ok(variance.sqrt())
}

/// Daily volatility: sample standard deviation of the simple returns of `prices`
pub fn daily_volatility(prices: &[f64]) -> Result<f64> {
    sample_std_dev(&simple_returns(prices))
}

/// Scale a per-period standard deviation to an annual figure
pub fn annualize_volatility(per_period: f64, periods_per_year: f64) -> f64 {
    per_period * periods_per_year.sqrt()
}

/// Historical Value at Risk: the `(1 - confidence)` percentile of `returns`
///
/// Uses linear interpolation between order statistics. A 95% VaR is returned
/// as the (usually negative) 5th percentile return.
pub fn historical_var(returns: &[f64], confidence: f64) -> Result<f64> {
    if returns.is_empty() {
        return Err(MathError::InsufficientData(
            "Value at Risk needs at least one return".to_string(),
        ));
    }
    if !(0.0..1.0).contains(&confidence) || confidence == 0.0 {
        return Err(MathError::InvalidInput(format!(
            "Confidence must be in (0, 1), got {}",
            confidence
        )));
    }

    let mut sorted = returns.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let rank = (1.0 - confidence) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;

    Ok(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Rolling sample standard deviation over `window` returns
///
/// The output has `returns.len() - window + 1` values, the first one covering
/// `returns[..window]`.
pub fn rolling_volatility(returns: &[f64], window: usize) -> Result<Vec<f64>> {
    if window < 2 {
        return Err(MathError::InvalidInput(
            "Rolling window must be at least 2".to_string(),
        ));
    }
    if returns.len() < window {
        return Err(MathError::InsufficientData(format!(
            "Need {} returns for a rolling window, have {}",
            window,
            returns.len()
        )));
    }

    returns.windows(window).map(sample_std_dev).collect()
}

/// Annualized Sharpe ratio of per-period `returns`
///
/// `mean(r - rf) / std(r - rf) * sqrt(periods_per_year)` with the sample
/// standard deviation. Returns 0.0 when the ratio is undefined (fewer than two
/// returns or zero dispersion) so that results stay comparable with `==`.
pub fn sharpe_ratio(returns: &[f64], risk_free_per_period: f64, periods_per_year: f64) -> f64 {
    let excess: Vec<f64> = returns.iter().map(|r| r - risk_free_per_period).collect();

    let (Ok(mean), Ok(std_dev)) = (mean(&excess), sample_std_dev(&excess)) else {
        return 0.0;
    };

    if std_dev == 0.0 || !std_dev.is_finite() {
        return 0.0;
    }

    mean / std_dev * periods_per_year.sqrt()
}

/// Largest peak-to-trough decline of a cumulative value series, as a fraction
pub fn max_drawdown(cumulative: &[f64]) -> f64 {
    let mut peak = f64::MIN;
    let mut max_drawdown: f64 = 0.0;

    for &value in cumulative {
        if value > peak {
            peak = value;
        }
        if peak > 0.0 {
            max_drawdown = max_drawdown.max((peak - value) / peak);
        }
    }

    max_drawdown
}
