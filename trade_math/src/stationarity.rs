//! Stationarity testing
//!
//! KPSS test for level stationarity, used to pick the differencing order of
//! ARIMA models and reported as an exploratory statistic.

use crate::{MathError, Result};
use serde::{Deserialize, Serialize};

/// 5% critical value of the KPSS level-stationarity statistic
pub const KPSS_CRITICAL_5PCT: f64 = 0.463;

/// Outcome of a KPSS test
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KpssResult {
    /// Test statistic
    pub statistic: f64,
    /// Bartlett window lags used for the long-run variance
    pub lags: usize,
    /// Whether the null of level stationarity survives at 5%
    pub is_stationary: bool,
}

/// KPSS test for level stationarity
///
/// The long-run variance uses a Bartlett kernel with
/// `floor(4 * (n / 100)^(1/4))` lags. A series with zero variance is
/// reported as stationary.
pub fn kpss_test(values: &[f64]) -> Result<KpssResult> {
    let n = values.len();
    if n < 3 {
        return Err(MathError::InsufficientData(format!(
            "KPSS needs at least 3 observations, have {}",
            n
        )));
    }

    let nf = n as f64;
    let mean = values.iter().sum::<f64>() / nf;
    let residuals: Vec<f64> = values.iter().map(|v| v - mean).collect();

    let lags = ((4.0 * (nf / 100.0).powf(0.25)).floor() as usize).min(n - 1);

    let mut long_run = residuals.iter().map(|e| e * e).sum::<f64>() / nf;
    for k in 1..=lags {
        let weight = 1.0 - k as f64 / (lags as f64 + 1.0);
        let autocov: f64 = residuals[k..]
            .iter()
            .zip(&residuals[..n - k])
            .map(|(a, b)| a * b)
            .sum::<f64>()
            / nf;
        long_run += 2.0 * weight * autocov;
    }

    if long_run <= f64::EPSILON * mean.abs().max(1.0) {
        return Ok(KpssResult {
            statistic: 0.0,
            lags,
            is_stationary: true,
        });
    }

    let mut partial = 0.0;
    let mut eta = 0.0;
    for e in &residuals {
        partial += e;
        eta += partial * partial;
    }
    let statistic = eta / (nf * nf) / long_run;

    Ok(KpssResult {
        statistic,
        lags,
        is_stationary: statistic < KPSS_CRITICAL_5PCT,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kpss_trend_is_not_stationary() {
        let trend: Vec<f64> = (0..200).map(|i| 100.0 + i as f64).collect();
        let result = kpss_test(&trend).unwrap();
        assert!(!result.is_stationary);
        assert!(result.statistic > KPSS_CRITICAL_5PCT);
    }

    #[test]
    fn test_kpss_mean_reverting_is_stationary() {
        let zigzag: Vec<f64> = (0..200)
            .map(|i| if i % 2 == 0 { 11.0 } else { 9.0 })
            .collect();
        assert!(kpss_test(&zigzag).unwrap().is_stationary);
    }

    #[test]
    fn test_kpss_constant_series() {
        let result = kpss_test(&[50.0; 20]).unwrap();
        assert!(result.is_stationary);
        assert_eq!(result.statistic, 0.0);
    }

    #[test]
    fn test_kpss_too_short() {
        assert!(kpss_test(&[1.0, 2.0]).is_err());
    }
}
