//! Confidence bands around a point forecast
//!
//! Uncertainty grows with the square root of the horizon from the historical
//! daily volatility `σ` (sample standard deviation of simple returns). The
//! half-width at step `i` (1-based) is
//!
//! `z · σ · sqrt(i / trading_days) · M_i`
//!
//! where `M_i` is the largest absolute forecast value over steps `1..=i`.
//! While the forecast keeps making new highs this is exactly
//! `forecast[i] · z · σ · sqrt(i / trading_days)`; when it falls back the
//! band keeps its width instead of narrowing.

use crate::error::{ForecastError, Result};
use crate::models::Forecast;
use crate::utils::{monthly_growth, percent_change};
use portfolio_trade::PriceSeries;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};
use tracing::debug;
use trade_math::volatility::daily_volatility;

/// Band settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UncertaintyConfig {
    /// Standard-normal multiplier; 1.96 for a 95% band
    pub z: f64,
    /// Trading days per year for horizon scaling
    pub trading_days: f64,
}

impl Default for UncertaintyConfig {
    fn default() -> Self {
        Self {
            z: 1.96,
            trading_days: 252.0,
        }
    }
}

impl UncertaintyConfig {
    /// Two-sided band at `level`, e.g. 0.95
    pub fn from_confidence(level: f64) -> Result<Self> {
        if !(level > 0.0 && level < 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "Confidence level must be in (0, 1), got {}",
                level
            )));
        }

        let normal = Normal::new(0.0, 1.0)
            .map_err(|e| ForecastError::InvalidParameter(e.to_string()))?;

        Ok(Self {
            z: normal.inverse_cdf((1.0 + level) / 2.0),
            ..Self::default()
        })
    }
}

/// Lower and upper bounds aligned with a forecast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceBand {
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
    /// Daily volatility the band was projected from
    pub sigma: f64,
    pub z: f64,
}

impl ConfidenceBand {
    pub fn len(&self) -> usize {
        self.lower.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lower.is_empty()
    }

    /// Half-width at each step
    pub fn half_widths(&self) -> Vec<f64> {
        self.upper
            .iter()
            .zip(&self.lower)
            .map(|(u, l)| (u - l) / 2.0)
            .collect()
    }

    /// The first `horizon` steps
    pub fn truncated(&self, horizon: usize) -> Result<Self> {
        if horizon == 0 || horizon > self.len() {
            return Err(ForecastError::Forecast(format!(
                "Requested horizon {} but the band has {} steps",
                horizon,
                self.len()
            )));
        }

        Ok(Self {
            lower: self.lower[..horizon].to_vec(),
            upper: self.upper[..horizon].to_vec(),
            sigma: self.sigma,
            z: self.z,
        })
    }
}

/// Projects confidence bands from historical volatility
#[derive(Debug, Clone, Default)]
pub struct UncertaintyProjector {
    config: UncertaintyConfig,
}

impl UncertaintyProjector {
    pub fn new(config: UncertaintyConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &UncertaintyConfig {
        &self.config
    }

    /// Band for `forecast` using the volatility of `history`
    pub fn project(&self, history: &PriceSeries, forecast: &Forecast) -> Result<ConfidenceBand> {
        if history.len() < 3 {
            return Err(ForecastError::Data(format!(
                "Need at least 2 returns to estimate volatility, have {}",
                history.len().saturating_sub(1)
            )));
        }

        let sigma = daily_volatility(history.prices())?;
        debug!("Daily volatility of {}: {:.6}", history.asset(), sigma);

        Ok(self.project_values(sigma, &forecast.values()))
    }

    /// Band around `values` for a known daily volatility
    pub fn project_values(&self, sigma: f64, values: &[f64]) -> ConfidenceBand {
        let mut envelope: f64 = 0.0;
        let mut lower = Vec::with_capacity(values.len());
        let mut upper = Vec::with_capacity(values.len());

        for (i, &value) in values.iter().enumerate() {
            envelope = envelope.max(value.abs());
            let half_width = self.half_width_fraction(sigma, i + 1) * envelope;
            lower.push(value - half_width);
            upper.push(value + half_width);
        }

        ConfidenceBand {
            lower,
            upper,
            sigma,
            z: self.config.z,
        }
    }

    /// Relative half-width `z · σ · sqrt(step / trading_days)`
    pub fn half_width_fraction(&self, sigma: f64, step: usize) -> f64 {
        self.config.z * sigma * (step as f64 / self.config.trading_days).sqrt()
    }
}

/// Forecast value at a given step
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub step: usize,
    pub price: f64,
    pub change_pct: f64,
    /// Relative band half-width at this step, in percent
    pub band_pct: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Upward,
    Downward,
    Flat,
}

/// Plain-language reading of a forecast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSummary {
    pub asset: String,
    pub current_price: f64,
    /// Step 127, the forecast value 126 business days past the first step
    pub six_month: Option<Target>,
    /// Step 252, about twelve months out
    pub twelve_month: Option<Target>,
    /// Last forecast step
    pub end: Target,
    pub average_monthly_growth_pct: f64,
    pub trend: Trend,
    pub daily_volatility: f64,
}

pub const SIX_MONTH_STEP: usize = 127;
pub const TWELVE_MONTH_STEP: usize = 252;

impl ForecastSummary {
    /// Summarize `forecast` relative to the last observed price of `history`
    pub fn new(
        history: &PriceSeries,
        forecast: &Forecast,
        band: &ConfidenceBand,
        projector: &UncertaintyProjector,
    ) -> Result<Self> {
        let values = forecast.values();
        if values.len() != band.len() {
            return Err(ForecastError::LengthMismatch {
                expected: values.len(),
                actual: band.len(),
            });
        }

        let current_price = history.last_price();
        let target = |step: usize| -> Result<Option<Target>> {
            let Some(&price) = values.get(step.wrapping_sub(1)) else {
                return Ok(None);
            };
            Ok(Some(Target {
                step,
                price,
                change_pct: percent_change(current_price, price)?,
                band_pct: projector.half_width_fraction(band.sigma, step) * 100.0,
            }))
        };

        let end = target(values.len())?.ok_or_else(|| {
            ForecastError::Forecast("Cannot summarize an empty forecast".to_string())
        })?;

        let trend = match end.price.partial_cmp(&current_price) {
            Some(std::cmp::Ordering::Greater) => Trend::Upward,
            Some(std::cmp::Ordering::Less) => Trend::Downward,
            _ => Trend::Flat,
        };

        Ok(Self {
            asset: forecast.asset().to_string(),
            current_price,
            six_month: target(SIX_MONTH_STEP)?,
            twelve_month: target(TWELVE_MONTH_STEP)?,
            average_monthly_growth_pct: monthly_growth(current_price, end.price, end.step)?,
            end,
            trend,
            daily_volatility: band.sigma,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_z_from_confidence() {
        let config = UncertaintyConfig::from_confidence(0.95).unwrap();
        assert_approx_eq!(config.z, 1.959964, 1e-5);
        assert!(UncertaintyConfig::from_confidence(1.0).is_err());
    }

    #[test]
    fn test_band_matches_formula_on_rising_forecast() {
        let projector = UncertaintyProjector::default();
        let values = [100.0, 101.0, 102.0];
        let band = projector.project_values(0.02, &values);

        for (i, v) in values.iter().enumerate() {
            let expected = v * 1.96 * 0.02 * ((i + 1) as f64 / 252.0).sqrt();
            assert_approx_eq!(band.upper[i] - v, expected, 1e-12);
            assert_approx_eq!(v - band.lower[i], expected, 1e-12);
        }
    }

    #[test]
    fn test_band_widens_on_falling_forecast() {
        let projector = UncertaintyProjector::default();
        let band = projector.project_values(0.03, &[100.0, 60.0, 30.0, 10.0]);
        let widths = band.half_widths();
        assert!(widths.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn test_zero_volatility_band_is_degenerate() {
        let projector = UncertaintyProjector::default();
        let band = projector.project_values(0.0, &[10.0, 11.0]);
        assert_eq!(band.lower, vec![10.0, 11.0]);
        assert_eq!(band.upper, vec![10.0, 11.0]);
    }
}
