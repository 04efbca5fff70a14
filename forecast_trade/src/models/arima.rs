//! ARIMA models with automatic order selection
//!
//! The differencing order is the smallest `d` whose differenced series passes
//! a KPSS level-stationarity test. For that `d`, every `(p, q)` in the grid is
//! estimated by Hannan-Rissanen regression and scored by an information
//! criterion computed from conditional-sum-of-squares residuals over a common
//! sample, so candidates are compared on equal footing.

use crate::error::{ForecastError, Result};
use crate::models::{Forecast, ForecastModel, ModelKind, TrainedForecastModel};
use crate::split::Split;
use portfolio_trade::PriceSeries;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use tracing::{debug, info};
use trade_math::forecasting::{
    difference, integrate, integration_anchors, is_stationary_polynomial, least_squares,
};
use trade_math::stationarity::kpss_test;

/// Residual variance floor keeping the log-likelihood finite for exact fits
const VARIANCE_FLOOR: f64 = 1e-12;

/// Criterion used to rank candidate orders
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InformationCriterion {
    #[default]
    Aic,
    Bic,
}

/// Order search settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArimaConfig {
    pub max_p: usize,
    pub max_d: usize,
    pub max_q: usize,
    pub criterion: InformationCriterion,
}

impl Default for ArimaConfig {
    fn default() -> Self {
        Self {
            max_p: 5,
            max_d: 2,
            max_q: 5,
            criterion: InformationCriterion::Aic,
        }
    }
}

/// Model order `(p, d, q)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArimaOrder {
    pub p: usize,
    pub d: usize,
    pub q: usize,
}

impl std::fmt::Display for ArimaOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ARIMA({},{},{})", self.p, self.d, self.q)
    }
}

/// ARIMA model with automatic order selection
#[derive(Debug, Clone, Default)]
pub struct AutoArima {
    config: ArimaConfig,
}

/// Estimated ARIMA model
///
/// Holds the coefficients plus the state at the end of the training series
/// (integration anchors, trailing differenced values and residuals), which is
/// all that is needed to continue the series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedArima {
    asset: String,
    order: ArimaOrder,
    constant: f64,
    ar: Vec<f64>,
    ma: Vec<f64>,
    sigma2: f64,
    criterion: InformationCriterion,
    criterion_value: f64,
    anchors: Vec<f64>,
    tail_values: Vec<f64>,
    tail_residuals: Vec<f64>,
}

/// Coefficients of one candidate
#[derive(Debug, Clone)]
struct Candidate {
    p: usize,
    q: usize,
    constant: f64,
    ar: Vec<f64>,
    ma: Vec<f64>,
    sigma2: f64,
    score: f64,
}

impl Candidate {
    fn parameter_count(&self) -> usize {
        self.p + self.q
    }
}

impl AutoArima {
    pub fn new(config: ArimaConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ArimaConfig {
        &self.config
    }

    /// Smallest `d <= max_d` whose differenced series looks level-stationary
    pub fn select_differencing(&self, values: &[f64]) -> Result<usize> {
        for d in 0..=self.config.max_d {
            let differenced = difference(values, d);
            if differenced.len() < 3 {
                break;
            }

            let kpss = kpss_test(&differenced)?;
            debug!(
                "KPSS at d={}: statistic {:.4}, stationary {}",
                d, kpss.statistic, kpss.is_stationary
            );
            if kpss.is_stationary {
                return Ok(d);
            }
        }

        Ok(self.config.max_d)
    }

    /// Estimate one `(p, q)` on the differenced series
    ///
    /// Returns `None` when the candidate does not converge: a singular
    /// regression, a non-stationary AR part, a non-invertible MA part or a
    /// non-finite residual variance.
    fn fit_candidate(
        &self,
        w: &[f64],
        p: usize,
        q: usize,
        with_constant: bool,
        sample_start: usize,
        innovations: Option<&[f64]>,
    ) -> Option<Candidate> {
        let n = w.len();
        let offset = usize::from(with_constant);

        let (constant, ar, ma) = if p == 0 && q == 0 {
            let constant = if with_constant {
                w.iter().sum::<f64>() / n as f64
            } else {
                0.0
            };
            (constant, Vec::new(), Vec::new())
        } else {
            let innovations = if q > 0 { innovations? } else { &[][..] };
            // First usable row: p lags of w and q lags of the innovations
            let long_order = n - innovations.len();
            let start = if q > 0 { p.max(long_order + q) } else { p };
            if n <= start {
                return None;
            }

            let mut design = Vec::with_capacity(n - start);
            let mut target = Vec::with_capacity(n - start);
            for t in start..n {
                let mut row = Vec::with_capacity(offset + p + q);
                if with_constant {
                    row.push(1.0);
                }
                row.extend((1..=p).map(|i| w[t - i]));
                row.extend((1..=q).map(|j| innovations[t - j - long_order]));
                design.push(row);
                target.push(w[t]);
            }

            if design.len() <= offset + p + q {
                return None;
            }

            let beta = least_squares(&design, &target).ok()?;
            let constant = if with_constant { beta[0] } else { 0.0 };
            (
                constant,
                beta[offset..offset + p].to_vec(),
                beta[offset + p..].to_vec(),
            )
        };

        let negated_ma: Vec<f64> = ma.iter().map(|t| -t).collect();
        if !is_stationary_polynomial(&ar) || !is_stationary_polynomial(&negated_ma) {
            return None;
        }

        let residuals = css_residuals(w, constant, &ar, &ma, sample_start);
        let n_eff = residuals.len();
        if n_eff == 0 {
            return None;
        }

        let sigma2 = residuals.iter().map(|e| e * e).sum::<f64>() / n_eff as f64;
        if !sigma2.is_finite() {
            return None;
        }
        let sigma2 = sigma2.max(VARIANCE_FLOOR);

        let n_eff = n_eff as f64;
        let log_likelihood = -0.5 * n_eff * ((2.0 * PI * sigma2).ln() + 1.0);
        // Coefficients plus the innovation variance
        let k = (offset + p + q + 1) as f64;
        let score = match self.config.criterion {
            InformationCriterion::Aic => -2.0 * log_likelihood + 2.0 * k,
            InformationCriterion::Bic => -2.0 * log_likelihood + k * n_eff.ln(),
        };

        score.is_finite().then_some(Candidate {
            p,
            q,
            constant,
            ar,
            ma,
            sigma2,
            score,
        })
    }
}

/// Innovations of a long autoregression, used as regressors for the MA part
///
/// Element `i` is the innovation at time `order + i`.
fn long_ar_innovations(w: &[f64], order: usize, with_constant: bool) -> Option<Vec<f64>> {
    let n = w.len();
    if order == 0 || n <= 2 * order + 1 {
        return None;
    }

    let mut design = Vec::with_capacity(n - order);
    let mut target = Vec::with_capacity(n - order);
    for t in order..n {
        let mut row = Vec::with_capacity(order + 1);
        if with_constant {
            row.push(1.0);
        }
        row.extend((1..=order).map(|i| w[t - i]));
        design.push(row);
        target.push(w[t]);
    }

    let beta = least_squares(&design, &target).ok()?;
    Some(
        design
            .iter()
            .zip(&target)
            .map(|(row, y)| y - row.iter().zip(&beta).map(|(x, b)| x * b).sum::<f64>())
            .collect(),
    )
}

/// Conditional-sum-of-squares residuals from `start` onward
///
/// Innovations before `start` are taken as zero.
fn css_residuals(w: &[f64], constant: f64, ar: &[f64], ma: &[f64], start: usize) -> Vec<f64> {
    let mut residuals = vec![0.0; w.len()];

    for t in start..w.len() {
        let mut fitted = constant;
        for (i, phi) in ar.iter().enumerate() {
            fitted += phi * w[t - i - 1];
        }
        for (j, theta) in ma.iter().enumerate() {
            if t > j {
                fitted += theta * residuals[t - j - 1];
            }
        }
        residuals[t] = w[t] - fitted;
    }

    residuals.split_off(start.min(w.len()))
}

/// Order of the long autoregression for a series of length `n`
fn long_ar_order(n: usize, max_lag: usize) -> usize {
    let rule = (10.0 * (n as f64).log10()).round() as usize;
    rule.max(max_lag + 1).min(n / 4)
}

impl ForecastModel for AutoArima {
    type Trained = TrainedArima;

    fn train(&self, series: &PriceSeries) -> Result<TrainedArima> {
        let values = series.prices();
        if values.len() < 3 {
            return Err(ForecastError::Fit(format!(
                "{} has {} observations, ARIMA needs at least 3",
                series.asset(),
                values.len()
            )));
        }

        let d = self.select_differencing(values)?;
        let w = difference(values, d);
        let with_constant = d < 2;

        let max_p = self.config.max_p.min(w.len() / 3);
        let max_q = self.config.max_q;
        let sample_start = max_p;

        let innovations = long_ar_innovations(&w, long_ar_order(w.len(), max_p.max(max_q)), with_constant);

        let mut best: Option<Candidate> = None;
        for p in 0..=max_p {
            for q in 0..=max_q {
                let Some(candidate) = self.fit_candidate(
                    &w,
                    p,
                    q,
                    with_constant,
                    sample_start,
                    innovations.as_deref(),
                ) else {
                    debug!("Skipping ARIMA({},{},{}): did not converge", p, d, q);
                    continue;
                };

                debug!(
                    "ARIMA({},{},{}) score {:.4}",
                    p, d, q, candidate.score
                );

                let better = match &best {
                    None => true,
                    Some(current) => {
                        let tolerance = 1e-9 * current.score.abs().max(1.0);
                        if (candidate.score - current.score).abs() <= tolerance {
                            candidate.parameter_count() < current.parameter_count()
                        } else {
                            candidate.score < current.score
                        }
                    }
                };
                if better {
                    best = Some(candidate);
                }
            }
        }

        let best = best.ok_or_else(|| {
            ForecastError::Fit(format!(
                "No ARIMA candidate converged for {} at d={}",
                series.asset(),
                d
            ))
        })?;

        let order = ArimaOrder {
            p: best.p,
            d,
            q: best.q,
        };
        let residuals = css_residuals(&w, best.constant, &best.ar, &best.ma, best.p);
        let tail_values = w[w.len() - best.p..].to_vec();
        let tail_residuals = residuals[residuals.len().saturating_sub(best.q)..].to_vec();

        info!(
            "Selected {} for {} ({:?} {:.4})",
            order,
            series.asset(),
            self.config.criterion,
            best.score
        );

        Ok(TrainedArima {
            asset: series.asset().to_string(),
            order,
            constant: best.constant,
            ar: best.ar,
            ma: best.ma,
            sigma2: best.sigma2,
            criterion: self.config.criterion,
            criterion_value: best.score,
            anchors: integration_anchors(values, d)?,
            tail_values,
            tail_residuals,
        })
    }

    fn name(&self) -> &str {
        "AutoARIMA"
    }
}

impl TrainedArima {
    pub fn order(&self) -> ArimaOrder {
        self.order
    }

    pub fn constant(&self) -> f64 {
        self.constant
    }

    pub fn ar_coefficients(&self) -> &[f64] {
        &self.ar
    }

    pub fn ma_coefficients(&self) -> &[f64] {
        &self.ma
    }

    /// Innovation variance of the fit
    pub fn sigma2(&self) -> f64 {
        self.sigma2
    }

    /// Information criterion of the selected order
    pub fn criterion_value(&self) -> f64 {
        self.criterion_value
    }

    /// Continue the training series by `horizon` steps
    pub fn forecast(&self, horizon: usize) -> Result<Vec<f64>> {
        self.continue_from(&self.tail_values, &self.tail_residuals, &self.anchors, horizon)
    }

    /// Continue an arbitrary history with the fitted coefficients
    ///
    /// Residuals are recomputed over `values`, so the history may extend past
    /// the training series.
    pub fn forecast_from(&self, values: &[f64], horizon: usize) -> Result<Vec<f64>> {
        let ArimaOrder { p, d, q } = self.order;
        if values.len() < d + p + 1 {
            return Err(ForecastError::InsufficientHistory {
                required: d + p + 1,
                available: values.len(),
            });
        }

        let w = difference(values, d);
        let residuals = css_residuals(&w, self.constant, &self.ar, &self.ma, p);
        let anchors = integration_anchors(values, d)?;

        self.continue_from(
            &w[w.len() - p..],
            &residuals[residuals.len().saturating_sub(q)..],
            &anchors,
            horizon,
        )
    }

    fn continue_from(
        &self,
        tail_values: &[f64],
        tail_residuals: &[f64],
        anchors: &[f64],
        horizon: usize,
    ) -> Result<Vec<f64>> {
        if horizon == 0 {
            return Err(ForecastError::Forecast(
                "Horizon must be at least 1".to_string(),
            ));
        }

        let mut history = tail_values.to_vec();
        let mut shocks = tail_residuals.to_vec();
        let mut diffs = Vec::with_capacity(horizon);

        for _ in 0..horizon {
            let mut next = self.constant;
            for (i, phi) in self.ar.iter().enumerate() {
                next += phi * history[history.len() - 1 - i];
            }
            for (j, theta) in self.ma.iter().enumerate() {
                if let Some(e) = shocks.len().checked_sub(j + 1).map(|k| shocks[k]) {
                    next += theta * e;
                }
            }

            history.push(next);
            // Future innovations have zero expectation
            shocks.push(0.0);
            diffs.push(next);
        }

        Ok(integrate(&diffs, anchors))
    }
}

impl TrainedForecastModel for TrainedArima {
    fn kind(&self) -> ModelKind {
        ModelKind::Statistical
    }

    fn name(&self) -> String {
        self.order.to_string()
    }

    fn predict_test(&self, split: &Split) -> Result<Vec<f64>> {
        self.forecast(split.test.len())
    }

    fn forecast_future(&self, history: &PriceSeries, horizon: usize) -> Result<Forecast> {
        let values = self.forecast_from(history.prices(), horizon)?;
        Forecast::continuing(history, self.name(), values)
    }
}
