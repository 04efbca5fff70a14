//! Fixed-weight portfolio backtest
//!
//! Replays historical daily returns under a constant weight vector and
//! reports cumulative growth, total return, Sharpe ratio, annualized
//! volatility and maximum drawdown. Two runs over the same window are
//! compared into a [`BacktestComparison`].

use crate::frame::{CalendarFill, PriceFrame};
use crate::utils::{validate_positive, validate_range};
use crate::weights::WeightVector;
use crate::{PortfolioError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, info};
use trade_math::volatility;

/// Backtest settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    /// Annual risk-free rate, e.g. 0.03
    pub risk_free_rate: f64,
    /// Trading days per year used for de-annualizing and annualizing
    pub trading_days: f64,
    /// Gap handling inside the window
    pub fill: CalendarFill,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            risk_free_rate: 0.03,
            trading_days: 252.0,
            fill: CalendarFill::TradingDays,
        }
    }
}

impl BacktestConfig {
    /// Check that the settings are usable
    pub fn validate(&self) -> Result<()> {
        validate_range(self.risk_free_rate, -1.0, 1.0, "Risk-free rate")?;
        validate_positive(self.trading_days, "Trading days")
    }

    fn risk_free_per_period(&self) -> f64 {
        self.risk_free_rate / self.trading_days
    }
}

/// Inclusive date range of a backtest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BacktestWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl BacktestWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Growth of one unit of capital at the close of `date`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CumulativePoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Performance of one weight vector over a window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    pub label: String,
    /// One point per return day; the implicit starting value is 1.0
    pub cumulative: Vec<CumulativePoint>,
    pub daily_returns: Vec<f64>,
    pub total_return_pct: f64,
    pub sharpe_ratio: f64,
    pub annualized_volatility: f64,
    pub max_drawdown: f64,
}

impl BacktestResult {
    /// Final cumulative growth factor
    pub fn final_value(&self) -> f64 {
        self.cumulative.last().map(|p| p.value).unwrap_or(1.0)
    }
}

/// Outcome of a strategy-versus-benchmark comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Higher total return and higher Sharpe ratio
    Outperformed,
    HigherReturnOnly,
    HigherSharpeOnly,
    Underperformed,
}

impl Verdict {
    pub fn from_results(strategy: &BacktestResult, benchmark: &BacktestResult) -> Self {
        let higher_return = strategy.total_return_pct > benchmark.total_return_pct;
        let higher_sharpe = strategy.sharpe_ratio > benchmark.sharpe_ratio;

        match (higher_return, higher_sharpe) {
            (true, true) => Verdict::Outperformed,
            (true, false) => Verdict::HigherReturnOnly,
            (false, true) => Verdict::HigherSharpeOnly,
            (false, false) => Verdict::Underperformed,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Verdict::Outperformed => {
                "Strategy outperformed the benchmark in both return and risk-adjusted return"
            }
            Verdict::HigherReturnOnly => {
                "Strategy delivered a higher return but a lower risk-adjusted return"
            }
            Verdict::HigherSharpeOnly => {
                "Strategy delivered a better risk-adjusted return but a lower total return"
            }
            Verdict::Underperformed => "Strategy did not beat the benchmark",
        }
    }
}

/// Strategy and benchmark results over the same window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestComparison {
    pub window: BacktestWindow,
    pub strategy: BacktestResult,
    pub benchmark: BacktestResult,
    pub verdict: Verdict,
}

impl BacktestComparison {
    pub fn outperformed(&self) -> bool {
        self.verdict == Verdict::Outperformed
    }
}

/// Runs fixed-weight backtests over a price frame
#[derive(Debug, Clone, Default)]
pub struct BacktestSimulator {
    config: BacktestConfig,
}

impl BacktestSimulator {
    pub fn new(config: BacktestConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    /// Restrict `frame` to the window and the assets weighted by any of
    /// `weights`, then fill gaps
    ///
    /// Assets with zero weight everywhere are ignored even when absent from
    /// the frame. Fails with [`PortfolioError::EmptyWindow`] when fewer than
    /// two complete rows remain.
    pub fn prepare(
        &self,
        frame: &PriceFrame,
        window: &BacktestWindow,
        weights: &[&WeightVector],
    ) -> Result<PriceFrame> {
        self.config.validate()?;

        let assets: BTreeSet<&str> = weights.iter().flat_map(|w| w.active_assets()).collect();
        if let Some(missing) = assets.iter().find(|a| frame.column(a).is_none()) {
            return Err(PortfolioError::MissingAsset(missing.to_string()));
        }

        let assets: Vec<&str> = assets.into_iter().collect();
        let prepared = frame
            .window(window.start, window.end)
            .select(&assets)?
            .forward_filled(self.config.fill);

        debug!(
            "Prepared {} rows for {:?} between {} and {}",
            prepared.len(),
            assets,
            window.start,
            window.end
        );

        if prepared.len() < 2 {
            return Err(PortfolioError::EmptyWindow(format!(
                "{} to {} leaves {} usable rows",
                window.start,
                window.end,
                prepared.len()
            )));
        }

        Ok(prepared)
    }

    /// Simulate one weight vector over a frame produced by [`Self::prepare`]
    pub fn simulate(
        &self,
        prepared: &PriceFrame,
        weights: &WeightVector,
        label: &str,
    ) -> Result<BacktestResult> {
        let rows = prepared.len();
        if rows < 2 {
            return Err(PortfolioError::EmptyWindow(format!(
                "{} has {} rows",
                label, rows
            )));
        }

        let mut daily_returns = vec![0.0; rows - 1];
        for (asset, weight) in weights.iter().filter(|(_, w)| *w > 0.0) {
            let column = prepared
                .column(asset)
                .ok_or_else(|| PortfolioError::MissingAsset(asset.to_string()))?;
            let prices: Vec<f64> = column
                .iter()
                .copied()
                .collect::<Option<Vec<f64>>>()
                .ok_or_else(|| {
                    PortfolioError::InvalidData(format!("{} has gaps after filling", asset))
                })?;

            for (total, r) in daily_returns
                .iter_mut()
                .zip(volatility::simple_returns(&prices))
            {
                *total += weight * r;
            }
        }

        let mut value = 1.0;
        let cumulative: Vec<CumulativePoint> = prepared.dates()[1..]
            .iter()
            .zip(&daily_returns)
            .map(|(date, r)| {
                value *= 1.0 + r;
                CumulativePoint { date: *date, value }
            })
            .collect();

        // Drawdown is measured from the initial value of 1.0
        let values: Vec<f64> = std::iter::once(1.0)
            .chain(cumulative.iter().map(|p| p.value))
            .collect();
        let total_return_pct = (value - 1.0) * 100.0;
        let sharpe_ratio = volatility::sharpe_ratio(
            &daily_returns,
            self.config.risk_free_per_period(),
            self.config.trading_days,
        );
        let annualized_volatility = volatility::sample_std_dev(&daily_returns)
            .map(|sd| volatility::annualize_volatility(sd, self.config.trading_days))
            .unwrap_or(0.0);
        let max_drawdown = volatility::max_drawdown(&values);

        Ok(BacktestResult {
            label: label.to_string(),
            cumulative,
            daily_returns,
            total_return_pct,
            sharpe_ratio,
            annualized_volatility,
            max_drawdown,
        })
    }

    /// Prepare the window and simulate a single weight vector
    pub fn run(
        &self,
        frame: &PriceFrame,
        window: &BacktestWindow,
        weights: &WeightVector,
        label: &str,
    ) -> Result<BacktestResult> {
        let prepared = self.prepare(frame, window, &[weights])?;
        self.simulate(&prepared, weights, label)
    }

    /// Backtest strategy and benchmark over the same prepared window
    pub fn compare(
        &self,
        frame: &PriceFrame,
        window: &BacktestWindow,
        strategy: &WeightVector,
        benchmark: &WeightVector,
    ) -> Result<BacktestComparison> {
        let prepared = self.prepare(frame, window, &[strategy, benchmark])?;

        info!(
            "Running backtest: strategy vs benchmark from {} to {} ({} rows)",
            window.start,
            window.end,
            prepared.len()
        );

        let strategy = self.simulate(&prepared, strategy, "strategy")?;
        let benchmark = self.simulate(&prepared, benchmark, "benchmark")?;
        let verdict = Verdict::from_results(&strategy, &benchmark);

        info!(
            "Backtest complete: strategy {:.2}% (Sharpe {:.2}), benchmark {:.2}% (Sharpe {:.2})",
            strategy.total_return_pct,
            strategy.sharpe_ratio,
            benchmark.total_return_pct,
            benchmark.sharpe_ratio
        );

        Ok(BacktestComparison {
            window: *window,
            strategy,
            benchmark,
            verdict,
        })
    }
}
