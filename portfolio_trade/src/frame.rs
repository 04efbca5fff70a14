//! Daily price data
//!
//! [`PriceSeries`] is a validated single-asset series used by the forecasting
//! models. [`PriceFrame`] holds several assets on a shared date index and may
//! contain gaps, which are forward-filled before returns are computed.

use crate::{PortfolioError, Result};
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use trade_math::volatility;

/// Ordered `(date, price)` observations of one asset
///
/// Dates are strictly increasing and every price is finite and positive.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceSeries {
    asset: String,
    dates: Vec<NaiveDate>,
    prices: Vec<f64>,
}

impl PriceSeries {
    /// Create a validated series
    pub fn new(asset: impl Into<String>, dates: Vec<NaiveDate>, prices: Vec<f64>) -> Result<Self> {
        let asset = asset.into();

        if dates.len() != prices.len() {
            return Err(PortfolioError::InvalidData(format!(
                "{}: {} dates but {} prices",
                asset,
                dates.len(),
                prices.len()
            )));
        }
        if dates.is_empty() {
            return Err(PortfolioError::InvalidData(format!(
                "{}: price series is empty",
                asset
            )));
        }
        if let Some(w) = dates.windows(2).find(|w| w[1] <= w[0]) {
            return Err(PortfolioError::InvalidData(format!(
                "{}: dates must be strictly increasing ({} followed by {})",
                asset, w[0], w[1]
            )));
        }
        if let Some((date, price)) = dates
            .iter()
            .zip(&prices)
            .find(|(_, p)| !p.is_finite() || **p <= 0.0)
        {
            return Err(PortfolioError::InvalidData(format!(
                "{}: invalid price {} on {}",
                asset, price, date
            )));
        }

        Ok(Self {
            asset,
            dates,
            prices,
        })
    }

    /// Create a series from `(date, price)` pairs
    pub fn from_points(
        asset: impl Into<String>,
        points: impl IntoIterator<Item = (NaiveDate, f64)>,
    ) -> Result<Self> {
        let (dates, prices) = points.into_iter().unzip();
        Self::new(asset, dates, prices)
    }

    /// Asset identifier
    pub fn asset(&self) -> &str {
        &self.asset
    }

    /// Observation dates
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Observed prices
    pub fn prices(&self) -> &[f64] {
        &self.prices
    }

    /// Number of observations
    pub fn len(&self) -> usize {
        self.prices.len()
    }

    /// Always false for a constructed series; kept for API symmetry
    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    /// First observation date
    pub fn first_date(&self) -> NaiveDate {
        self.dates[0]
    }

    /// Last observation date
    pub fn last_date(&self) -> NaiveDate {
        self.dates[self.dates.len() - 1]
    }

    /// Last observed price
    pub fn last_price(&self) -> f64 {
        self.prices[self.prices.len() - 1]
    }

    /// Iterate over `(date, price)` pairs
    pub fn points(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.dates.iter().copied().zip(self.prices.iter().copied())
    }

    /// Simple returns, one element shorter than the series
    pub fn returns(&self) -> Vec<f64> {
        volatility::simple_returns(&self.prices)
    }

    /// Number of observations dated on or before `date`
    pub fn count_through(&self, date: NaiveDate) -> usize {
        self.dates.partition_point(|d| *d <= date)
    }

    /// Split into `[..index]` and `[index..]`
    ///
    /// Returns `None` when either side would be empty.
    pub fn split_at(&self, index: usize) -> Option<(PriceSeries, PriceSeries)> {
        if index == 0 || index >= self.len() {
            return None;
        }

        let head = PriceSeries {
            asset: self.asset.clone(),
            dates: self.dates[..index].to_vec(),
            prices: self.prices[..index].to_vec(),
        };
        let tail = PriceSeries {
            asset: self.asset.clone(),
            dates: self.dates[index..].to_vec(),
            prices: self.prices[index..].to_vec(),
        };

        Some((head, tail))
    }
}

/// How gaps in a backtest window are filled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalendarFill {
    /// Keep the observed trading dates and forward-fill missing cells
    #[default]
    TradingDays,
    /// Reindex onto every calendar day, forward-filling weekends and holidays
    CalendarDays,
}

/// Prices of several assets on a shared date index
///
/// Cells may be missing (`None`); present values are finite and positive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPriceFrame")]
pub struct PriceFrame {
    dates: Vec<NaiveDate>,
    assets: Vec<String>,
    columns: Vec<Vec<Option<f64>>>,
}

#[derive(Deserialize)]
struct RawPriceFrame {
    dates: Vec<NaiveDate>,
    assets: Vec<String>,
    columns: Vec<Vec<Option<f64>>>,
}

impl TryFrom<RawPriceFrame> for PriceFrame {
    type Error = PortfolioError;

    fn try_from(raw: RawPriceFrame) -> Result<Self> {
        Self::new(raw.dates, raw.assets, raw.columns)
    }
}

impl PriceFrame {
    /// Create a validated frame; `columns[i]` holds the prices of `assets[i]`
    pub fn new(
        dates: Vec<NaiveDate>,
        assets: Vec<String>,
        columns: Vec<Vec<Option<f64>>>,
    ) -> Result<Self> {
        if assets.len() != columns.len() {
            return Err(PortfolioError::InvalidData(format!(
                "{} assets but {} price columns",
                assets.len(),
                columns.len()
            )));
        }

        let mut seen = HashSet::new();
        if let Some(dup) = assets.iter().find(|a| !seen.insert(a.as_str())) {
            return Err(PortfolioError::InvalidData(format!(
                "Duplicate asset column: {}",
                dup
            )));
        }

        if let Some(w) = dates.windows(2).find(|w| w[1] <= w[0]) {
            return Err(PortfolioError::InvalidData(format!(
                "Dates must be strictly increasing ({} followed by {})",
                w[0], w[1]
            )));
        }

        for (asset, column) in assets.iter().zip(&columns) {
            if column.len() != dates.len() {
                return Err(PortfolioError::InvalidData(format!(
                    "{}: {} prices for {} dates",
                    asset,
                    column.len(),
                    dates.len()
                )));
            }
            if let Some(price) = column.iter().flatten().find(|p| !p.is_finite() || **p <= 0.0) {
                return Err(PortfolioError::InvalidData(format!(
                    "{}: invalid price {}",
                    asset, price
                )));
            }
        }

        Ok(Self {
            dates,
            assets,
            columns,
        })
    }

    /// Build a frame from complete single-asset series sharing one date index
    pub fn from_series(series: &[PriceSeries]) -> Result<Self> {
        let Some(first) = series.first() else {
            return Err(PortfolioError::InvalidData(
                "Cannot build a frame from no series".to_string(),
            ));
        };

        if let Some(other) = series.iter().find(|s| s.dates() != first.dates()) {
            return Err(PortfolioError::InvalidData(format!(
                "{} does not share the date index of {}",
                other.asset(),
                first.asset()
            )));
        }

        Self::new(
            first.dates().to_vec(),
            series.iter().map(|s| s.asset().to_string()).collect(),
            series
                .iter()
                .map(|s| s.prices().iter().copied().map(Some).collect())
                .collect(),
        )
    }

    /// Date index
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Asset identifiers in column order
    pub fn assets(&self) -> &[String] {
        &self.assets
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// Whether the frame has no rows
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Price column of `asset`
    pub fn column(&self, asset: &str) -> Option<&[Option<f64>]> {
        self.assets
            .iter()
            .position(|a| a == asset)
            .map(|i| self.columns[i].as_slice())
    }

    /// Observed prices of `asset`, skipping missing cells
    pub fn series(&self, asset: &str) -> Result<PriceSeries> {
        let column = self
            .column(asset)
            .ok_or_else(|| PortfolioError::MissingAsset(asset.to_string()))?;

        PriceSeries::from_points(
            asset,
            self.dates
                .iter()
                .zip(column)
                .filter_map(|(d, p)| p.map(|p| (*d, p))),
        )
    }

    /// Keep only `assets`, in the given order
    pub fn select(&self, assets: &[&str]) -> Result<Self> {
        let mut columns = Vec::with_capacity(assets.len());
        for asset in assets {
            let column = self
                .column(asset)
                .ok_or_else(|| PortfolioError::MissingAsset(asset.to_string()))?;
            columns.push(column.to_vec());
        }

        Ok(Self {
            dates: self.dates.clone(),
            assets: assets.iter().map(|a| a.to_string()).collect(),
            columns,
        })
    }

    /// Rows dated within `[start, end]`
    pub fn window(&self, start: NaiveDate, end: NaiveDate) -> Self {
        let from = self.dates.partition_point(|d| *d < start);
        let to = self.dates.partition_point(|d| *d <= end).max(from);

        Self {
            dates: self.dates[from..to].to_vec(),
            assets: self.assets.clone(),
            columns: self
                .columns
                .iter()
                .map(|c| c[from..to].to_vec())
                .collect(),
        }
    }

    /// Forward-fill gaps from the prior observation
    ///
    /// With [`CalendarFill::CalendarDays`] the index is first expanded to every
    /// calendar day between the first and last date. Leading rows where some
    /// asset has no observation yet are dropped, so the result has no gaps.
    pub fn forward_filled(&self, fill: CalendarFill) -> Self {
        let (dates, mut columns) = match fill {
            CalendarFill::TradingDays => (self.dates.clone(), self.columns.clone()),
            CalendarFill::CalendarDays => self.reindex_calendar_days(),
        };

        for column in columns.iter_mut() {
            let mut last = None;
            for cell in column.iter_mut() {
                match cell {
                    Some(price) => last = Some(*price),
                    None => *cell = last,
                }
            }
        }

        let first_complete = (0..dates.len())
            .find(|&row| columns.iter().all(|c| c[row].is_some()))
            .unwrap_or(dates.len());

        Self {
            dates: dates[first_complete..].to_vec(),
            assets: self.assets.clone(),
            columns: columns
                .into_iter()
                .map(|c| c[first_complete..].to_vec())
                .collect(),
        }
    }

    fn reindex_calendar_days(&self) -> (Vec<NaiveDate>, Vec<Vec<Option<f64>>>) {
        let (Some(&first), Some(&last)) = (self.dates.first(), self.dates.last()) else {
            return (Vec::new(), vec![Vec::new(); self.columns.len()]);
        };

        let mut dates = Vec::new();
        let mut columns = vec![Vec::new(); self.columns.len()];
        let mut source = 0;
        let mut day = first;

        while day <= last {
            let observed = self.dates.get(source) == Some(&day);
            for (target, column) in columns.iter_mut().zip(&self.columns) {
                target.push(if observed { column[source] } else { None });
            }
            if observed {
                source += 1;
            }
            dates.push(day);

            match day.checked_add_days(Days::new(1)) {
                Some(next) => day = next,
                None => break,
            }
        }

        (dates, columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[test]
    fn test_price_series_validation() {
        assert!(PriceSeries::new("A", vec![date(2), date(3)], vec![1.0, 2.0]).is_ok());
        assert!(PriceSeries::new("A", vec![date(3), date(2)], vec![1.0, 2.0]).is_err());
        assert!(PriceSeries::new("A", vec![date(2), date(2)], vec![1.0, 2.0]).is_err());
        assert!(PriceSeries::new("A", vec![date(2), date(3)], vec![1.0, 0.0]).is_err());
        assert!(PriceSeries::new("A", vec![date(2)], vec![1.0, 2.0]).is_err());
        assert!(PriceSeries::new("A", vec![], vec![]).is_err());
    }

    #[test]
    fn test_frame_deserialization_is_validated() {
        let valid = r#"{"dates":["2024-01-02","2024-01-03"],"assets":["A"],"columns":[[1.0,null]]}"#;
        let frame: PriceFrame = serde_json::from_str(valid).unwrap();
        assert_eq!(frame.assets(), &["A".to_string()]);

        let unordered = r#"{"dates":["2024-01-03","2024-01-02"],"assets":["A"],"columns":[[1.0,2.0]]}"#;
        assert!(serde_json::from_str::<PriceFrame>(unordered).is_err());

        let negative = r#"{"dates":["2024-01-02","2024-01-03"],"assets":["A"],"columns":[[1.0,-2.0]]}"#;
        assert!(serde_json::from_str::<PriceFrame>(negative).is_err());
    }

    #[test]
    fn test_split_at_rejects_empty_sides() {
        let series = PriceSeries::new("A", vec![date(2), date(3), date(4)], vec![1.0, 2.0, 3.0])
            .unwrap();
        assert!(series.split_at(0).is_none());
        assert!(series.split_at(3).is_none());

        let (head, tail) = series.split_at(1).unwrap();
        assert_eq!(head.prices(), &[1.0]);
        assert_eq!(tail.prices(), &[2.0, 3.0]);
    }

    #[test]
    fn test_forward_fill_trading_days() {
        let frame = PriceFrame::new(
            vec![date(2), date(3), date(4), date(5)],
            vec!["A".to_string(), "B".to_string()],
            vec![
                vec![None, Some(10.0), None, Some(12.0)],
                vec![Some(5.0), Some(5.5), Some(6.0), None],
            ],
        )
        .unwrap();

        let filled = frame.forward_filled(CalendarFill::TradingDays);
        assert_eq!(filled.dates(), &[date(3), date(4), date(5)]);
        assert_eq!(
            filled.column("A").unwrap(),
            &[Some(10.0), Some(10.0), Some(12.0)]
        );
        assert_eq!(
            filled.column("B").unwrap(),
            &[Some(5.5), Some(6.0), Some(6.0)]
        );
    }

    #[test]
    fn test_forward_fill_calendar_days() {
        // Friday then Monday
        let friday = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        let monday = NaiveDate::from_ymd_opt(2024, 1, 8).unwrap();
        let frame = PriceFrame::new(
            vec![friday, monday],
            vec!["A".to_string()],
            vec![vec![Some(10.0), Some(11.0)]],
        )
        .unwrap();

        let filled = frame.forward_filled(CalendarFill::CalendarDays);
        assert_eq!(filled.len(), 4);
        assert_eq!(
            filled.column("A").unwrap(),
            &[Some(10.0), Some(10.0), Some(10.0), Some(11.0)]
        );
    }

    #[test]
    fn test_window_is_inclusive() {
        let frame = PriceFrame::new(
            vec![date(2), date(3), date(4), date(5)],
            vec!["A".to_string()],
            vec![vec![Some(1.0), Some(2.0), Some(3.0), Some(4.0)]],
        )
        .unwrap();

        let window = frame.window(date(3), date(4));
        assert_eq!(window.dates(), &[date(3), date(4)]);
        assert!(frame.window(date(10), date(20)).is_empty());
    }

    #[test]
    fn test_series_skips_missing_cells() {
        let frame = PriceFrame::new(
            vec![date(2), date(3), date(4)],
            vec!["A".to_string()],
            vec![vec![Some(1.0), None, Some(3.0)]],
        )
        .unwrap();

        let series = frame.series("A").unwrap();
        assert_eq!(series.dates(), &[date(2), date(4)]);
        assert!(matches!(
            frame.series("B"),
            Err(PortfolioError::MissingAsset(_))
        ));
    }
}
