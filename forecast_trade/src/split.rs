//! Chronological train/test partitioning

use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use portfolio_trade::PriceSeries;
use serde::Serialize;

/// A price series cut at a single date
///
/// `train` holds every observation dated on or before the cut, `test` every
/// later one. Neither side is empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Split {
    pub train: PriceSeries,
    pub test: PriceSeries,
    pub cut_date: NaiveDate,
}

/// Partition `series` at `cut_date`
pub fn split(series: &PriceSeries, cut_date: NaiveDate) -> Result<Split> {
    let index = series.count_through(cut_date);

    let (train, test) = series.split_at(index).ok_or_else(|| {
        ForecastError::InvalidSplit(format!(
            "Cut date {} leaves an empty side for {} ({} to {})",
            cut_date,
            series.asset(),
            series.first_date(),
            series.last_date()
        ))
    })?;

    Ok(Split {
        train,
        test,
        cut_date,
    })
}

/// Partition so that roughly `test_fraction` of the observations are tested
///
/// The cut is placed on an observed date, keeping at least one observation on
/// each side.
pub fn split_ratio(series: &PriceSeries, test_fraction: f64) -> Result<Split> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(ForecastError::InvalidParameter(format!(
            "Test fraction must be in (0, 1), got {}",
            test_fraction
        )));
    }
    if series.len() < 2 {
        return Err(ForecastError::InvalidSplit(format!(
            "{} has {} observations, cannot split",
            series.asset(),
            series.len()
        )));
    }

    let test_len = ((series.len() as f64) * test_fraction).round() as usize;
    let train_len = series.len() - test_len.clamp(1, series.len() - 1);

    split(series, series.dates()[train_len - 1])
}
