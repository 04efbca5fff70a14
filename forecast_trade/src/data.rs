//! Price data loading
//!
//! Reads wide CSV files of the form `date,<asset>,<asset>,...` into a
//! [`PriceFrame`]. Empty or non-numeric cells become missing values; rows are
//! sorted by date.

use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use polars::prelude::*;
use portfolio_trade::{PriceFrame, PriceSeries};
use std::fs::File;
use std::path::Path;
use tracing::{debug, info};

/// Data loader for daily price files
#[derive(Debug)]
pub struct DataLoader;

impl DataLoader {
    /// Load a price frame from a CSV file
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<PriceFrame> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ForecastError::DataUnavailable(path.display().to_string()));
        }

        info!("Loading price data from: {}", path.display());

        let file = File::open(path)?;
        let df = CsvReader::new(file)
            .infer_schema(None)
            .has_header(true)
            .finish()?;

        Self::from_dataframe(&df)
    }

    /// Load a single asset's series from a CSV file
    pub fn load_series<P: AsRef<Path>>(path: P, asset: &str) -> Result<PriceSeries> {
        let frame = Self::from_csv(path)?;
        Ok(frame.series(asset)?)
    }

    /// Convert an existing DataFrame into a price frame
    ///
    /// The time column is detected by name; every other column is an asset.
    pub fn from_dataframe(df: &DataFrame) -> Result<PriceFrame> {
        let time_column = Self::detect_time_column(df)?;
        let dates = Self::parse_dates(df.column(&time_column)?)?;

        let assets: Vec<String> = df
            .get_column_names()
            .into_iter()
            .filter(|name| *name != time_column)
            .map(|name| name.to_string())
            .collect();

        if assets.is_empty() {
            return Err(ForecastError::Data(
                "No price columns found in data".to_string(),
            ));
        }

        let mut columns = Vec::with_capacity(assets.len());
        for asset in &assets {
            columns.push(Self::column_as_prices(df.column(asset)?)?);
        }

        // Sort rows chronologically
        let mut order: Vec<usize> = (0..dates.len()).collect();
        order.sort_by_key(|&i| dates[i]);
        let dates = order.iter().map(|&i| dates[i]).collect();
        let columns = columns
            .into_iter()
            .map(|column| order.iter().map(|&i| column[i]).collect())
            .collect();

        let frame = PriceFrame::new(dates, assets, columns)?;
        debug!(
            "Loaded {} rows for assets {:?}",
            frame.len(),
            frame.assets()
        );

        Ok(frame)
    }

    /// Detect the time column in a DataFrame
    fn detect_time_column(df: &DataFrame) -> Result<String> {
        for name in df.get_column_names() {
            let lower_name = name.to_lowercase();
            if lower_name.contains("date") || lower_name.contains("time") {
                return Ok(name.to_string());
            }
        }

        // Fall back to a temporal first column
        if let Some(first_col) = df.get_columns().first() {
            if first_col.dtype().is_temporal() {
                return Ok(first_col.name().to_string());
            }
        }

        Err(ForecastError::Data(
            "No time column found in data".to_string(),
        ))
    }

    fn parse_dates(series: &Series) -> Result<Vec<NaiveDate>> {
        let text = series.cast(&DataType::Utf8)?;
        let mut dates = Vec::with_capacity(text.len());

        for value in text.utf8()?.into_iter() {
            let value = value.ok_or_else(|| {
                ForecastError::Data(format!("Missing value in time column {}", series.name()))
            })?;
            dates.push(parse_date(value)?);
        }

        Ok(dates)
    }

    fn column_as_prices(series: &Series) -> Result<Vec<Option<f64>>> {
        let values = series.cast(&DataType::Float64)?;
        Ok(values
            .f64()?
            .into_iter()
            .map(|v| v.filter(|p| !p.is_nan()))
            .collect())
    }
}

/// Parse `YYYY-MM-DD`, ignoring any time-of-day suffix
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    let trimmed = value.trim();
    let day = trimmed.get(..10).unwrap_or(trimmed);

    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .map_err(|e| ForecastError::Data(format!("Invalid date '{}': {}", value, e)))
}
