//! Utility functions and helpers
//!
//! Business-day calendar arithmetic, parameter validation, and seeded
//! synthetic price data for tests and demos.

use crate::{PortfolioError, PriceFrame, PriceSeries, Result};
use chrono::{Datelike, Days, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

/// Monday through Friday
pub fn is_business_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// First business day strictly after `date`
pub fn next_business_day(date: NaiveDate) -> Option<NaiveDate> {
    let mut day = date.checked_add_days(Days::new(1))?;
    while !is_business_day(day) {
        day = day.checked_add_days(Days::new(1))?;
    }
    Some(day)
}

/// The `count` business days following `date`
pub fn business_days_after(date: NaiveDate, count: usize) -> Result<Vec<NaiveDate>> {
    let mut days = Vec::with_capacity(count);
    let mut current = date;

    for _ in 0..count {
        current = next_business_day(current).ok_or_else(|| {
            PortfolioError::InvalidData(format!("Calendar overflow after {}", current))
        })?;
        days.push(current);
    }

    Ok(days)
}

/// Validate a floating-point parameter is positive
pub fn validate_positive(value: f64, name: &str) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(PortfolioError::InvalidData(format!(
            "{} must be positive",
            name
        )));
    }
    Ok(())
}

/// Validate a value is within a range
pub fn validate_range(value: f64, min: f64, max: f64, name: &str) -> Result<()> {
    if !(min..=max).contains(&value) {
        return Err(PortfolioError::InvalidData(format!(
            "{} must be between {} and {}",
            name, min, max
        )));
    }
    Ok(())
}

/// Generate a geometric random walk on business days starting 2023-01-02
///
/// # Arguments
/// * `asset` - Asset identifier
/// * `starting_price` - Price of the first observation
/// * `volatility` - Standard deviation of the daily return
/// * `days` - Number of observations
/// * `seed` - RNG seed; equal seeds give equal series
pub fn generate_test_series(
    asset: &str,
    starting_price: f64,
    volatility: f64,
    days: usize,
    seed: u64,
) -> Result<PriceSeries> {
    let mut rng = StdRng::seed_from_u64(seed);
    let prices = random_walk(&mut rng, starting_price, volatility, days)?;
    PriceSeries::new(asset, test_dates(days)?, prices)
}

/// Generate a frame of independent random walks sharing one date index
///
/// Each entry is `(asset, starting_price, volatility)`.
pub fn generate_test_frame(
    assets: &[(&str, f64, f64)],
    days: usize,
    seed: u64,
) -> Result<PriceFrame> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut columns = Vec::with_capacity(assets.len());

    for &(_, starting_price, volatility) in assets {
        let prices = random_walk(&mut rng, starting_price, volatility, days)?;
        columns.push(prices.into_iter().map(Some).collect());
    }

    PriceFrame::new(
        test_dates(days)?,
        assets.iter().map(|(asset, _, _)| asset.to_string()).collect(),
        columns,
    )
}

fn test_dates(days: usize) -> Result<Vec<NaiveDate>> {
    let Some(start) = NaiveDate::from_ymd_opt(2023, 1, 2) else {
        return Err(PortfolioError::InvalidData("Invalid start date".to_string()));
    };
    let mut dates = vec![start];
    dates.extend(business_days_after(start, days.saturating_sub(1))?);
    dates.truncate(days);
    Ok(dates)
}

fn random_walk(
    rng: &mut StdRng,
    starting_price: f64,
    volatility: f64,
    days: usize,
) -> Result<Vec<f64>> {
    validate_positive(starting_price, "Starting price")?;
    let normal = Normal::new(0.0, volatility)
        .map_err(|e| PortfolioError::InvalidData(format!("Invalid volatility: {}", e)))?;

    let mut prices = Vec::with_capacity(days);
    let mut current = starting_price;
    for _ in 0..days {
        prices.push(current);
        // Floor the step so a long negative run cannot reach zero
        let step: f64 = normal.sample(rng);
        current *= (1.0 + step).max(0.01);
    }

    Ok(prices)
}
