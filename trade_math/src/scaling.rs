//! Feature scaling for sequence models

use crate::{MathError, Result};
use serde::{Deserialize, Serialize};

/// Min-max scaler mapping the fitted range onto `[0, 1]`
///
/// Fit once on training data and reuse; values outside the fitted range map
/// outside `[0, 1]` rather than being clipped. A zero-width range scales by 1,
/// matching the usual convention for constant features.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MinMaxScaler {
    min: f64,
    max: f64,
}

impl MinMaxScaler {
    /// Fit the scaler to the range of `values`
    pub fn fit(values: &[f64]) -> Result<Self> {
        if values.is_empty() {
            return Err(MathError::InsufficientData(
                "Cannot fit a scaler on an empty series".to_string(),
            ));
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(MathError::InvalidInput(
                "Scaler input contains non-finite values".to_string(),
            ));
        }

        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        Ok(Self { min, max })
    }

    /// Lower bound of the fitted range
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Upper bound of the fitted range
    pub fn max(&self) -> f64 {
        self.max
    }

    fn range(&self) -> f64 {
        let range = self.max - self.min;
        if range == 0.0 {
            1.0
        } else {
            range
        }
    }

    /// Scale a single value
    pub fn transform(&self, value: f64) -> f64 {
        (value - self.min) / self.range()
    }

    /// Undo [`MinMaxScaler::transform`]
    pub fn inverse_transform(&self, scaled: f64) -> f64 {
        scaled * self.range() + self.min
    }

    /// Scale every value of a slice
    pub fn transform_all(&self, values: &[f64]) -> Vec<f64> {
        values.iter().map(|&v| self.transform(v)).collect()
    }
}
