//! Fixed portfolio weight vectors

use crate::{PortfolioError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Allowed distance of the weight sum from 1.0
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Mapping from asset to portfolio fraction
///
/// Weights are finite, non-negative and sum to 1.0 within
/// [`WEIGHT_SUM_TOLERANCE`]. Assets iterate in lexicographic order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, f64>", into = "BTreeMap<String, f64>")]
pub struct WeightVector {
    weights: BTreeMap<String, f64>,
}

impl WeightVector {
    /// Create a validated weight vector
    pub fn new(weights: BTreeMap<String, f64>) -> Result<Self> {
        if weights.is_empty() {
            return Err(PortfolioError::InvalidWeights(
                "Weight vector is empty".to_string(),
            ));
        }

        if let Some((asset, weight)) = weights
            .iter()
            .find(|(_, w)| !w.is_finite() || **w < 0.0)
        {
            return Err(PortfolioError::InvalidWeights(format!(
                "{} has invalid weight {}",
                asset, weight
            )));
        }

        let total: f64 = weights.values().sum();
        if (total - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(PortfolioError::InvalidWeights(format!(
                "Weights sum to {}, expected 1.0",
                total
            )));
        }

        Ok(Self { weights })
    }

    /// Create from `(asset, weight)` pairs; a repeated asset is rejected
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, f64)>) -> Result<Self> {
        let mut weights = BTreeMap::new();
        for (asset, weight) in pairs {
            if weights.insert(asset.to_string(), weight).is_some() {
                return Err(PortfolioError::InvalidWeights(format!(
                    "{} listed more than once",
                    asset
                )));
            }
        }
        Self::new(weights)
    }

    /// Load optimizer output of the form `{"TSLA": 0.27, "SPY": 0.73}`
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(PortfolioError::DataUnavailable(path.display().to_string()));
        }

        let content = std::fs::read_to_string(path)?;
        let weights: BTreeMap<String, f64> = serde_json::from_str(&content)?;
        Self::new(weights)
    }

    /// 60% equity, 40% bonds
    pub fn sixty_forty(equity: &str, bonds: &str) -> Self {
        let mut weights = BTreeMap::new();
        weights.insert(equity.to_string(), 0.6);
        weights.insert(bonds.to_string(), 0.4);
        Self { weights }
    }

    /// Weight of `asset`, 0.0 when absent
    pub fn weight(&self, asset: &str) -> f64 {
        self.weights.get(asset).copied().unwrap_or(0.0)
    }

    /// Assets carrying a positive weight
    pub fn active_assets(&self) -> impl Iterator<Item = &str> {
        self.weights
            .iter()
            .filter(|(_, w)| **w > 0.0)
            .map(|(a, _)| a.as_str())
    }

    /// All `(asset, weight)` entries, including zero weights
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.weights.iter().map(|(a, w)| (a.as_str(), *w))
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    /// Whether there are no entries
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}

impl TryFrom<BTreeMap<String, f64>> for WeightVector {
    type Error = PortfolioError;

    fn try_from(weights: BTreeMap<String, f64>) -> Result<Self> {
        Self::new(weights)
    }
}

impl From<WeightVector> for BTreeMap<String, f64> {
    fn from(vector: WeightVector) -> Self {
        vector.weights
    }
}
