//! Metrics for evaluating forecast performance
//!
//! Scores predictions against actual prices and picks the better model: lower
//! RMSE wins, ties go to the lower MAPE.

use crate::error::{ForecastError, Result};
use crate::models::{ModelKind, TrainedForecastModel};
use crate::split::Split;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::info;

/// Forecast error metrics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ErrorMetrics {
    /// Mean Absolute Error
    pub mae: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// Mean Absolute Percentage Error, in percent
    pub mape: f64,
}

impl std::fmt::Display for ErrorMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "MAE {:.4}, RMSE {:.4}, MAPE {:.2}%",
            self.mae, self.rmse, self.mape
        )
    }
}

/// Score `predicted` against `actual`
pub fn evaluate(actual: &[f64], predicted: &[f64]) -> Result<ErrorMetrics> {
    if actual.len() != predicted.len() {
        return Err(ForecastError::LengthMismatch {
            expected: actual.len(),
            actual: predicted.len(),
        });
    }
    if actual.is_empty() {
        return Err(ForecastError::Data(
            "Cannot evaluate an empty forecast".to_string(),
        ));
    }
    if actual.iter().any(|a| *a == 0.0) {
        return Err(ForecastError::Data(
            "MAPE is undefined when an actual value is zero".to_string(),
        ));
    }

    let n = actual.len() as f64;
    let mut abs_sum = 0.0;
    let mut sq_sum = 0.0;
    let mut pct_sum = 0.0;

    for (a, p) in actual.iter().zip(predicted) {
        let err = a - p;
        abs_sum += err.abs();
        sq_sum += err * err;
        pct_sum += (err / a).abs();
    }

    Ok(ErrorMetrics {
        mae: abs_sum / n,
        rmse: (sq_sum / n).sqrt(),
        mape: pct_sum / n * 100.0,
    })
}

/// Scores of one trained model on the test period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelScore {
    pub kind: ModelKind,
    pub name: String,
    pub metrics: ErrorMetrics,
}

/// Ordering where the better score sorts first
fn score_order(a: &ErrorMetrics, b: &ErrorMetrics) -> Ordering {
    a.rmse
        .total_cmp(&b.rmse)
        .then_with(|| a.mape.total_cmp(&b.mape))
}

/// The best score: lowest RMSE, then lowest MAPE, then earliest
pub fn select_best(scores: &[ModelScore]) -> Option<&ModelScore> {
    scores.iter().reduce(|best, candidate| {
        if score_order(&candidate.metrics, &best.metrics) == Ordering::Less {
            candidate
        } else {
            best
        }
    })
}

/// Per-model scores and the selected model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelComparison {
    pub scores: Vec<ModelScore>,
    pub best: ModelKind,
}

impl ModelComparison {
    /// Build from scores; fails when `scores` is empty
    pub fn from_scores(scores: Vec<ModelScore>) -> Result<Self> {
        let best = select_best(&scores)
            .map(|s| s.kind)
            .ok_or_else(|| ForecastError::Data("No model scores to compare".to_string()))?;

        Ok(Self { scores, best })
    }

    pub fn score(&self, kind: ModelKind) -> Option<&ModelScore> {
        self.scores.iter().find(|s| s.kind == kind)
    }

    pub fn best_score(&self) -> Option<&ModelScore> {
        self.score(self.best)
    }
}

/// Run a trained model over the test period and score it
pub fn evaluate_model<M: TrainedForecastModel + ?Sized>(
    model: &M,
    split: &Split,
) -> Result<ModelScore> {
    let predicted = model.predict_test(split)?;
    let metrics = evaluate(split.test.prices(), &predicted)?;

    info!("{} on test period: {}", model.name(), metrics);

    Ok(ModelScore {
        kind: model.kind(),
        name: model.name(),
        metrics,
    })
}

/// Score every model on the same split and select the best
pub fn compare_models(
    models: &[&dyn TrainedForecastModel],
    split: &Split,
) -> Result<ModelComparison> {
    let scores = models
        .iter()
        .map(|m| evaluate_model(*m, split))
        .collect::<Result<Vec<_>>>()?;

    ModelComparison::from_scores(scores)
}
