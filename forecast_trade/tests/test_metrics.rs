use assert_approx_eq::assert_approx_eq;
use forecast_trade::metrics::{evaluate, select_best, ErrorMetrics, ModelComparison, ModelScore};
use forecast_trade::{ForecastError, ModelKind};
use rstest::rstest;

fn score(kind: ModelKind, rmse: f64, mape: f64) -> ModelScore {
    ModelScore {
        kind,
        name: kind.to_string(),
        metrics: ErrorMetrics {
            mae: 0.0,
            rmse,
            mape,
        },
    }
}

#[test]
fn test_regression_metrics() {
    let actual = vec![10.0, 20.0, 30.0, 40.0, 50.0];
    let predicted = vec![12.0, 18.0, 33.0, 37.0, 52.0];

    let metrics = evaluate(&actual, &predicted).unwrap();

    assert_approx_eq!(metrics.mae, 2.4, 1e-9);
    assert_approx_eq!(metrics.rmse, (30.0_f64 / 5.0).sqrt(), 1e-9);
    // 20% + 10% + 10% + 7.5% + 4% over 5
    assert_approx_eq!(metrics.mape, 10.3, 1e-9);
}

#[test]
fn test_exact_forecast_has_zero_error() {
    let actual = vec![101.5, 99.25, 100.0];
    let metrics = evaluate(&actual, &actual).unwrap();
    assert_eq!(metrics.rmse, 0.0);
    assert_eq!(metrics.mae, 0.0);
    assert_eq!(metrics.mape, 0.0);
}

#[rstest]
#[case(vec![1.0, 2.0, 3.0], vec![1.0, 2.0, 3.5])]
#[case(vec![100.0], vec![99.0])]
#[case(vec![5.0, 5.0], vec![-5.0, 15.0])]
fn test_rmse_positive_when_inexact(#[case] actual: Vec<f64>, #[case] predicted: Vec<f64>) {
    let metrics = evaluate(&actual, &predicted).unwrap();
    assert!(metrics.rmse > 0.0);
    assert!(metrics.rmse >= metrics.mae);
}

#[test]
fn test_error_handling() {
    assert!(matches!(
        evaluate(&[1.0, 2.0], &[1.0]),
        Err(ForecastError::LengthMismatch {
            expected: 2,
            actual: 1
        })
    ));
    assert!(matches!(evaluate(&[], &[]), Err(ForecastError::Data(_))));
    assert!(matches!(
        evaluate(&[0.0, 1.0], &[0.5, 1.0]),
        Err(ForecastError::Data(_))
    ));
}

#[test]
fn test_select_best_prefers_lower_rmse() {
    let scores = vec![
        score(ModelKind::Statistical, 9.12, 6.8),
        score(ModelKind::Sequence, 6.38, 4.9),
    ];
    assert_eq!(select_best(&scores).unwrap().kind, ModelKind::Sequence);
}

#[test]
fn test_select_best_breaks_ties_on_mape() {
    let scores = vec![
        score(ModelKind::Statistical, 5.0, 3.0),
        score(ModelKind::Sequence, 5.0, 2.0),
    ];
    assert_eq!(select_best(&scores).unwrap().kind, ModelKind::Sequence);

    // Full tie keeps the first entry
    let scores = vec![
        score(ModelKind::Statistical, 5.0, 2.0),
        score(ModelKind::Sequence, 5.0, 2.0),
    ];
    assert_eq!(select_best(&scores).unwrap().kind, ModelKind::Statistical);

    assert!(select_best(&[]).is_none());
}

#[test]
fn test_model_comparison() {
    let comparison = ModelComparison::from_scores(vec![
        score(ModelKind::Statistical, 3.0, 1.0),
        score(ModelKind::Sequence, 4.0, 0.5),
    ])
    .unwrap();

    assert_eq!(comparison.best, ModelKind::Statistical);
    assert_eq!(comparison.best_score().unwrap().metrics.rmse, 3.0);
    assert!(ModelComparison::from_scores(vec![]).is_err());
}
