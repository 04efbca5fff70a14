mod common;

use common::test_config;
use forecast_trade::persistence::{model_file, COMPARISON_FILE, FORECAST_CSV_FILE, FORECAST_FILE};
use forecast_trade::{ModelKind, TrainedForecastModel};
use outlook::{OutlookConfig, OutlookError, Pipeline};
use pretty_assertions::assert_eq;

#[test]
fn test_run_persists_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let report = Pipeline::new(config.clone()).run().unwrap();

    let forecast = &report.forecast;
    assert_eq!(forecast.split.train.len() + forecast.split.test.len(), 200);
    assert_eq!(forecast.models.len(), 2);
    assert_eq!(forecast.comparison.scores.len(), 2);
    assert_eq!(forecast.artifact.forecast.horizon(), 60);
    assert_eq!(forecast.artifact.band.len(), 60);
    assert!(forecast.artifact.forecast.dates()[0] > forecast.split.test.last_date());
    assert_eq!(
        forecast.selected().unwrap().kind(),
        forecast.comparison.best
    );

    let artifacts = &config.data.artifacts;
    for name in [
        model_file(ModelKind::Statistical),
        model_file(ModelKind::Sequence),
        COMPARISON_FILE,
        FORECAST_FILE,
        FORECAST_CSV_FILE,
    ] {
        assert!(artifacts.join(name).is_file(), "missing {}", name);
    }
    assert_eq!(report.written.len(), 8);
}

#[test]
fn test_backtest_uses_inline_weights() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let pipeline = Pipeline::new(config);

    let frame = forecast_trade::DataLoader::from_csv(&pipeline.config().data.prices).unwrap();
    let comparison = pipeline.backtest(&frame).unwrap();

    assert_eq!(comparison.strategy.label, "strategy");
    assert_eq!(comparison.benchmark.label, "benchmark");
    assert_eq!(
        comparison.strategy.cumulative.len(),
        comparison.benchmark.cumulative.len()
    );
}

#[test]
fn test_weights_file() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path());
    config.backtest.strategy = None;

    let missing = Pipeline::new(config.clone()).strategy_weights().unwrap_err();
    assert!(missing.is_unavailable());

    std::fs::write(
        &config.data.weights,
        r#"{"TSLA": 0.27, "BND": 0.48, "SPY": 0.25}"#,
    )
    .unwrap();
    let weights = Pipeline::new(config).strategy_weights().unwrap();
    assert_eq!(weights.weight("BND"), 0.48);
}

#[test]
fn test_missing_prices() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = OutlookConfig::default();
    config.data.prices = dir.path().join("absent.csv");

    let error = Pipeline::new(config).run().unwrap_err();
    assert!(error.is_unavailable());
}

#[test]
fn test_empty_backtest_window() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path());
    config.backtest.start = chrono::NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();
    config.backtest.end = chrono::NaiveDate::from_ymd_opt(2030, 12, 31).unwrap();

    let error = Pipeline::new(config).run().unwrap_err();
    assert!(matches!(
        error,
        OutlookError::Portfolio(portfolio_trade::PortfolioError::EmptyWindow(_))
    ));
}

#[test]
fn test_config_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let path = dir.path().join("outlook.toml");

    config.save(&path).unwrap();
    assert_eq!(OutlookConfig::load(&path).unwrap(), config);
}
