use forecast_trade::metrics::compare_models;
use forecast_trade::models::{
    ArimaConfig, AutoArima, ForecastModel, LstmConfig, LstmRegressor, TrainedForecastModel,
    TrainedModel,
};
use forecast_trade::persistence::{read_forecast_csv, ArtifactStore, ForecastArtifact};
use forecast_trade::split::split_ratio;
use forecast_trade::uncertainty::{ForecastSummary, UncertaintyProjector};
use forecast_trade::volatility::{RiskConfig, RiskProfile};
use forecast_trade::{DataLoader, ForecastError, ModelKind};
use portfolio_trade::backtest::BacktestWindow;
use portfolio_trade::utils::generate_test_frame;
use portfolio_trade::{BacktestSimulator, PriceFrame, WeightVector};
use std::io::Write;
use tempfile::NamedTempFile;

// Helper function to write a generated frame as a wide CSV file
fn create_sample_data() -> (PriceFrame, NamedTempFile) {
    let frame = generate_test_frame(
        &[("TSLA", 250.0, 0.035), ("BND", 72.0, 0.003), ("SPY", 450.0, 0.01)],
        160,
        21,
    )
    .unwrap();

    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "Date,{}", frame.assets().join(",")).unwrap();
    for (i, date) in frame.dates().iter().enumerate() {
        let row: Vec<String> = frame
            .assets()
            .iter()
            .map(|asset| format!("{}", frame.column(asset).unwrap()[i].unwrap()))
            .collect();
        writeln!(file, "{},{}", date.format("%Y-%m-%d"), row.join(",")).unwrap();
    }

    (frame, file)
}

#[test]
fn test_full_forecast_workflow() {
    // 1. Create sample data file
    let (generated, data_file) = create_sample_data();

    // 2. Load data
    let frame = DataLoader::from_csv(data_file.path()).unwrap();
    assert_eq!(frame.len(), generated.len());
    let series = frame.series("TSLA").unwrap();

    // 3. Split chronologically
    let split = split_ratio(&series, 0.2).unwrap();
    assert_eq!(split.train.len() + split.test.len(), series.len());

    // 4. Train both model families on the training period only
    let arima = AutoArima::new(ArimaConfig {
        max_p: 2,
        max_q: 2,
        ..ArimaConfig::default()
    })
    .train(&split.train)
    .unwrap();
    let lstm = LstmRegressor::new(LstmConfig {
        window: 10,
        hidden_size: 4,
        epochs: 5,
        batch_size: 16,
        learning_rate: 0.01,
        seed: Some(1),
        ..LstmConfig::default()
    })
    .train(&split.train)
    .unwrap();

    // 5. Compare on the test period
    let comparison = compare_models(&[&arima as &dyn TrainedForecastModel, &lstm], &split).unwrap();
    assert_eq!(comparison.scores.len(), 2);
    for score in &comparison.scores {
        assert!(score.metrics.rmse >= 0.0);
        assert!(score.metrics.mape >= 0.0);
    }

    // 6. Forecast the future with the selected model on the full history
    let best: TrainedModel = match comparison.best {
        ModelKind::Statistical => arima.into(),
        ModelKind::Sequence => lstm.into(),
    };
    let forecast = best.forecast_future(&series, 60).unwrap();
    assert_eq!(forecast.horizon(), 60);

    // 7. Uncertainty band and summary
    let projector = UncertaintyProjector::default();
    let band = projector.project(&series, &forecast).unwrap();
    let summary = ForecastSummary::new(&series, &forecast, &band, &projector).unwrap();
    assert_eq!(summary.end.step, 60);
    assert!(summary.six_month.is_none());

    // 8. Risk profile
    let risk = RiskProfile::from_series(&series, &RiskConfig::default()).unwrap();
    assert!(risk.daily_volatility > 0.0);

    // 9. Backtest over the last 60 rows
    let dates = frame.dates();
    let window = BacktestWindow::new(dates[dates.len() - 60], dates[dates.len() - 1]);
    let strategy = WeightVector::from_pairs([("TSLA", 0.3), ("BND", 0.3), ("SPY", 0.4)]).unwrap();
    let benchmark = WeightVector::sixty_forty("SPY", "BND");
    let backtest = BacktestSimulator::default()
        .compare(&frame, &window, &strategy, &benchmark)
        .unwrap();
    assert_eq!(backtest.strategy.cumulative.len(), 59);

    // 10. Persist and read back
    let dir = tempfile::tempdir().unwrap();
    let store = ArtifactStore::create(dir.path().join("artifacts")).unwrap();
    let artifact = ForecastArtifact::new(forecast.clone(), band.clone()).unwrap();

    store.save_model(&best).unwrap();
    store.save_forecast(&artifact).unwrap();
    store.save_summary(&summary).unwrap();
    store.save_comparison(&comparison).unwrap();
    store.save_backtest(&backtest).unwrap();
    store.save_risk(&risk).unwrap();

    assert_eq!(store.load_forecast().unwrap(), artifact);
    assert_eq!(store.load_comparison().unwrap(), comparison);
    assert_eq!(store.load_backtest().unwrap(), backtest);
    assert_eq!(store.load_summary().unwrap(), summary);

    let restored = store.load_model(best.kind()).unwrap();
    assert_eq!(
        restored.forecast_future(&series, 60).unwrap(),
        forecast
    );

    // 11. CSV export
    let path = store.export_forecast_csv(&artifact).unwrap();
    let rows = read_forecast_csv(path).unwrap();
    assert_eq!(rows.len(), 60);
    assert_eq!(rows[0].date, forecast.points()[0].date);
    assert_eq!(rows[0].forecast, forecast.points()[0].value);
    assert_eq!(rows[59].upper, band.upper[59]);
}

#[test]
fn test_missing_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let store = ArtifactStore::open(dir.path());

    assert!(matches!(
        store.load_forecast(),
        Err(ForecastError::DataUnavailable(_))
    ));
    assert!(matches!(
        store.load_model(ModelKind::Sequence),
        Err(ForecastError::DataUnavailable(_))
    ));
}

#[test]
fn test_mismatched_artifact_rejected() {
    let (_, data_file) = create_sample_data();
    let series = DataLoader::load_series(data_file.path(), "BND").unwrap();
    let model = AutoArima::new(ArimaConfig {
        max_p: 1,
        max_q: 1,
        ..ArimaConfig::default()
    })
    .train(&series)
    .unwrap();

    let forecast = model.forecast_future(&series, 10).unwrap();
    let band = UncertaintyProjector::default()
        .project(&series, &forecast.truncated(5).unwrap())
        .unwrap();

    assert!(matches!(
        ForecastArtifact::new(forecast, band),
        Err(ForecastError::LengthMismatch {
            expected: 10,
            actual: 5
        })
    ));
}
