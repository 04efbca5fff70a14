use assert_approx_eq::assert_approx_eq;
use chrono::NaiveDate;
use forecast_trade::models::{
    ArimaConfig, AutoArima, ForecastMode, ForecastModel, LstmConfig, LstmRegressor,
    TrainedForecastModel, TrainedModel,
};
use forecast_trade::split::split_ratio;
use forecast_trade::{ForecastError, ModelKind};
use portfolio_trade::utils::{business_days_after, generate_test_series};
use portfolio_trade::PriceSeries;

fn series_from(prices: Vec<f64>) -> PriceSeries {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let dates = business_days_after(start, prices.len()).unwrap();
    PriceSeries::new("TEST", dates, prices).unwrap()
}

fn sine_series(len: usize) -> PriceSeries {
    series_from(
        (0..len)
            .map(|i| 100.0 + 10.0 * (i as f64 * 0.3).sin())
            .collect(),
    )
}

fn small_lstm(seed: u64) -> LstmRegressor {
    LstmRegressor::new(LstmConfig {
        window: 8,
        hidden_size: 6,
        epochs: 40,
        batch_size: 16,
        learning_rate: 0.01,
        gradient_clip: 1.0,
        seed: Some(seed),
    })
}

#[test]
fn test_arima_constant_series() {
    let series = series_from(vec![50.0; 20]);
    let model = AutoArima::default().train(&series).unwrap();

    assert_eq!(model.order().d, 0);
    let forecast = model.forecast(5).unwrap();
    assert_eq!(forecast.len(), 5);
    for value in forecast {
        assert_approx_eq!(value, 50.0, 1e-6);
    }
}

#[test]
fn test_arima_linear_trend() {
    let series = series_from((0..40).map(|i| 100.0 + i as f64).collect());
    let model = AutoArima::default().train(&series).unwrap();

    assert_eq!(model.order().d, 1);
    let forecast = model.forecast(3).unwrap();
    assert_approx_eq!(forecast[0], 140.0, 1e-6);
    assert_approx_eq!(forecast[1], 141.0, 1e-6);
    assert_approx_eq!(forecast[2], 142.0, 1e-6);
}

#[test]
fn test_arima_random_walk_forecast() {
    let series = generate_test_series("TSLA", 200.0, 0.02, 200, 7).unwrap();
    let model = AutoArima::new(ArimaConfig {
        max_p: 2,
        max_q: 2,
        ..ArimaConfig::default()
    })
    .train(&series)
    .unwrap();

    let forecast = model.forecast_future(&series, 30).unwrap();
    assert_eq!(forecast.horizon(), 30);
    assert_eq!(forecast.asset(), "TSLA");
    assert!(forecast.values().iter().all(|v| v.is_finite()));
    assert!(forecast.dates()[0] > series.last_date());
    assert_eq!(model.kind(), ModelKind::Statistical);
    assert!(model.name().starts_with("ARIMA("));
}

#[test]
fn test_arima_error_handling() {
    let series = series_from(vec![10.0, 11.0]);
    assert!(matches!(
        AutoArima::default().train(&series),
        Err(ForecastError::Fit(_))
    ));

    let series = series_from(vec![50.0; 20]);
    let model = AutoArima::default().train(&series).unwrap();
    assert!(matches!(model.forecast(0), Err(ForecastError::Forecast(_))));
    assert!(model.forecast_future(&series, 0).is_err());
}

#[test]
fn test_lstm_training_is_deterministic_with_seed() {
    let series = sine_series(80);
    let first = small_lstm(42).train(&series).unwrap();
    let second = small_lstm(42).train(&series).unwrap();

    assert_eq!(first.loss_history(), second.loss_history());
    assert_eq!(
        first.forecast_future(&series, 10).unwrap(),
        second.forecast_future(&series, 10).unwrap()
    );
}

#[test]
fn test_lstm_loss_decreases() {
    let series = sine_series(120);
    let model = small_lstm(3).train(&series).unwrap();

    let losses = model.loss_history();
    assert_eq!(losses.len(), 40);
    assert!(losses.last().unwrap() < losses.first().unwrap());
}

#[test]
fn test_lstm_recursive_forecast() {
    let series = sine_series(80);
    let model = small_lstm(11).train(&series).unwrap();

    let forecast = model.forecast_future(&series, 25).unwrap();
    assert_eq!(forecast.horizon(), 25);
    assert!(forecast.values().iter().all(|v| v.is_finite()));

    // Forecasting does not change the model
    let again = model.forecast_future(&series, 25).unwrap();
    assert_eq!(forecast, again);

    // A shorter horizon is a prefix of a longer one
    let short = model
        .forecast(series.prices(), 5, ForecastMode::Recursive)
        .unwrap();
    assert_eq!(short[..], forecast.values()[..5]);
}

#[test]
fn test_lstm_direct_predictions_on_test_split() {
    let series = sine_series(100);
    let split = split_ratio(&series, 0.2).unwrap();
    let model = small_lstm(5).train(&split.train).unwrap();

    let predictions = model.predict_test(&split).unwrap();
    assert_eq!(predictions.len(), split.test.len());
    assert!(predictions.iter().all(|v| v.is_finite()));

    // The scaler only saw training prices
    let train_max = split
        .train
        .prices()
        .iter()
        .cloned()
        .fold(f64::MIN, f64::max);
    assert_eq!(model.scaler().max(), train_max);
}

#[test]
fn test_lstm_error_handling() {
    let series = sine_series(8);
    assert!(matches!(
        small_lstm(1).train(&series),
        Err(ForecastError::InsufficientHistory {
            required: 9,
            available: 8
        })
    ));

    let series = sine_series(60);
    let model = small_lstm(1).train(&series).unwrap();
    assert!(matches!(
        model.forecast(series.prices(), 0, ForecastMode::Recursive),
        Err(ForecastError::Forecast(_))
    ));
    assert!(matches!(
        model.forecast(&series.prices()[..5], 3, ForecastMode::Recursive),
        Err(ForecastError::InsufficientHistory { .. })
    ));
    assert!(matches!(
        model.forecast(&series.prices()[..10], 3, ForecastMode::Direct),
        Err(ForecastError::InsufficientHistory {
            required: 11,
            available: 10
        })
    ));

    let invalid = LstmRegressor::new(LstmConfig {
        learning_rate: 0.0,
        ..LstmConfig::default()
    });
    assert!(matches!(
        invalid.train(&sine_series(100)),
        Err(ForecastError::InvalidParameter(_))
    ));
}

#[test]
fn test_trained_model_serialization() {
    let series = sine_series(80);
    let lstm: TrainedModel = small_lstm(9).train(&series).unwrap().into();
    let arima: TrainedModel = AutoArima::default().train(&series).unwrap().into();

    for model in [lstm, arima] {
        let json = serde_json::to_string(&model).unwrap();
        let restored: TrainedModel = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.kind(), model.kind());
        assert_eq!(
            restored.forecast_future(&series, 10).unwrap(),
            model.forecast_future(&series, 10).unwrap()
        );
    }
}
