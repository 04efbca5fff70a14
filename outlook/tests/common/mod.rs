use chrono::NaiveDate;
use forecast_trade::models::{ArimaConfig, LstmConfig};
use outlook::OutlookConfig;
use portfolio_trade::utils::generate_test_frame;
use portfolio_trade::WeightVector;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Write 200 business days of TSLA, BND and SPY prices starting 2023-01-02
pub fn write_prices(path: &Path) {
    let frame = generate_test_frame(
        &[("TSLA", 250.0, 0.035), ("BND", 72.0, 0.003), ("SPY", 450.0, 0.01)],
        200,
        17,
    )
    .unwrap();

    let mut file = File::create(path).unwrap();
    writeln!(file, "date,{}", frame.assets().join(",")).unwrap();
    for (i, date) in frame.dates().iter().enumerate() {
        let row: Vec<String> = frame
            .assets()
            .iter()
            .map(|asset| frame.column(asset).unwrap()[i].unwrap().to_string())
            .collect();
        writeln!(file, "{},{}", date, row.join(",")).unwrap();
    }
}

/// A small, fast configuration rooted in `dir`
pub fn test_config(dir: &Path) -> OutlookConfig {
    let prices = dir.join("prices.csv");
    write_prices(&prices);

    let mut config = OutlookConfig::default();
    config.data.prices = prices;
    config.data.weights = dir.join("weights.json");
    config.data.artifacts = dir.join("artifacts");
    config.forecast.horizon = 60;
    config.arima = ArimaConfig {
        max_p: 2,
        max_q: 2,
        ..ArimaConfig::default()
    };
    config.lstm = LstmConfig {
        window: 10,
        hidden_size: 4,
        epochs: 3,
        batch_size: 16,
        learning_rate: 0.01,
        seed: Some(7),
        ..LstmConfig::default()
    };
    config.backtest.start = NaiveDate::from_ymd_opt(2023, 6, 1).unwrap();
    config.backtest.end = NaiveDate::from_ymd_opt(2023, 8, 31).unwrap();
    config.backtest.strategy =
        Some(WeightVector::from_pairs([("TSLA", 0.27), ("BND", 0.48), ("SPY", 0.25)]).unwrap());
    config
}
