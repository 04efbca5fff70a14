use forecast_trade::metrics::compare_models;
use forecast_trade::models::{
    ArimaConfig, AutoArima, ForecastModel, LstmConfig, LstmRegressor, TrainedForecastModel,
};
use forecast_trade::split::split_ratio;
use forecast_trade::uncertainty::{ForecastSummary, UncertaintyProjector};
use portfolio_trade::backtest::BacktestWindow;
use portfolio_trade::utils::generate_test_frame;
use portfolio_trade::{BacktestSimulator, WeightVector};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Forecast Trade: Forecast and Backtest Example");
    println!("=============================================\n");

    let frame = generate_test_frame(
        &[("TSLA", 250.0, 0.035), ("BND", 72.0, 0.003), ("SPY", 450.0, 0.01)],
        400,
        7,
    )?;
    let series = frame.series("TSLA")?;
    let split = split_ratio(&series, 0.2)?;

    // 1. Train both models on the training period
    println!("Training models on {} prices...", split.train.len());
    let arima = AutoArima::new(ArimaConfig {
        max_p: 3,
        max_q: 3,
        ..ArimaConfig::default()
    })
    .train(&split.train)?;
    let lstm = LstmRegressor::new(LstmConfig {
        window: 30,
        hidden_size: 16,
        epochs: 10,
        seed: Some(42),
        ..LstmConfig::default()
    })
    .train(&split.train)?;

    // 2. Compare on the test period
    let comparison = compare_models(&[&arima as &dyn TrainedForecastModel, &lstm], &split)?;
    for score in &comparison.scores {
        println!("  {:<24} {}", score.name, score.metrics);
    }
    println!("Best model: {}\n", comparison.best);

    // 3. Forecast the next year with the winner
    let winner: &dyn TrainedForecastModel = match comparison.best {
        forecast_trade::ModelKind::Statistical => &arima,
        forecast_trade::ModelKind::Sequence => &lstm,
    };
    let forecast = winner.forecast_future(&series, 252)?;
    let projector = UncertaintyProjector::default();
    let band = projector.project(&series, &forecast)?;
    let summary = ForecastSummary::new(&series, &forecast, &band, &projector)?;

    println!("Current price: {:.2}", summary.current_price);
    if let Some(target) = summary.six_month {
        println!(
            "6-month target: {:.2} ({:+.1}%, band ±{:.1}%)",
            target.price, target.change_pct, target.band_pct
        );
    }
    if let Some(target) = summary.twelve_month {
        println!(
            "12-month target: {:.2} ({:+.1}%, band ±{:.1}%)",
            target.price, target.change_pct, target.band_pct
        );
    }
    println!("Trend: {:?}\n", summary.trend);

    // 4. Backtest a fixed allocation against 60/40
    let dates = frame.dates();
    let window = BacktestWindow::new(dates[dates.len() - 252], dates[dates.len() - 1]);
    let strategy = WeightVector::from_pairs([("TSLA", 0.25), ("BND", 0.35), ("SPY", 0.40)])?;
    let benchmark = WeightVector::sixty_forty("SPY", "BND");

    let result = BacktestSimulator::default().compare(&frame, &window, &strategy, &benchmark)?;
    println!(
        "Strategy:  {:+.2}% (Sharpe {:.2})",
        result.strategy.total_return_pct, result.strategy.sharpe_ratio
    );
    println!(
        "Benchmark: {:+.2}% (Sharpe {:.2})",
        result.benchmark.total_return_pct, result.benchmark.sharpe_ratio
    );
    println!("{}", result.verdict.description());

    Ok(())
}
