use forecast_trade::metrics::evaluate_model;
use forecast_trade::models::{ArimaConfig, AutoArima, ForecastModel, TrainedForecastModel};
use forecast_trade::split::split_ratio;
use forecast_trade::uncertainty::{UncertaintyConfig, UncertaintyProjector};
use portfolio_trade::utils::generate_test_series;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Forecast Trade: Basic Forecasting Example");
    println!("=========================================\n");

    // Create sample data
    println!("Creating sample data...");
    let series = generate_test_series("TSLA", 250.0, 0.03, 500, 42)?;
    println!(
        "Sample data created: {} daily prices from {} to {}\n",
        series.len(),
        series.first_date(),
        series.last_date()
    );

    // Hold out the last 20% for evaluation
    let split = split_ratio(&series, 0.2)?;
    println!(
        "Training on {} prices, testing on {} (cut at {})",
        split.train.len(),
        split.test.len(),
        split.cut_date
    );

    println!("Searching ARIMA orders...");
    let model = AutoArima::new(ArimaConfig::default()).train(&split.train)?;
    println!("Selected {}\n", model.name());

    let score = evaluate_model(&model, &split)?;
    println!("Test period accuracy: {}\n", score.metrics);

    // Refit on the full history and look ahead 30 business days
    let model = AutoArima::new(ArimaConfig::default()).train(&series)?;
    let forecast = model.forecast_future(&series, 30)?;

    let projector = UncertaintyProjector::new(UncertaintyConfig::from_confidence(0.95)?);
    let band = projector.project(&series, &forecast)?;

    println!("Forecast with 95% band (every 5th day):");
    for (i, point) in forecast.points().iter().enumerate() {
        if i % 5 == 0 {
            println!(
                "  {}: {:.2} ({:.2}, {:.2})",
                point.date, point.value, band.lower[i], band.upper[i]
            );
        }
    }

    Ok(())
}
