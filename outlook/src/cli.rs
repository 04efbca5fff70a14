//! Command-line interface for the outlook pipeline.

use crate::config::OutlookConfig;
use crate::error::{OutlookError, Result};
use crate::pipeline::Pipeline;
use crate::service::OutlookService;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Outlook - price forecasting and portfolio backtest.
#[derive(Parser)]
#[command(name = "outlook")]
#[command(version)]
#[command(about = "Forecast an asset with ARIMA and LSTM and backtest a fixed allocation")]
#[command(long_about = None)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Path to TOML configuration file; defaults apply when omitted
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full pipeline and persist its artifacts
    Run,

    /// Show the persisted forecast with its confidence band
    Forecast {
        /// Number of business days to show
        #[arg(short = 'H', long, default_value = "252")]
        horizon: usize,
    },

    /// Show test-period metrics of both models
    Compare,

    /// Show strategy and benchmark backtest results
    Backtest,

    /// Show the forecast summary
    Summary,

    /// Show the strategy weights
    Weights,

    /// Show daily returns of one asset
    Returns {
        #[arg(short, long, default_value = "TSLA")]
        asset: String,
    },

    /// Generate an example configuration file
    Init {
        /// Output path for config file
        #[arg(short, long, default_value = "outlook.toml")]
        output: PathBuf,
    },
}

impl Cli {
    /// Initialize logging based on verbosity level.
    pub fn init_logging(&self) {
        let level = match self.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        };

        let subscriber = FmtSubscriber::builder()
            .with_max_level(level)
            .with_target(false)
            .finish();

        if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
            eprintln!("Failed to set tracing subscriber: {}", e);
        }
    }

    fn load_config(&self) -> Result<OutlookConfig> {
        match &self.config {
            Some(path) => OutlookConfig::load(path),
            None => Ok(OutlookConfig::default()),
        }
    }
}

/// Serve a forecast together with its band
#[derive(Serialize)]
struct ForecastView {
    forecast: forecast_trade::models::Forecast,
    band: forecast_trade::uncertainty::ConfidenceBand,
}

/// Run the CLI application.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    cli.init_logging();

    if let Commands::Init { output } = &cli.command {
        return init_config(output);
    }

    let config = cli.load_config()?;
    let service = OutlookService::new(config.clone());

    match &cli.command {
        Commands::Run => {
            let report = Pipeline::new(config).run()?;
            println!("Selected model: {}", report.forecast.comparison.best);
            println!("Backtest: {}", report.backtest.verdict.description());
            for path in &report.written {
                println!("  Saved: {}", path.display());
            }
            Ok(())
        }
        Commands::Forecast { horizon } => print_json(&ForecastView {
            forecast: service.get_forecast(*horizon)?,
            band: service.get_confidence_band(*horizon)?,
        }),
        Commands::Compare => print_json(&service.get_model_comparison()?),
        Commands::Backtest => print_json(&service.get_backtest_result()?),
        Commands::Summary => print_json(&service.get_forecast_summary()?),
        Commands::Weights => print_json(&service.get_strategy_weights()?),
        Commands::Returns { asset } => print_json(&service.get_returns(asset)?),
        Commands::Init { output } => init_config(output),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn init_config(output: &PathBuf) -> Result<()> {
    if output.exists() {
        return Err(OutlookError::Config(format!(
            "{} already exists",
            output.display()
        )));
    }

    fs::write(output, OutlookConfig::example())?;
    info!("Wrote example configuration to {}", output.display());
    println!("Created example configuration file: {}", output.display());
    println!("\nEdit this file, then run:");
    println!("  outlook -c {} run", output.display());
    Ok(())
}
