//! CLI entry point for the flyability rater.
//!
//! Provides subcommands for fetching forecast data, running the LLM
//! evaluation, printing stored verdicts as a terminal ticker, and driving
//! the full scheduled pipeline.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use flyability_rater::config::Config;
use flyability_rater::evaluator::Evaluator;
use flyability_rater::fetch::BasicClient;
use flyability_rater::forecast::{self, ForecastFetcher};
use flyability_rater::llm::{EvaluationBatch, LlmClient};
use flyability_rater::notify::LogNotifier;
use flyability_rater::store::AvailabilityStore;
use flyability_rater::{pipeline, report};
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "flyability_rater")]
#[command(about = "LLM-based flyability rating for a paragliding launch site", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the weather forecast and store it as JSON
    Fetch {
        /// Output file (defaults to the project-local weather file)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Evaluate flyability for each forecast day via the LLM
    Evaluate {
        /// Completion model override
        #[arg(long)]
        model: Option<String>,

        /// Print the verdicts as JSON instead of the ticker
        #[arg(long)]
        json: bool,

        /// Show only one day (1-based)
        #[arg(long)]
        day: Option<usize>,

        /// Disable ANSI colors
        #[arg(long)]
        no_color: bool,
    },
    /// Print the stored evaluation, regenerating it if missing
    Report {
        /// Show only one day (1-based)
        #[arg(long)]
        day: Option<usize>,

        /// Disable ANSI colors
        #[arg(long)]
        no_color: bool,
    },
    /// Run the full pipeline: fetch, evaluate, notify
    Run,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/flyability_rater.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("flyability_rater.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse().unwrap()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse().unwrap()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    match cli.command {
        Commands::Fetch { output } => {
            let fetcher = forecast_fetcher(&config)?;
            let file = fetcher
                .fetch_for_location(&config.location)
                .await
                .context("weather fetch failed")?;
            let path = output.unwrap_or_else(|| config.paths.fallback_weather.clone());
            forecast::write_weather_file(&file, &path)?;
        }
        Commands::Evaluate {
            model,
            json,
            day,
            no_color,
        } => {
            let mut config = config;
            if let Some(model) = model {
                config.llm.model = model;
            }

            let fetcher = forecast_fetcher(&config)?;
            let store = AvailabilityStore::new(&config);
            let weather = store.weather(&fetcher).await?;

            let llm = LlmClient::new(
                BasicClient::new(config.llm.timeout)?,
                config.llm.clone(),
            )?;
            let evaluator =
                Evaluator::new(llm, &config, config.paths.fallback_evaluations.clone());
            let batch = evaluator.run(&weather, &LogNotifier).await;

            let selected = select_day(&batch, day)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&selected)?);
            } else {
                print_reports(&config, &selected, !no_color);
            }
        }
        Commands::Report { day, no_color } => {
            let store = AvailabilityStore::new(&config);
            let batch = store
                .evaluations(|| regenerate_evaluations(&config))
                .await?;
            info!(last_updated = %batch.last_updated, "Stored evaluation loaded");

            let selected = select_day(&batch, day)?;
            print_reports(&config, &selected, !no_color);
        }
        Commands::Run => {
            let fetcher = forecast_fetcher(&config)?;
            let llm = LlmClient::new(
                BasicClient::new(config.llm.timeout)?,
                config.llm.clone(),
            )?;
            let evaluator =
                Evaluator::new(llm, &config, config.paths.primary_evaluations.clone());

            let run_report = pipeline::run_full(&config, &fetcher, &evaluator, &LogNotifier).await;
            println!("{}", serde_json::to_string_pretty(&run_report)?);
            if !run_report.success {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

fn forecast_fetcher(config: &Config) -> Result<ForecastFetcher<BasicClient>> {
    let client = BasicClient::new(config.forecast.timeout)?;
    Ok(ForecastFetcher::new(client, config.forecast.clone()))
}

/// Regeneration hook for the evaluations read path: runs the full pipeline
/// so the next file read succeeds.
async fn regenerate_evaluations(config: &Config) -> Result<()> {
    let fetcher = forecast_fetcher(config)?;
    let llm = LlmClient::new(BasicClient::new(config.llm.timeout)?, config.llm.clone())?;
    let evaluator = Evaluator::new(llm, config, config.paths.primary_evaluations.clone());

    let run_report = pipeline::run_full(config, &fetcher, &evaluator, &LogNotifier).await;
    anyhow::ensure!(
        run_report.success,
        "regeneration failed: {}",
        run_report.errors.join("; ")
    );
    Ok(())
}

/// Narrows the batch to a single 1-based day when requested.
fn select_day(
    batch: &EvaluationBatch,
    day: Option<usize>,
) -> Result<Vec<flyability_rater::llm::Verdict>> {
    match day {
        None => Ok(batch.evaluations.clone()),
        Some(index) if (1..=batch.evaluations.len()).contains(&index) => {
            Ok(vec![batch.evaluations[index - 1].clone()])
        }
        Some(index) => anyhow::bail!(
            "day {index} not available (have 1-{})",
            batch.evaluations.len()
        ),
    }
}

fn print_reports(config: &Config, verdicts: &[flyability_rater::llm::Verdict], colors: bool) {
    let flight_hours = (config.flight_hours_start, config.flight_hours_end);
    for (index, verdict) in verdicts.iter().enumerate() {
        if index > 0 {
            println!("\n");
        }
        println!("{}", report::format_report(verdict, flight_hours, colors));
    }
}
