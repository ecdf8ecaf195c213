//! Full pipeline run: fetch → evaluate → notify, with per-step isolation
//! and a structured report instead of raw errors at the boundary.

use chrono::Utc;
use serde::Serialize;
use tracing::{error, info};

use crate::config::Config;
use crate::evaluator::Evaluator;
use crate::fetch::HttpClient;
use crate::forecast::{self, ForecastFetcher};
use crate::notify::Notifier;
use crate::store;

#[derive(Debug, Serialize)]
pub struct StepStatus {
    pub name: &'static str,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StepStatus {
    fn ok(name: &'static str, message: String) -> Self {
        Self {
            name,
            success: true,
            message: Some(message),
            error: None,
        }
    }

    fn failed(name: &'static str, error: String) -> Self {
        Self {
            name,
            success: false,
            message: None,
            error: Some(error),
        }
    }
}

/// Operator-facing status of one full run.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub success: bool,
    pub timestamp: String,
    pub steps: Vec<StepStatus>,
    pub errors: Vec<String>,
    pub duration_seconds: f64,
}

/// Runs the scheduled sequence end to end.
///
/// A fetch failure aborts the run (nothing to evaluate); an evaluation or
/// notification failure is recorded but later steps still report their
/// status. The returned report is always complete, never a raw error.
pub async fn run_full<C: HttpClient>(
    config: &Config,
    fetcher: &ForecastFetcher<C>,
    evaluator: &Evaluator<C>,
    notifier: &dyn Notifier,
) -> RunReport {
    let started = std::time::Instant::now();
    let mut steps = Vec::new();
    let mut errors = Vec::new();

    info!("Step 1: fetch weather data");
    let weather = match fetcher.fetch_for_location(&config.location).await {
        Ok(file) => {
            if let Err(e) = forecast::write_weather_file(&file, &config.paths.primary_weather) {
                errors.push(format!("weather persistence failed: {e}"));
            }
            let entry = file.entry(&config.location.name).cloned();
            match entry {
                Some(weather) => {
                    steps.push(StepStatus::ok(
                        "fetch_weather",
                        format!("{} timestamps fetched", weather.hourly_data.len()),
                    ));
                    Some(weather)
                }
                None => {
                    let message = "fetched file has no entry for the configured site".to_string();
                    steps.push(StepStatus::failed("fetch_weather", message.clone()));
                    errors.push(message);
                    None
                }
            }
        }
        Err(e) => {
            error!(error = %e, "Weather fetch failed");
            steps.push(StepStatus::failed("fetch_weather", e.to_string()));
            errors.push(e.to_string());
            None
        }
    };

    let Some(weather) = weather else {
        return finish(started, steps, errors);
    };

    info!("Step 2: LLM evaluation");
    let batch = evaluator.analyze(&weather).await;
    if batch.evaluations.is_empty() {
        let message = "no forecast days to evaluate".to_string();
        steps.push(StepStatus::failed("evaluate", message.clone()));
        errors.push(message);
        return finish(started, steps, errors);
    }
    if let Err(e) = store::write_evaluations(&batch, &config.paths.primary_evaluations) {
        errors.push(format!("evaluation persistence failed: {e}"));
    }
    steps.push(StepStatus::ok(
        "evaluate",
        format!("{} day(s) evaluated", batch.evaluations.len()),
    ));

    info!("Step 3: notification");
    let delivery = notifier.send(&batch).await;
    if delivery.success {
        steps.push(StepStatus::ok(
            "notify",
            format!("notification sent for {} day(s)", batch.evaluations.len()),
        ));
    } else {
        let message = delivery
            .error
            .unwrap_or_else(|| "notification failed".to_string());
        steps.push(StepStatus::failed("notify", message.clone()));
        errors.push(message);
    }

    finish(started, steps, errors)
}

fn finish(started: std::time::Instant, steps: Vec<StepStatus>, errors: Vec<String>) -> RunReport {
    let success = !steps.is_empty() && steps.iter().all(|step| step.success);
    let report = RunReport {
        success,
        timestamp: Utc::now().to_rfc3339(),
        steps,
        errors,
        duration_seconds: started.elapsed().as_secs_f64(),
    };
    if report.success {
        info!(duration = report.duration_seconds, "Run complete");
    } else {
        error!(
            duration = report.duration_seconds,
            errors = report.errors.len(),
            "Run finished with errors"
        );
    }
    report
}
