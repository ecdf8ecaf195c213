//! Evaluation orchestrator: drives segment → prompt → LLM per day,
//! collects the batch, persists it and triggers notification.

use std::path::PathBuf;

use chrono::Utc;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::fetch::HttpClient;
use crate::llm::verdict::{Conditions, Verdict, VerdictDetails};
use crate::llm::{EvaluationBatch, LlmClient, LlmError};
use crate::model::{LocationProfile, LocationWeather};
use crate::notify::Notifier;
use crate::segment::{self, DayWindow};
use crate::{prompt, store};

pub struct Evaluator<C> {
    llm: LlmClient<C>,
    location: LocationProfile,
    flight_hours: (u32, u32),
    forecast_days: usize,
    output_path: PathBuf,
}

impl<C: HttpClient> Evaluator<C> {
    pub fn new(llm: LlmClient<C>, config: &Config, output_path: PathBuf) -> Self {
        Self {
            llm,
            location: config.location.clone(),
            flight_hours: (config.flight_hours_start, config.flight_hours_end),
            forecast_days: config.forecast.forecast_days as usize,
            output_path,
        }
    }

    /// Evaluates every forecast day and returns one verdict per day.
    ///
    /// A single day's failure never aborts the batch: the failed day gets a
    /// synthetic worst-case verdict carrying the error text.
    pub async fn analyze(&self, weather: &LocationWeather) -> EvaluationBatch {
        info!(
            location = %self.location.name,
            days = self.forecast_days,
            "Analyzing launch site"
        );

        let windows = segment::group_by_days(
            &weather.hourly_data,
            &weather.pressure_level_data,
            self.flight_hours.0,
            self.flight_hours.1,
        );

        let mut evaluations = Vec::new();
        for (date, window) in windows.iter().take(self.forecast_days) {
            let date_label = date.format("%Y-%m-%d").to_string();
            info!(date = %date_label, hours = window.hours.len(), "Evaluating day");

            let mut verdict = match self.evaluate_day(&date_label, window).await {
                Ok(verdict) => verdict,
                Err(e) => {
                    error!(date = %date_label, error = %e, "Day evaluation failed");
                    failure_verdict(&e.to_string())
                }
            };
            verdict.date = date_label;
            verdict.location = self.location.name.clone();
            verdict.timestamp = Utc::now().to_rfc3339();
            evaluations.push(verdict);
        }

        EvaluationBatch {
            last_updated: Utc::now().to_rfc3339(),
            location: self.location.name.clone(),
            evaluations,
        }
    }

    /// One day's prompt + LLM round trip.
    pub async fn evaluate_day(
        &self,
        date: &str,
        window: &DayWindow,
    ) -> Result<Verdict, LlmError> {
        let (system_prompt, user_prompt) =
            prompt::build_prompts(&self.location, window, date, self.flight_hours);
        self.llm.evaluate(&system_prompt, &user_prompt).await
    }

    /// Full orchestration: analyze, persist the batch (entire-file
    /// replace), then hand it to the notifier. Persistence and delivery
    /// failures are logged but do not fail the run.
    pub async fn run(
        &self,
        weather: &LocationWeather,
        notifier: &dyn Notifier,
    ) -> EvaluationBatch {
        let batch = self.analyze(weather).await;

        if batch.evaluations.is_empty() {
            warn!("No forecast days available, nothing persisted");
            return batch;
        }

        if let Err(e) = store::write_evaluations(&batch, &self.output_path) {
            warn!(error = %e, "Failed to persist evaluations");
        }

        let delivery = notifier.send(&batch).await;
        if delivery.success {
            info!("Consolidated notification sent");
        } else if let Some(error) = delivery.error {
            warn!(error = %error, "Notification failed");
        }

        batch
    }
}

/// Synthetic worst-case verdict substituted for a failed day.
pub fn failure_verdict(error: &str) -> Verdict {
    Verdict {
        flyable: false,
        rating: 0,
        confidence: 0,
        conditions: Conditions::Dangerous,
        summary: format!("Error: {error}"),
        details: VerdictDetails {
            wind: String::new(),
            thermal: String::new(),
            risk: format!("System error: {error}"),
        },
        recommendation: "Please try again later.".to_string(),
        hourly_evaluations: Vec::new(),
        date: String::new(),
        location: String::new(),
        timestamp: String::new(),
    }
}
