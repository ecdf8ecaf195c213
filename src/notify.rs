//! Notification contract consumed by the orchestrator.
//!
//! Message rendering and SMTP delivery live outside this crate; the core
//! only needs a `send` that reports success plus an optional error text.
//! Dispatch is consolidated: one send per completed batch, not per day.

use async_trait::async_trait;
use tracing::info;

use crate::llm::EvaluationBatch;

/// Outcome of a notification attempt.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub success: bool,
    pub error: Option<String>,
}

impl Delivery {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, batch: &EvaluationBatch) -> Delivery;
}

/// Logs the batch instead of delivering it; stands in wherever no mail
/// transport is configured.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, batch: &EvaluationBatch) -> Delivery {
        for verdict in &batch.evaluations {
            info!(
                date = %verdict.date,
                conditions = %verdict.conditions,
                flyable = verdict.flyable,
                rating = verdict.rating,
                "Verdict"
            );
        }
        info!(
            location = %batch.location,
            days = batch.evaluations.len(),
            "Notification logged (no mail transport configured)"
        );
        Delivery::ok()
    }
}
