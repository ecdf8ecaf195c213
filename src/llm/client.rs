//! Completion API client with bounded retry.
//!
//! One verdict call is a small state machine: success parses the payload,
//! rate limiting and transient failures back off exponentially up to a
//! fixed attempt count, and auth failures abort immediately since
//! credentials will not self-correct.

use std::time::Duration;

use serde_json::{Value, json};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::LlmConfig;
use crate::fetch::{HttpClient, TransportError};
use crate::llm::verdict::{self, Verdict};

/// Models known to accept the structured-JSON response mode. Everything
/// else relies on the prompt's formatting contract alone.
pub const JSON_RESPONSE_MODELS: &[&str] = &[
    "gpt-4-turbo",
    "gpt-4-turbo-preview",
    "gpt-4-0125-preview",
    "gpt-4o",
    "gpt-4o-mini",
    "gpt-3.5-turbo",
];

/// Terminal failure of a verdict call.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("completion API rejected credentials (401): {0}")]
    Auth(String),
    #[error("completion API failed after {attempts} attempts: {last_error}")]
    Exhausted { attempts: u32, last_error: String },
    #[error("malformed completion payload: {0}")]
    Malformed(String),
    #[error("OPENAI_API_KEY not set")]
    MissingKey,
}

/// Backoff schedule: `base * 2^attempt`, with an extra multiplier when the
/// API is rate limiting us.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub rate_limit_multiplier: u32,
}

impl RetryPolicy {
    pub fn delay(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt)
    }

    pub fn rate_limited_delay(&self, attempt: u32) -> Duration {
        self.delay(attempt) * self.rate_limit_multiplier
    }
}

impl From<&LlmConfig> for RetryPolicy {
    fn from(config: &LlmConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: config.base_delay,
            rate_limit_multiplier: config.rate_limit_multiplier.max(1),
        }
    }
}

pub struct LlmClient<C> {
    client: C,
    config: LlmConfig,
    policy: RetryPolicy,
    api_key: String,
}

impl<C: HttpClient> LlmClient<C> {
    pub fn new(client: C, config: LlmConfig) -> Result<Self, LlmError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.is_empty())
            .ok_or(LlmError::MissingKey)?;
        if !api_key.starts_with("sk-") {
            warn!("API key does not look like an OpenAI key (expected sk- prefix)");
        }
        let policy = RetryPolicy::from(&config);
        Ok(Self {
            client,
            config,
            policy,
            api_key,
        })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Sends the prompt pair and returns the normalized verdict.
    pub async fn evaluate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<Verdict, LlmError> {
        let payload = self.build_payload(system_prompt, user_prompt);
        info!(
            model = %self.config.model,
            system_len = system_prompt.len(),
            user_len = user_prompt.len(),
            "Completion API call"
        );

        let max_attempts = self.policy.max_attempts;
        let mut last_error = String::from("no attempt made");

        for attempt in 0..max_attempts {
            debug!(attempt = attempt + 1, max_attempts, "Completion attempt");

            let delay = match self.client.post_json(
                &self.config.api_url,
                Some(&self.api_key),
                &payload,
            )
            .await
            {
                Ok(response) if response.status == 200 => {
                    info!("Completion API call succeeded");
                    return self.parse_response(&response.body);
                }
                Ok(response) if response.status == 401 => {
                    return Err(LlmError::Auth(truncate(&response.body, 200)));
                }
                Ok(response) if response.status == 429 => {
                    last_error = "rate limited (429)".to_string();
                    self.policy.rate_limited_delay(attempt)
                }
                Ok(response) => {
                    last_error = format!(
                        "API error {}: {}",
                        response.status,
                        truncate(&response.body, 500)
                    );
                    self.policy.delay(attempt)
                }
                Err(TransportError::Timeout) => {
                    last_error = format!(
                        "completion API timeout after {}s",
                        self.config.timeout.as_secs()
                    );
                    self.policy.delay(attempt)
                }
                Err(TransportError::Other(message)) => {
                    last_error = format!("request error: {message}");
                    self.policy.delay(attempt)
                }
            };

            if attempt + 1 < max_attempts {
                warn!(
                    attempt = attempt + 1,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %last_error,
                    "Completion attempt failed, backing off"
                );
                tokio::time::sleep(delay).await;
            }
        }

        Err(LlmError::Exhausted {
            attempts: max_attempts,
            last_error,
        })
    }

    fn build_payload(&self, system_prompt: &str, user_prompt: &str) -> Value {
        let mut payload = json!({
            "model": self.config.model,
            "messages": [
                { "role": "system", "content": system_prompt },
                { "role": "user", "content": user_prompt }
            ],
            "temperature": self.config.temperature,
        });

        let supports_json_mode = JSON_RESPONSE_MODELS
            .iter()
            .any(|known| self.config.model.contains(known));
        if supports_json_mode {
            payload["response_format"] = json!({ "type": "json_object" });
        }

        payload
    }

    /// Extracts the completion text and parses it as the verdict JSON. A
    /// malformed body is terminal for this call; whether that fails the
    /// whole day is the orchestrator's decision.
    fn parse_response(&self, body: &str) -> Result<Verdict, LlmError> {
        let envelope: Value = serde_json::from_str(body)
            .map_err(|e| LlmError::Malformed(format!("response envelope: {e}")))?;
        let content = envelope
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .ok_or_else(|| LlmError::Malformed("missing choices[0].message.content".to_string()))?;
        let raw: Value = serde_json::from_str(content)
            .map_err(|e| LlmError::Malformed(format!("verdict payload: {e}")))?;
        Ok(verdict::normalize(&raw))
    }
}

fn truncate(text: &str, limit: usize) -> String {
    if text.len() <= limit {
        text.to_string()
    } else {
        let mut end = limit;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        text[..end].to_string()
    }
}
