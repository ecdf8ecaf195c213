//! LLM-backed flyability judgment.
//!
//! The client handles the completion API's retry/backoff contract; the
//! verdict module turns whatever the model returned into a fully defaulted
//! [`verdict::Verdict`].

pub mod client;
pub mod verdict;

pub use client::{LlmClient, LlmError, RetryPolicy};
pub use verdict::{Conditions, EvaluationBatch, Verdict};
