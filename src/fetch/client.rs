use async_trait::async_trait;
use thiserror::Error;

/// Transport-level failure of an outbound HTTP exchange.
///
/// Timeouts are kept distinct so callers can report them precisely; both
/// variants are treated as transient by retrying callers.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,
    #[error("transport error: {0}")]
    Other(String),
}

/// A completed HTTP exchange, reduced to the status code and body text the
/// forecast and completion clients consume.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Abstraction over the HTTP exchanges issued by this crate.
///
/// Implementations must enforce their own request timeouts; no outbound
/// call may block unbounded.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn get(&self, url: &str) -> Result<RawResponse, TransportError>;

    /// POSTs a JSON body, optionally with a bearer token in the
    /// `Authorization` header.
    async fn post_json(
        &self,
        url: &str,
        bearer_token: Option<&str>,
        body: &serde_json::Value,
    ) -> Result<RawResponse, TransportError>;
}
