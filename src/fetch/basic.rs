use std::time::Duration;

use async_trait::async_trait;

use super::client::{HttpClient, RawResponse, TransportError};

/// Plain reqwest-backed [`HttpClient`] with a fixed per-request timeout.
pub struct BasicClient(reqwest::Client);

impl BasicClient {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self(client))
    }
}

fn map_error(error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout
    } else {
        TransportError::Other(error.to_string())
    }
}

async fn into_raw(response: reqwest::Response) -> Result<RawResponse, TransportError> {
    let status = response.status().as_u16();
    let body = response.text().await.map_err(map_error)?;
    Ok(RawResponse { status, body })
}

#[async_trait]
impl HttpClient for BasicClient {
    async fn get(&self, url: &str) -> Result<RawResponse, TransportError> {
        let response = self.0.get(url).send().await.map_err(map_error)?;
        into_raw(response).await
    }

    async fn post_json(
        &self,
        url: &str,
        bearer_token: Option<&str>,
        body: &serde_json::Value,
    ) -> Result<RawResponse, TransportError> {
        let mut request = self.0.post(url).json(body);
        if let Some(token) = bearer_token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await.map_err(map_error)?;
        into_raw(response).await
    }
}
