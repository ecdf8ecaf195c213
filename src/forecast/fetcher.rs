//! Forecast retrieval: one or two model requests plus the hybrid merge.

use std::path::Path;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{ForecastConfig, HOURLY_PARAMS};
use crate::fetch::{HttpClient, TransportError};
use crate::forecast::api::{self, ForecastResponse, HourlyBlock};
use crate::forecast::merge::hybrid_merge;
use crate::model::{HourlySeries, LocationProfile, LocationWeather, WeatherFile};

/// Failure of one fetch cycle. The fetcher never retries internally; the
/// caller owns any retry policy.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("forecast request failed: {0}")]
    Transport(#[from] TransportError),
    #[error("forecast API returned status {status}")]
    Status { status: u16 },
    #[error("forecast response could not be parsed: {0}")]
    Malformed(String),
    #[error("no forecast data available")]
    NoData,
}

pub struct ForecastFetcher<C> {
    client: C,
    config: ForecastConfig,
}

impl<C: HttpClient> ForecastFetcher<C> {
    pub fn new(client: C, config: ForecastConfig) -> Self {
        Self { client, config }
    }

    /// Fetches the hourly series for the given coordinates.
    ///
    /// With a fallback model configured, both models are requested and
    /// merged; otherwise the primary model's series is returned as-is.
    pub async fn fetch(&self, latitude: f64, longitude: f64) -> Result<HourlySeries, FetchError> {
        let primary = self
            .fetch_model(latitude, longitude, &self.config.primary_model)
            .await?;

        let series = match &self.config.fallback_model {
            Some(fallback_model) => {
                let fallback = self
                    .fetch_model(latitude, longitude, fallback_model)
                    .await?;
                if fallback.time.is_empty() {
                    warn!(model = %fallback_model, "Fallback model returned no timestamps");
                    return Err(FetchError::NoData);
                }
                let merged = hybrid_merge(
                    primary.to_series(HOURLY_PARAMS),
                    fallback.to_series(HOURLY_PARAMS),
                );
                info!(timestamps = merged.len(), "Hybrid merge complete");
                merged
            }
            None => {
                if primary.time.is_empty() {
                    return Err(FetchError::NoData);
                }
                primary.to_series(HOURLY_PARAMS)
            }
        };

        Ok(series)
    }

    async fn fetch_model(
        &self,
        latitude: f64,
        longitude: f64,
        model: &str,
    ) -> Result<HourlyBlock, FetchError> {
        let url = api::forecast_url(
            &self.config.api_url,
            latitude,
            longitude,
            model,
            HOURLY_PARAMS,
            self.config.forecast_days,
            &self.config.timezone,
        );

        info!(model, "Requesting forecast");
        let response = self.client.get(&url).await?;
        if !response.is_success() {
            return Err(FetchError::Status {
                status: response.status,
            });
        }

        let parsed: ForecastResponse = serde_json::from_str(&response.body)
            .map_err(|e| FetchError::Malformed(e.to_string()))?;
        let block = parsed.hourly.unwrap_or_default();
        debug!(model, timestamps = block.time.len(), "Forecast model response parsed");
        Ok(block)
    }

    /// Fetches the configured site's forecast and wraps it with the site
    /// metadata, keyed by location name as the persisted file expects.
    pub async fn fetch_for_location(
        &self,
        profile: &LocationProfile,
    ) -> Result<WeatherFile, FetchError> {
        let series = self.fetch(profile.latitude, profile.longitude).await?;
        if series.is_empty() {
            return Err(FetchError::NoData);
        }
        let weather = LocationWeather::from_profile(profile, series);
        Ok(WeatherFile::single(&profile.name, weather))
    }
}

/// Writes a weather file as pretty-printed JSON, creating parent
/// directories as needed.
pub fn write_weather_file(file: &WeatherFile, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(file)?;
    std::fs::write(path, json)?;
    info!(path = %path.display(), "Weather data written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::RawResponse;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Returns canned bodies in order, one per request.
    struct ScriptedClient {
        bodies: Mutex<Vec<RawResponse>>,
    }

    impl ScriptedClient {
        fn new(responses: Vec<RawResponse>) -> Self {
            Self {
                bodies: Mutex::new(responses),
            }
        }
    }

    #[async_trait]
    impl HttpClient for ScriptedClient {
        async fn get(&self, _url: &str) -> Result<RawResponse, TransportError> {
            let mut bodies = self.bodies.lock().unwrap();
            if bodies.is_empty() {
                return Err(TransportError::Other("no scripted response".into()));
            }
            Ok(bodies.remove(0))
        }

        async fn post_json(
            &self,
            _url: &str,
            _bearer_token: Option<&str>,
            _body: &serde_json::Value,
        ) -> Result<RawResponse, TransportError> {
            Err(TransportError::Other("unexpected POST".into()))
        }
    }

    fn config() -> ForecastConfig {
        ForecastConfig {
            api_url: "http://localhost/v1/forecast".to_string(),
            primary_model: "meteoswiss_icon_ch1".to_string(),
            fallback_model: Some("icon_seamless".to_string()),
            forecast_days: 2,
            timezone: "Europe/Zurich".to_string(),
            timeout: Duration::from_secs(5),
        }
    }

    fn ok(body: &str) -> RawResponse {
        RawResponse {
            status: 200,
            body: body.to_string(),
        }
    }

    #[tokio::test]
    async fn test_hybrid_fetch_merges_models() {
        let primary = r#"{"hourly":{"time":["2026-01-01T09:00"],"temperature_2m":[5.0]}}"#;
        let fallback = r#"{"hourly":{"time":["2026-01-01T09:00","2026-01-01T10:00"],"temperature_2m":[4.0,6.0]}}"#;
        let fetcher = ForecastFetcher::new(
            ScriptedClient::new(vec![ok(primary), ok(fallback)]),
            config(),
        );

        let series = fetcher.fetch(47.35, 8.49).await.unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series["2026-01-01T09:00"]["temperature_2m"], Some(5.0));
        assert_eq!(series["2026-01-01T10:00"]["temperature_2m"], Some(6.0));
    }

    #[tokio::test]
    async fn test_empty_fallback_is_no_data() {
        let primary = r#"{"hourly":{"time":["2026-01-01T09:00"],"temperature_2m":[5.0]}}"#;
        let fallback = r#"{"hourly":{"time":[]}}"#;
        let fetcher = ForecastFetcher::new(
            ScriptedClient::new(vec![ok(primary), ok(fallback)]),
            config(),
        );

        assert!(matches!(
            fetcher.fetch(47.35, 8.49).await,
            Err(FetchError::NoData)
        ));
    }

    #[tokio::test]
    async fn test_non_success_status_fails_cycle() {
        let fetcher = ForecastFetcher::new(
            ScriptedClient::new(vec![RawResponse {
                status: 503,
                body: String::new(),
            }]),
            config(),
        );

        assert!(matches!(
            fetcher.fetch(47.35, 8.49).await,
            Err(FetchError::Status { status: 503 })
        ));
    }

    #[tokio::test]
    async fn test_single_model_mode() {
        let primary = r#"{"hourly":{"time":["2026-01-01T09:00"],"temperature_2m":[5.0]}}"#;
        let mut single = config();
        single.fallback_model = None;
        let fetcher = ForecastFetcher::new(ScriptedClient::new(vec![ok(primary)]), single);

        let series = fetcher.fetch(47.35, 8.49).await.unwrap();
        assert_eq!(series.len(), 1);
    }
}
