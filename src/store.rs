//! Data availability: in-memory cache with time-based staleness plus the
//! file-then-live-fetch fallback chain.
//!
//! The cache is an explicit object with an injected clock so staleness is
//! testable; concurrent invocations may race on the underlying files and
//! the design tolerates last-writer-wins. A torn or partial file read is a
//! recoverable miss, never a crash.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::fetch::HttpClient;
use crate::forecast::{self, ForecastFetcher};
use crate::llm::EvaluationBatch;
use crate::model::{LocationProfile, LocationWeather, WeatherFile};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no weather data available")]
    NoWeatherData,
    #[error("no evaluation available")]
    NoEvaluation,
}

/// Injectable time source for cache staleness.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

struct CacheSlot {
    weather: LocationWeather,
    fetched_at: Instant,
}

/// Serves weather and evaluation reads through the availability chain:
/// fresh in-memory cache, then persisted files (ephemeral primary before
/// project-local fallback), then live regeneration.
pub struct AvailabilityStore {
    location: LocationProfile,
    ttl: Duration,
    weather_paths: [PathBuf; 2],
    evaluation_paths: [PathBuf; 2],
    clock: Arc<dyn Clock>,
    cache: Mutex<Option<CacheSlot>>,
}

impl AvailabilityStore {
    pub fn new(config: &Config) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: &Config, clock: Arc<dyn Clock>) -> Self {
        Self {
            location: config.location.clone(),
            ttl: config.cache_ttl,
            weather_paths: [
                config.paths.primary_weather.clone(),
                config.paths.fallback_weather.clone(),
            ],
            evaluation_paths: [
                config.paths.primary_evaluations.clone(),
                config.paths.fallback_evaluations.clone(),
            ],
            clock,
            cache: Mutex::new(None),
        }
    }

    /// Weather read path: cache → files → live fetch.
    pub async fn weather<C: HttpClient>(
        &self,
        fetcher: &ForecastFetcher<C>,
    ) -> Result<LocationWeather, StoreError> {
        if let Some(cached) = self.cached_weather() {
            debug!("Serving weather from in-memory cache");
            return Ok(cached);
        }

        if let Some(weather) = self.load_weather_from_files() {
            self.fill_cache(weather.clone());
            return Ok(weather);
        }

        info!("No stored weather data, fetching live");
        match fetcher.fetch_for_location(&self.location).await {
            Ok(file) => {
                // persist for future reads; best-effort
                if let Err(e) = forecast::write_weather_file(&file, &self.weather_paths[0]) {
                    warn!(error = %e, "Could not persist freshly fetched weather");
                }
                let weather = file
                    .entry(&self.location.name)
                    .cloned()
                    .ok_or(StoreError::NoWeatherData)?;
                self.fill_cache(weather.clone());
                Ok(weather)
            }
            Err(e) => {
                warn!(error = %e, "Live weather fetch failed");
                Err(StoreError::NoWeatherData)
            }
        }
    }

    fn cached_weather(&self) -> Option<LocationWeather> {
        let cache = self.cache.lock().unwrap();
        cache.as_ref().and_then(|slot| {
            let age = self.clock.now().saturating_duration_since(slot.fetched_at);
            (age < self.ttl).then(|| slot.weather.clone())
        })
    }

    fn fill_cache(&self, weather: LocationWeather) {
        let mut cache = self.cache.lock().unwrap();
        *cache = Some(CacheSlot {
            weather,
            fetched_at: self.clock.now(),
        });
    }

    fn load_weather_from_files(&self) -> Option<LocationWeather> {
        for path in &self.weather_paths {
            let Ok(raw) = std::fs::read_to_string(path) else {
                continue;
            };
            match serde_json::from_str::<WeatherFile>(&raw) {
                Ok(file) => match file.entry(&self.location.name) {
                    Some(weather) => {
                        debug!(path = %path.display(), "Loaded weather from file");
                        return Some(weather.clone());
                    }
                    None => {
                        warn!(path = %path.display(), location = %self.location.name,
                            "Weather file has no entry for the configured site");
                    }
                },
                Err(e) => {
                    // possibly a torn concurrent write; treat as a miss
                    warn!(path = %path.display(), error = %e, "Unreadable weather file");
                }
            }
        }
        None
    }

    /// Evaluations read path: files, then synchronous regeneration, then
    /// one re-read. `regenerate` runs the full orchestrator and persists
    /// its result as a side effect.
    pub async fn evaluations<F, Fut>(&self, regenerate: F) -> Result<EvaluationBatch, StoreError>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = anyhow::Result<()>>,
    {
        if let Some(batch) = self.load_evaluations_from_files() {
            return Ok(batch);
        }

        info!("No stored evaluations, regenerating");
        if let Err(e) = regenerate().await {
            warn!(error = %e, "Evaluation regeneration failed");
        }

        self.load_evaluations_from_files()
            .ok_or(StoreError::NoEvaluation)
    }

    fn load_evaluations_from_files(&self) -> Option<EvaluationBatch> {
        for path in &self.evaluation_paths {
            let Ok(raw) = std::fs::read_to_string(path) else {
                continue;
            };
            match serde_json::from_str::<EvaluationBatch>(&raw) {
                Ok(batch) => {
                    debug!(path = %path.display(), "Loaded evaluations from file");
                    return Some(batch);
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Unreadable evaluations file");
                }
            }
        }
        None
    }
}

/// Replaces the evaluations file as a whole, creating parent directories.
pub fn write_evaluations(batch: &EvaluationBatch, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(batch)?;
    std::fs::write(path, json)?;
    info!(path = %path.display(), days = batch.evaluations.len(), "Evaluations written");
    Ok(())
}
