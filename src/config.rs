//! Runtime configuration, resolved once from the environment at startup.
//!
//! `.env` loading happens in `main` via dotenvy; this module only reads
//! already-populated environment variables and falls back to the defaults
//! of the Uetliberg deployment.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;

use crate::model::LocationProfile;

/// Forecast API endpoint (Open-Meteo compatible).
pub const API_URL: &str = "https://api.open-meteo.com/v1/forecast";

/// High-resolution primary model. Short guaranteed horizon, locally precise.
pub const PRIMARY_MODEL: &str = "meteoswiss_icon_ch1";

/// Wide-coverage fallback model. Defines the canonical timestamp set.
pub const FALLBACK_MODEL: &str = "icon_seamless";

/// The API supports at most this many forecast days.
pub const MAX_FORECAST_DAYS: u8 = 7;

/// Hourly parameters requested from both models.
pub const HOURLY_PARAMS: &[&str] = &[
    "temperature_2m",
    "wind_speed_10m",
    "wind_direction_10m",
    "wind_gusts_10m",
    "cloud_base",
    "cloud_cover",
    "cloud_cover_low",
    "cloud_cover_mid",
    "cloud_cover_high",
    "precipitation",
    "precipitation_probability",
    "sunshine_duration",
    "cape",
];

/// Standard pressure levels (hPa) indexing upper-air data, ascending by
/// altitude.
pub const PRESSURE_LEVELS: &[u32] = &[1000, 950, 925, 900, 850, 800, 700];

pub const WEATHER_JSON_FILENAME: &str = "wetterdaten.json";
pub const EVALUATIONS_JSON_FILENAME: &str = "evaluations.json";

/// Settings for the forecast fetch.
#[derive(Debug, Clone)]
pub struct ForecastConfig {
    pub api_url: String,
    pub primary_model: String,
    /// `None` switches the fetcher to single-model mode.
    pub fallback_model: Option<String>,
    pub forecast_days: u8,
    pub timezone: String,
    pub timeout: Duration,
}

/// Settings for the completion API client.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f64,
    pub max_attempts: u32,
    pub base_delay: Duration,
    /// Extra scaling applied to the backoff when rate limited.
    pub rate_limit_multiplier: u32,
    pub timeout: Duration,
}

/// File locations for the availability chain: an ephemeral primary (survives
/// within one serverless/container instance) and a project-local fallback.
#[derive(Debug, Clone)]
pub struct StoragePaths {
    pub primary_weather: PathBuf,
    pub fallback_weather: PathBuf,
    pub primary_evaluations: PathBuf,
    pub fallback_evaluations: PathBuf,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub forecast: ForecastConfig,
    pub llm: LlmConfig,
    pub location: LocationProfile,
    /// Daily flight-hour window, inclusive start and exclusive end.
    pub flight_hours_start: u32,
    pub flight_hours_end: u32,
    pub paths: StoragePaths,
    /// Freshness threshold for the in-memory weather cache.
    pub cache_ttl: Duration,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> Result<T> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("invalid value for {key}: {raw}")),
        Err(_) => Ok(default),
    }
}

impl Config {
    /// Resolves the full configuration from environment variables, applying
    /// the Uetliberg defaults for anything unset.
    pub fn from_env() -> Result<Self> {
        let forecast_days: u8 = env_parse("FORECAST_DAYS", 2)?;
        let forecast = ForecastConfig {
            api_url: env_or("FORECAST_API_URL", API_URL),
            primary_model: env_or("FORECAST_PRIMARY_MODEL", PRIMARY_MODEL),
            fallback_model: Some(env_or("FORECAST_FALLBACK_MODEL", FALLBACK_MODEL)),
            forecast_days: forecast_days.min(MAX_FORECAST_DAYS),
            timezone: env_or("FORECAST_TIMEZONE", "Europe/Zurich"),
            timeout: Duration::from_secs(env_parse("FORECAST_TIMEOUT_SECS", 30u64)?),
        };

        let llm = LlmConfig {
            api_url: env_or("OPENAI_API_URL", "https://api.openai.com/v1/chat/completions"),
            api_key: std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty()),
            model: env_or("OPENAI_MODEL", "gpt-4o-mini"),
            temperature: 0.3,
            max_attempts: env_parse("OPENAI_MAX_ATTEMPTS", 3u32)?,
            base_delay: Duration::from_millis(env_parse("OPENAI_RETRY_BASE_MS", 1000u64)?),
            rate_limit_multiplier: 2,
            timeout: Duration::from_secs(env_parse("OPENAI_TIMEOUT_SECS", 60u64)?),
        };

        let location = LocationProfile {
            name: env_or("LOCATION_NAME", "Uetliberg (Balderen)"),
            latitude: env_parse("LOCATION_LATITUDE", 47.3494)?,
            longitude: env_parse("LOCATION_LONGITUDE", 8.4869)?,
            site_type: env_or("LOCATION_TYPE", "Hang- und Thermikstartplatz"),
            region: env_or("LOCATION_REGION", "Uetliberg"),
            wind_directions: env_or("LOCATION_WIND_DIRECTIONS", "N-O"),
            remarks: env_or(
                "LOCATION_REMARKS",
                "Steiler Startplatz | Landeplatz Balderen klein | Bise kritisch",
            ),
        };

        let data_dir = PathBuf::from(env_or("DATA_DIR", "data"));
        let ephemeral_dir = std::env::var("EPHEMERAL_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| std::env::temp_dir());
        let paths = StoragePaths {
            primary_weather: ephemeral_dir.join(WEATHER_JSON_FILENAME),
            fallback_weather: data_dir.join(WEATHER_JSON_FILENAME),
            primary_evaluations: ephemeral_dir.join(EVALUATIONS_JSON_FILENAME),
            fallback_evaluations: data_dir.join(EVALUATIONS_JSON_FILENAME),
        };

        let flight_hours_start = env_parse("FLIGHT_HOURS_START", 9u32)?;
        let flight_hours_end = env_parse("FLIGHT_HOURS_END", 18u32)?;
        anyhow::ensure!(
            flight_hours_start < flight_hours_end && flight_hours_end <= 24,
            "flight hours must satisfy start < end <= 24 (got {flight_hours_start}..{flight_hours_end})"
        );

        Ok(Self {
            forecast,
            llm,
            location,
            flight_hours_start,
            flight_hours_end,
            paths,
            cache_ttl: Duration::from_secs(env_parse("WEATHER_CACHE_TTL_SECS", 300u64)?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hourly_params_cover_required_set() {
        for required in ["temperature_2m", "cape", "cloud_base", "sunshine_duration"] {
            assert!(HOURLY_PARAMS.contains(&required), "missing {required}");
        }
    }

    #[test]
    fn test_pressure_levels_descend_in_pressure() {
        for pair in PRESSURE_LEVELS.windows(2) {
            assert!(pair[0] > pair[1]);
        }
    }
}
