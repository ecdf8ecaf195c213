//! Core data model: hourly forecast series, the persisted weather file
//! format, and the launch-site profile.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One timestamp's weather state: parameter name mapped to a nullable value.
///
/// Parameters follow the forecast API's naming (`temperature_2m`,
/// `wind_speed_10m`, ...). A `None` value means the model did not report
/// the parameter for that hour.
pub type HourlyRecord = BTreeMap<String, Option<f64>>;

/// Hourly records keyed by ISO-8601 timestamp (hour resolution).
///
/// The `BTreeMap` keeps timestamps unique and sorted; ISO-8601 strings order
/// chronologically under lexicographic comparison.
pub type HourlySeries = BTreeMap<String, HourlyRecord>;

/// Upper-air data keyed by timestamp. Inner keys are per-level parameter
/// names such as `wind_speed_850hPa` or `geopotential_height_700hPa`.
pub type PressureLevelSeries = BTreeMap<String, BTreeMap<String, Option<f64>>>;

/// Static metadata for the single analyzed launch site.
///
/// Resolved once at configuration time and immutable for the process
/// lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationProfile {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Site type, e.g. slope / thermal launch.
    pub site_type: String,
    /// Operating region the site belongs to.
    pub region: String,
    /// Permitted wind directions as a compass arc, e.g. "N-O" for 0°-90°.
    pub wind_directions: String,
    /// Free-text operational remarks, pipe-delimited.
    pub remarks: String,
}

/// One location's block in the persisted weather file.
///
/// The optional descriptive fields keep their historical wire names
/// (`typ`, `fluggebiet`, `windrichtung`, `bemerkung`) for compatibility
/// with files written by earlier tooling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationWeather {
    pub latitude: f64,
    pub longitude: f64,
    pub hourly_data: HourlySeries,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub pressure_level_data: PressureLevelSeries,
    #[serde(rename = "typ", default, skip_serializing_if = "Option::is_none")]
    pub site_type: Option<String>,
    #[serde(rename = "fluggebiet", default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(rename = "windrichtung", default, skip_serializing_if = "Option::is_none")]
    pub wind_directions: Option<String>,
    #[serde(rename = "bemerkung", default, skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
}

impl LocationWeather {
    /// Wraps a fetched series with the site's descriptive metadata.
    pub fn from_profile(profile: &LocationProfile, hourly_data: HourlySeries) -> Self {
        Self {
            latitude: profile.latitude,
            longitude: profile.longitude,
            hourly_data,
            pressure_level_data: BTreeMap::new(),
            site_type: Some(profile.site_type.clone()),
            region: Some(profile.region.clone()),
            wind_directions: Some(profile.wind_directions.clone()),
            remarks: Some(profile.remarks.clone()),
        }
    }
}

/// The persisted weather file: location name mapped to its weather block.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeatherFile(pub BTreeMap<String, LocationWeather>);

impl WeatherFile {
    /// Builds a single-entry file for the configured site.
    pub fn single(name: &str, weather: LocationWeather) -> Self {
        let mut map = BTreeMap::new();
        map.insert(name.to_string(), weather);
        Self(map)
    }

    /// Looks up a location entry by its canonical name.
    ///
    /// Falls back to a case-insensitive substring match so files written
    /// under slightly different site labels keep loading. The exact key is
    /// the supported lookup; the substring pass is a compatibility shim.
    pub fn entry(&self, name: &str) -> Option<&LocationWeather> {
        if let Some(found) = self.0.get(name) {
            return Some(found);
        }
        let needle = name.to_lowercase();
        self.0
            .iter()
            .find(|(key, _)| {
                let key = key.to_lowercase();
                key.contains(&needle) || needle.contains(&key)
            })
            .map(|(_, weather)| weather)
    }
}
