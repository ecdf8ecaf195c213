//! Wire types and request building for the Open-Meteo style forecast API.

use std::collections::HashMap;

use serde::Deserialize;

use crate::model::{HourlyRecord, HourlySeries};

/// Top-level forecast response. Only the `hourly` block is consumed.
#[derive(Debug, Deserialize)]
pub struct ForecastResponse {
    #[serde(default)]
    pub hourly: Option<HourlyBlock>,
}

/// The `hourly` object: a shared `time` array plus one same-length value
/// array per requested parameter.
#[derive(Debug, Default, Deserialize)]
pub struct HourlyBlock {
    #[serde(default)]
    pub time: Vec<String>,
    #[serde(flatten)]
    pub values: HashMap<String, Vec<Option<f64>>>,
}

impl HourlyBlock {
    /// Builds a per-timestamp series by positionally zipping each requested
    /// parameter's value array against the shared time array.
    ///
    /// An index out of range for a parameter yields a null for that
    /// parameter, never an error; the API pads ragged arrays this way when
    /// a model's horizon ends early.
    pub fn to_series(&self, params: &[&str]) -> HourlySeries {
        let mut series = HourlySeries::new();
        for (index, timestamp) in self.time.iter().enumerate() {
            let mut record = HourlyRecord::new();
            for &param in params {
                let value = self
                    .values
                    .get(param)
                    .and_then(|column| column.get(index))
                    .copied()
                    .flatten();
                record.insert(param.to_string(), value);
            }
            series.insert(timestamp.clone(), record);
        }
        series
    }
}

/// Assembles the GET URL for one model request.
pub fn forecast_url(
    api_url: &str,
    latitude: f64,
    longitude: f64,
    model: &str,
    params: &[&str],
    forecast_days: u8,
    timezone: &str,
) -> String {
    format!(
        "{api_url}?latitude={latitude}&longitude={longitude}&models={model}\
         &hourly={hourly}&forecast_days={forecast_days}&timezone={timezone}",
        hourly = params.join(",")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_series_zips_positionally() {
        let block: HourlyBlock = serde_json::from_str(
            r#"{
                "time": ["2026-01-01T09:00", "2026-01-01T10:00"],
                "temperature_2m": [5.0, 6.5],
                "wind_speed_10m": [12.0]
            }"#,
        )
        .unwrap();

        let series = block.to_series(&["temperature_2m", "wind_speed_10m", "cape"]);
        assert_eq!(series.len(), 2);

        let first = &series["2026-01-01T09:00"];
        assert_eq!(first["temperature_2m"], Some(5.0));
        assert_eq!(first["wind_speed_10m"], Some(12.0));
        assert_eq!(first["cape"], None);

        // wind_speed_10m is shorter than time: out of range yields null
        let second = &series["2026-01-01T10:00"];
        assert_eq!(second["wind_speed_10m"], None);
    }

    #[test]
    fn test_to_series_empty_time() {
        let block = HourlyBlock::default();
        assert!(block.to_series(&["temperature_2m"]).is_empty());
    }

    #[test]
    fn test_forecast_url_joins_params() {
        let url = forecast_url(
            "https://api.open-meteo.com/v1/forecast",
            47.35,
            8.49,
            "meteoswiss_icon_ch1",
            &["temperature_2m", "cape"],
            2,
            "Europe/Zurich",
        );
        assert!(url.contains("latitude=47.35"));
        assert!(url.contains("models=meteoswiss_icon_ch1"));
        assert!(url.contains("hourly=temperature_2m,cape"));
        assert!(url.contains("forecast_days=2"));
        assert!(url.contains("timezone=Europe/Zurich"));
    }

    #[test]
    fn test_response_without_hourly_block() {
        let response: ForecastResponse = serde_json::from_str("{}").unwrap();
        assert!(response.hourly.is_none());
    }
}
