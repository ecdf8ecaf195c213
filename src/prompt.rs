//! Prompt construction for the flyability evaluation.
//!
//! The system prompt is a static instruction block; the user prompt is
//! rendered per day from the site profile and the formatted hourly data.

use crate::config::PRESSURE_LEVELS;
use crate::model::{HourlySeries, LocationProfile, PressureLevelSeries};
use crate::segment::DayWindow;

/// Upper-air rendering is capped at the first timestamps of the day.
const ALTITUDE_PROFILE_HOURS: usize = 6;

/// Static instruction block sent as the system message on every call.
pub const SYSTEM_PROMPT: &str = "\
You are an experienced paragliding instructor and meteorologist. You judge \
whether a launch site is flyable for an average recreational pilot based on \
hourly forecast data.

Judgment guidelines:
- Wind 10-20 km/h is ideal, 0-10 km/h is workable, 20-30 km/h is critical, \
above 30 km/h is not flyable. Gusts more than 15 km/h above the mean wind \
are dangerous.
- The wind direction must lie within the site's permitted launch directions.
- Rain, a cloud base below launch height, and high CAPE values (risk of \
overdevelopment) degrade conditions.
- Rate thermal quality from sunshine duration, CAPE and cloud cover.

Respond with a single JSON object and nothing else, using exactly these \
fields:
{
  \"flyable\": boolean,
  \"rating\": integer 0-10,
  \"confidence\": integer 0-10,
  \"conditions\": one of \"EXCELLENT\" | \"GOOD\" | \"MODERATE\" | \"POOR\" | \"DANGEROUS\",
  \"summary\": short overall assessment,
  \"details\": { \"wind\": text, \"thermal\": text, \"risk\": text },
  \"recommendation\": advice for the pilot,
  \"hourly_evaluations\": [
    { \"hour\": integer, \"timestamp\": string, \"conditions\": string, \
\"flyable\": boolean, \"rating\": integer, \"reason\": string }
  ]
}";

/// Renders the system and user prompt for one day window.
pub fn build_prompts(
    profile: &LocationProfile,
    window: &DayWindow,
    date: &str,
    flight_hours: (u32, u32),
) -> (String, String) {
    let remarks = split_remarks(&profile.remarks);
    let hourly_block = format_hourly(&window.hours);
    let (start, end) = flight_hours;

    let mut user_prompt = format!(
        "Evaluate the flyability of this launch site:\n\
         \n\
         Site: {name}\n\
         Flying region: {region}\n\
         Type: {site_type}\n\
         Permitted wind directions: {wind_directions}\n\
         Special remarks: {remarks}\n\
         \n\
         Hourly forecast ({total_hours} hours):\n\
         {hourly_block}",
        name = profile.name,
        region = profile.region,
        site_type = profile.site_type,
        wind_directions = if profile.wind_directions.is_empty() {
            "not specified"
        } else {
            profile.wind_directions.as_str()
        },
        remarks = remarks,
        total_hours = window.hours.len(),
    );

    user_prompt.push_str(&format!(
        "\n\nIMPORTANT: This analysis covers only the flight hours \
         ({start:02}:00-{end:02}:00) of {date}."
    ));

    let altitude_block = format_altitude_profile(&window.pressure_levels, ALTITUDE_PROFILE_HOURS);
    if let Some(altitude_block) = altitude_block {
        user_prompt.push_str(&format!(
            "\n\nUPPER-AIR WIND PROFILE (first {ALTITUDE_PROFILE_HOURS} hours):\n\
             {altitude_block}\n\
             \n\
             Check the profile for wind shear and thermal inversions."
        ));
    }

    (SYSTEM_PROMPT.to_string(), user_prompt)
}

/// Splits the pipe-delimited remarks field into a comma-separated list, or
/// a "none" marker when empty.
fn split_remarks(remarks: &str) -> String {
    let parts: Vec<&str> = remarks
        .split('|')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect();
    if parts.is_empty() {
        "none".to_string()
    } else {
        parts.join(", ")
    }
}

fn fmt_value(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v}"),
        None => "N/A".to_string(),
    }
}

/// One line per timestamp in chronological order, every parameter in its
/// human-readable unit. Missing values render as placeholders, never drop
/// the line.
fn format_hourly(hours: &HourlySeries) -> String {
    if hours.is_empty() {
        return "No hourly data available".to_string();
    }

    let mut lines = Vec::with_capacity(hours.len());
    for (timestamp, record) in hours {
        let time_label: String = timestamp.replace('T', " ").chars().take(16).collect();
        let get = |param: &str| record.get(param).copied().flatten();

        let cloud_base = match get("cloud_base") {
            Some(height) => format!("{height}m"),
            None => "no clouds".to_string(),
        };
        let sunshine = match get("sunshine_duration") {
            Some(seconds) if seconds > 0.0 => format!("{:.1}h", seconds / 3600.0),
            _ => "0h".to_string(),
        };

        lines.push(format!(
            "{time_label}: Temp {temp}°C | \
             Wind {speed}km/h from {direction}° (gusts {gusts}km/h) | \
             Cloud base {cloud_base} | Cloud cover {cover}% | \
             CAPE {cape} J/kg | Precipitation {precip}mm | Sun {sunshine}",
            temp = fmt_value(get("temperature_2m")),
            speed = fmt_value(get("wind_speed_10m")),
            direction = fmt_value(get("wind_direction_10m")),
            gusts = fmt_value(get("wind_gusts_10m")),
            cover = fmt_value(get("cloud_cover")),
            cape = fmt_value(get("cape")),
            precip = fmt_value(get("precipitation")),
        ));
    }

    lines.join("\n")
}

/// Formats the upper-air profile for the first `max_hours` timestamps.
///
/// Levels without height and wind speed are skipped; returns `None` when
/// nothing renders so the caller can omit the section entirely.
fn format_altitude_profile(
    pressure_levels: &PressureLevelSeries,
    max_hours: usize,
) -> Option<String> {
    let mut lines = Vec::new();

    for (timestamp, levels) in pressure_levels.iter().take(max_hours) {
        let time_label: String = timestamp.replace('T', " ").chars().take(16).collect();
        let get = |param: String| levels.get(&param).copied().flatten();

        let mut level_lines = Vec::new();
        for &level in PRESSURE_LEVELS {
            let height = get(format!("geopotential_height_{level}hPa"));
            let wind_speed = get(format!("wind_speed_{level}hPa"));
            let (Some(height), Some(wind_speed)) = (height, wind_speed) else {
                continue;
            };

            let direction = get(format!("wind_direction_{level}hPa"))
                .map(|d| format!(" from {d:.0}°"))
                .unwrap_or_default();
            let temperature = get(format!("temperature_{level}hPa"))
                .map(|t| format!(", temp {t:.1}°C"))
                .unwrap_or_default();
            level_lines.push(format!(
                "  {height}m MSL ({level}hPa): wind {wind_speed:.1}km/h{direction}{temperature}",
                height = height as i64,
            ));
        }

        if !level_lines.is_empty() {
            lines.push(format!("{time_label}:"));
            lines.extend(level_lines);
        }
    }

    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::HourlyRecord;
    use std::collections::BTreeMap;

    fn profile() -> LocationProfile {
        LocationProfile {
            name: "Uetliberg (Balderen)".to_string(),
            latitude: 47.3494,
            longitude: 8.4869,
            site_type: "Hang- und Thermikstartplatz".to_string(),
            region: "Uetliberg".to_string(),
            wind_directions: "N-O".to_string(),
            remarks: "Steiler Startplatz | Landeplatz klein".to_string(),
        }
    }

    fn record(pairs: &[(&str, Option<f64>)]) -> HourlyRecord {
        pairs
            .iter()
            .map(|(name, value)| (name.to_string(), *value))
            .collect()
    }

    #[test]
    fn test_split_remarks() {
        assert_eq!(split_remarks("a | b|c "), "a, b, c");
        assert_eq!(split_remarks(""), "none");
        assert_eq!(split_remarks(" | "), "none");
    }

    #[test]
    fn test_hourly_line_units() {
        let mut hours = HourlySeries::new();
        hours.insert(
            "2026-01-01T09:00".to_string(),
            record(&[
                ("temperature_2m", Some(5.0)),
                ("wind_speed_10m", Some(12.0)),
                ("wind_direction_10m", Some(45.0)),
                ("wind_gusts_10m", Some(20.0)),
                ("cloud_base", None),
                ("cloud_cover", Some(30.0)),
                ("cape", Some(150.0)),
                ("precipitation", Some(0.0)),
                ("sunshine_duration", Some(1800.0)),
            ]),
        );

        let block = format_hourly(&hours);
        assert!(block.contains("2026-01-01 09:00"));
        assert!(block.contains("Wind 12km/h from 45°"));
        assert!(block.contains("Cloud base no clouds"));
        assert!(block.contains("Sun 0.5h"));
    }

    #[test]
    fn test_missing_values_render_as_placeholders() {
        let mut hours = HourlySeries::new();
        hours.insert("2026-01-01T09:00".to_string(), HourlyRecord::new());

        let block = format_hourly(&hours);
        assert!(block.contains("Temp N/A°C"));
        assert!(block.contains("Sun 0h"));
    }

    #[test]
    fn test_user_prompt_mentions_flight_window_and_date() {
        let window = DayWindow::default();
        let (_, user) = build_prompts(&profile(), &window, "2026-01-01", (9, 18));
        assert!(user.contains("(09:00-18:00) of 2026-01-01"));
        assert!(user.contains("Steiler Startplatz, Landeplatz klein"));
        assert!(!user.contains("UPPER-AIR WIND PROFILE"));
    }

    #[test]
    fn test_altitude_profile_limited_to_first_hours() {
        let mut pressure = PressureLevelSeries::new();
        for hour in 0..10 {
            let mut levels = BTreeMap::new();
            levels.insert("geopotential_height_850hPa".to_string(), Some(1457.0));
            levels.insert("wind_speed_850hPa".to_string(), Some(18.0));
            levels.insert("wind_direction_850hPa".to_string(), Some(270.0));
            pressure.insert(format!("2026-01-01T{hour:02}:00"), levels);
        }

        let block = format_altitude_profile(&pressure, 6).unwrap();
        assert!(block.contains("1457m MSL (850hPa): wind 18.0km/h from 270°"));
        assert_eq!(block.matches("MSL").count(), 6);
    }

    #[test]
    fn test_altitude_profile_absent_when_no_usable_levels() {
        let mut pressure = PressureLevelSeries::new();
        pressure.insert("2026-01-01T09:00".to_string(), BTreeMap::new());
        assert!(format_altitude_profile(&pressure, 6).is_none());
    }
}
