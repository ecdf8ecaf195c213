//! Calendar-day grouping and flight-hour filtering of an hourly series.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Timelike};
use tracing::warn;

use crate::model::{HourlySeries, PressureLevelSeries};

/// An hourly series restricted to one calendar date and the configured
/// flight-hour window.
///
/// Upper-air data for the date rides along unfiltered, in its own field so
/// it never mixes into the hourly parameter namespace.
#[derive(Debug, Clone, Default)]
pub struct DayWindow {
    pub hours: HourlySeries,
    pub pressure_levels: PressureLevelSeries,
}

/// Parses the timestamp formats the forecast API and older stored files
/// use: local ISO-8601 with or without seconds, optionally suffixed `Z`,
/// or full RFC 3339 with an offset.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    if let Ok(with_offset) = DateTime::parse_from_rfc3339(raw) {
        return Some(with_offset.naive_local());
    }
    let trimmed = raw.strip_suffix('Z').unwrap_or(raw);
    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M"))
        .ok()
}

/// Keeps the hours satisfying `start_hour <= hour < end_hour`.
///
/// Unparsable timestamps are logged and skipped, never fatal.
pub fn filter_flight_hours(
    hourly: &HourlySeries,
    start_hour: u32,
    end_hour: u32,
) -> HourlySeries {
    hourly
        .iter()
        .filter(|(timestamp, _)| match parse_timestamp(timestamp) {
            Some(parsed) => {
                let hour = parsed.hour();
                start_hour <= hour && hour < end_hour
            }
            None => {
                warn!(timestamp = %timestamp, "Skipping unparsable timestamp");
                false
            }
        })
        .map(|(timestamp, record)| (timestamp.clone(), record.clone()))
        .collect()
}

/// Groups an hourly series into per-day flight windows.
///
/// Every calendar date present in the input appears in the output, even
/// when none of its hours fall inside the flight window; downstream day
/// iteration stays stable and complete. Pressure-level data is grouped by
/// the same date key but not filtered by flight hours.
pub fn group_by_days(
    hourly: &HourlySeries,
    pressure_levels: &PressureLevelSeries,
    start_hour: u32,
    end_hour: u32,
) -> BTreeMap<NaiveDate, DayWindow> {
    let mut windows: BTreeMap<NaiveDate, DayWindow> = BTreeMap::new();

    for (timestamp, record) in hourly {
        let Some(parsed) = parse_timestamp(timestamp) else {
            warn!(timestamp = %timestamp, "Skipping unparsable timestamp");
            continue;
        };
        let window = windows.entry(parsed.date()).or_default();
        let hour = parsed.hour();
        if start_hour <= hour && hour < end_hour {
            window.hours.insert(timestamp.clone(), record.clone());
        }
    }

    for (timestamp, levels) in pressure_levels {
        let Some(parsed) = parse_timestamp(timestamp) else {
            continue;
        };
        windows
            .entry(parsed.date())
            .or_default()
            .pressure_levels
            .insert(timestamp.clone(), levels.clone());
    }

    windows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::HourlyRecord;

    fn series_at(timestamps: &[&str]) -> HourlySeries {
        timestamps
            .iter()
            .map(|ts| (ts.to_string(), HourlyRecord::new()))
            .collect()
    }

    #[test]
    fn test_parse_timestamp_variants() {
        assert!(parse_timestamp("2026-01-01T09:00").is_some());
        assert!(parse_timestamp("2026-01-01T09:00:00").is_some());
        assert!(parse_timestamp("2026-01-01T09:00Z").is_some());
        assert!(parse_timestamp("2026-01-01T09:00:00+01:00").is_some());
        assert!(parse_timestamp("gestern").is_none());
    }

    #[test]
    fn test_filter_is_inclusive_start_exclusive_end() {
        let series = series_at(&[
            "2026-01-01T08:00",
            "2026-01-01T09:00",
            "2026-01-01T17:00",
            "2026-01-01T18:00",
        ]);

        let filtered = filter_flight_hours(&series, 9, 18);
        let kept: Vec<_> = filtered.keys().cloned().collect();
        assert_eq!(kept, vec!["2026-01-01T09:00", "2026-01-01T17:00"]);
    }

    #[test]
    fn test_group_matches_group_then_filter() {
        let series = series_at(&[
            "2026-01-01T08:00",
            "2026-01-01T12:00",
            "2026-01-02T10:00",
            "2026-01-02T20:00",
        ]);

        let windows = group_by_days(&series, &PressureLevelSeries::new(), 9, 18);
        assert_eq!(windows.len(), 2);

        for (date, window) in &windows {
            let day_full: HourlySeries = series
                .iter()
                .filter(|(ts, _)| parse_timestamp(ts).map(|p| p.date()) == Some(*date))
                .map(|(ts, rec)| (ts.clone(), rec.clone()))
                .collect();
            assert_eq!(window.hours, filter_flight_hours(&day_full, 9, 18));
        }
    }

    #[test]
    fn test_day_without_qualifying_hours_is_kept() {
        let series = series_at(&["2026-01-01T05:00", "2026-01-02T12:00"]);

        let windows = group_by_days(&series, &PressureLevelSeries::new(), 9, 18);
        let first = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        assert!(windows[&first].hours.is_empty());
        assert_eq!(windows.len(), 2);
    }

    #[test]
    fn test_pressure_levels_attach_unfiltered() {
        let series = series_at(&["2026-01-01T12:00"]);
        let mut pressure = PressureLevelSeries::new();
        pressure.insert("2026-01-01T05:00".to_string(), BTreeMap::new());
        pressure.insert("2026-01-01T12:00".to_string(), BTreeMap::new());

        let windows = group_by_days(&series, &pressure, 9, 18);
        let day = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        // the 05:00 upper-air entry stays even though it is outside flight hours
        assert_eq!(windows[&day].pressure_levels.len(), 2);
        assert_eq!(windows[&day].hours.len(), 1);
    }

    #[test]
    fn test_unparsable_timestamps_are_skipped() {
        let mut series = series_at(&["2026-01-01T12:00"]);
        series.insert("not-a-time".to_string(), HourlyRecord::new());

        let windows = group_by_days(&series, &PressureLevelSeries::new(), 9, 18);
        assert_eq!(windows.len(), 1);
    }
}
