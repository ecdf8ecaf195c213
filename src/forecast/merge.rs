//! Hybrid merge of two forecast model outputs.

use crate::model::HourlySeries;

/// Merges a high-resolution primary series into a wide-coverage fallback
/// series.
///
/// The fallback defines the canonical timestamp set: every output timestamp
/// comes from it, and primary timestamps it does not contain are dropped.
/// For shared timestamps, a non-null primary value overwrites the fallback
/// value per parameter; null primary values leave the fallback value in
/// place.
pub fn hybrid_merge(primary: HourlySeries, fallback: HourlySeries) -> HourlySeries {
    let mut merged = fallback;
    for (timestamp, record) in primary {
        let Some(target) = merged.get_mut(&timestamp) else {
            continue;
        };
        for (param, value) in record {
            if value.is_some() {
                target.insert(param, value);
            }
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::HourlyRecord;

    fn record(pairs: &[(&str, Option<f64>)]) -> HourlyRecord {
        pairs
            .iter()
            .map(|(name, value)| (name.to_string(), *value))
            .collect()
    }

    fn series(entries: &[(&str, &[(&str, Option<f64>)])]) -> HourlySeries {
        entries
            .iter()
            .map(|(ts, pairs)| (ts.to_string(), record(pairs)))
            .collect()
    }

    #[test]
    fn test_primary_wins_when_non_null() {
        let primary = series(&[("2026-01-01T09:00", &[("temperature_2m", Some(5.0))])]);
        let fallback = series(&[
            ("2026-01-01T09:00", &[("temperature_2m", Some(4.0))]),
            ("2026-01-01T10:00", &[("temperature_2m", Some(6.0))]),
        ]);

        let merged = hybrid_merge(primary, fallback);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged["2026-01-01T09:00"]["temperature_2m"], Some(5.0));
        assert_eq!(merged["2026-01-01T10:00"]["temperature_2m"], Some(6.0));
    }

    #[test]
    fn test_null_primary_never_overwrites() {
        let primary = series(&[("2026-01-01T09:00", &[("cape", None)])]);
        let fallback = series(&[("2026-01-01T09:00", &[("cape", Some(120.0))])]);

        let merged = hybrid_merge(primary, fallback);
        assert_eq!(merged["2026-01-01T09:00"]["cape"], Some(120.0));
    }

    #[test]
    fn test_timestamps_outside_fallback_are_dropped() {
        let primary = series(&[
            ("2026-01-01T09:00", &[("temperature_2m", Some(5.0))]),
            ("2026-01-03T09:00", &[("temperature_2m", Some(9.0))]),
        ]);
        let fallback = series(&[("2026-01-01T09:00", &[("temperature_2m", Some(4.0))])]);

        let merged = hybrid_merge(primary, fallback);
        assert_eq!(merged.len(), 1);
        assert!(!merged.contains_key("2026-01-03T09:00"));
    }

    #[test]
    fn test_merge_is_per_parameter() {
        let primary = series(&[(
            "2026-01-01T09:00",
            &[("temperature_2m", Some(5.0)), ("cloud_base", None)],
        )]);
        let fallback = series(&[(
            "2026-01-01T09:00",
            &[("temperature_2m", Some(4.0)), ("cloud_base", Some(1800.0))],
        )]);

        let merged = hybrid_merge(primary, fallback);
        let entry = &merged["2026-01-01T09:00"];
        assert_eq!(entry["temperature_2m"], Some(5.0));
        assert_eq!(entry["cloud_base"], Some(1800.0));
    }
}
