//! The flyability verdict and its normalization from raw model output.
//!
//! Normalization is a pure function over untyped JSON so it can be tested
//! without any network involvement. Every field has a defined default; a
//! missing field never surfaces as an error to the caller.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const NOT_AVAILABLE: &str = "not available";
pub const NO_SUMMARY: &str = "No summary available";
pub const NO_RECOMMENDATION: &str = "No recommendation available";

/// Closed set of overall condition labels. Anything the model invents maps
/// to `Unknown`, both during normalization and when reloading older files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Conditions {
    Excellent,
    Good,
    Moderate,
    Poor,
    Dangerous,
    #[default]
    #[serde(other)]
    Unknown,
}

impl Conditions {
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_uppercase().as_str() {
            "EXCELLENT" => Self::Excellent,
            "GOOD" => Self::Good,
            "MODERATE" => Self::Moderate,
            "POOR" => Self::Poor,
            "DANGEROUS" => Self::Dangerous,
            _ => Self::Unknown,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Excellent => "EXCELLENT",
            Self::Good => "GOOD",
            Self::Moderate => "MODERATE",
            Self::Poor => "POOR",
            Self::Dangerous => "DANGEROUS",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for Conditions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Per-aspect detail texts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerdictDetails {
    pub wind: String,
    pub thermal: String,
    pub risk: String,
}

impl Default for VerdictDetails {
    fn default() -> Self {
        Self {
            wind: NOT_AVAILABLE.to_string(),
            thermal: NOT_AVAILABLE.to_string(),
            risk: NOT_AVAILABLE.to_string(),
        }
    }
}

/// One per-hour sub-verdict inside a day's evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyEvaluation {
    pub hour: i64,
    pub timestamp: String,
    /// Upper-cased free-form label; hourly entries are not forced into the
    /// closed `Conditions` set.
    pub conditions: String,
    pub flyable: bool,
    pub rating: i64,
    pub reason: String,
}

/// The per-day flyability judgment, fully defaulted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub flyable: bool,
    pub rating: i64,
    pub confidence: i64,
    pub conditions: Conditions,
    pub summary: String,
    pub details: VerdictDetails,
    pub recommendation: String,
    #[serde(default)]
    pub hourly_evaluations: Vec<HourlyEvaluation>,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub timestamp: String,
}

impl Default for Verdict {
    fn default() -> Self {
        Self {
            flyable: false,
            rating: 0,
            confidence: 0,
            conditions: Conditions::Unknown,
            summary: NO_SUMMARY.to_string(),
            details: VerdictDetails::default(),
            recommendation: NO_RECOMMENDATION.to_string(),
            hourly_evaluations: Vec::new(),
            date: String::new(),
            location: String::new(),
            timestamp: String::new(),
        }
    }
}

fn coerce_bool(value: Option<&Value>) -> bool {
    value.and_then(Value::as_bool).unwrap_or(false)
}

fn coerce_int(value: Option<&Value>) -> i64 {
    match value {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)).unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

fn coerce_string(value: Option<&Value>, default: &str) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        _ => default.to_string(),
    }
}

/// Normalizes raw model output into a [`Verdict`].
///
/// Supplied fields are kept; everything missing or mis-typed gets its safe
/// default. Running this on an already-normalized verdict is a no-op.
pub fn normalize(raw: &Value) -> Verdict {
    let get = |field: &str| raw.get(field);

    let details_raw = get("details").and_then(Value::as_object);
    let detail = |field: &str| {
        coerce_string(details_raw.and_then(|d| d.get(field)), NOT_AVAILABLE)
    };

    let hourly_evaluations = match get("hourly_evaluations").and_then(Value::as_array) {
        Some(entries) => entries
            .iter()
            .filter_map(|entry| {
                // non-object entries are dropped, not errors
                entry.as_object().map(|fields| HourlyEvaluation {
                    hour: coerce_int(fields.get("hour")),
                    timestamp: coerce_string(fields.get("timestamp"), ""),
                    conditions: coerce_string(fields.get("conditions"), "UNKNOWN").to_uppercase(),
                    flyable: coerce_bool(fields.get("flyable")),
                    rating: coerce_int(fields.get("rating")),
                    reason: coerce_string(fields.get("reason"), "No reason given"),
                })
            })
            .collect(),
        None => Vec::new(),
    };

    Verdict {
        flyable: coerce_bool(get("flyable")),
        rating: coerce_int(get("rating")),
        confidence: coerce_int(get("confidence")),
        conditions: get("conditions")
            .and_then(Value::as_str)
            .map(Conditions::from_label)
            .unwrap_or_default(),
        summary: coerce_string(get("summary"), NO_SUMMARY),
        details: VerdictDetails {
            wind: detail("wind"),
            thermal: detail("thermal"),
            risk: detail("risk"),
        },
        recommendation: coerce_string(get("recommendation"), NO_RECOMMENDATION),
        hourly_evaluations,
        date: coerce_string(get("date"), ""),
        location: coerce_string(get("location"), ""),
        timestamp: coerce_string(get("timestamp"), ""),
    }
}

/// The persisted evaluation results: replaced whole on every successful
/// analysis run, never merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationBatch {
    pub last_updated: String,
    pub location: String,
    pub evaluations: Vec<Verdict>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_details_get_placeholders() {
        let verdict = normalize(&json!({
            "flyable": true,
            "rating": 7,
            "conditions": "GOOD",
            "summary": "Nice day"
        }));

        assert!(verdict.flyable);
        assert_eq!(verdict.rating, 7);
        assert_eq!(verdict.conditions, Conditions::Good);
        assert_eq!(verdict.details.wind, NOT_AVAILABLE);
        assert_eq!(verdict.details.thermal, NOT_AVAILABLE);
        assert_eq!(verdict.details.risk, NOT_AVAILABLE);
        assert_eq!(verdict.recommendation, NO_RECOMMENDATION);
    }

    #[test]
    fn test_supplied_detail_subset_is_kept() {
        let verdict = normalize(&json!({
            "details": { "wind": "NE 15 km/h, steady" }
        }));

        assert_eq!(verdict.details.wind, "NE 15 km/h, steady");
        assert_eq!(verdict.details.thermal, NOT_AVAILABLE);
    }

    #[test]
    fn test_empty_object_yields_all_defaults() {
        let verdict = normalize(&json!({}));
        assert_eq!(verdict, Verdict::default());
    }

    #[test]
    fn test_int_coercion() {
        let verdict = normalize(&json!({ "rating": "8", "confidence": 6.9 }));
        assert_eq!(verdict.rating, 8);
        assert_eq!(verdict.confidence, 6);
    }

    #[test]
    fn test_unknown_conditions_label() {
        let verdict = normalize(&json!({ "conditions": "SPLENDID" }));
        assert_eq!(verdict.conditions, Conditions::Unknown);
    }

    #[test]
    fn test_hourly_entries_coerced_and_non_objects_dropped() {
        let verdict = normalize(&json!({
            "hourly_evaluations": [
                { "hour": 9, "timestamp": "2026-01-01T09:00", "conditions": "good",
                  "flyable": true, "rating": 6, "reason": "light wind" },
                "garbage",
                42
            ]
        }));

        assert_eq!(verdict.hourly_evaluations.len(), 1);
        let entry = &verdict.hourly_evaluations[0];
        assert_eq!(entry.conditions, "GOOD");
        assert!(entry.flyable);
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let verdict = normalize(&json!({
            "flyable": true,
            "rating": 7,
            "confidence": 5,
            "conditions": "GOOD",
            "summary": "Solid NE day",
            "details": { "wind": "NE 15", "thermal": "weak" },
            "recommendation": "Launch after noon",
            "hourly_evaluations": [
                { "hour": 12, "timestamp": "2026-01-01T12:00", "conditions": "GOOD",
                  "flyable": true, "rating": 7, "reason": "best cycle" }
            ],
            "date": "2026-01-01",
            "location": "Uetliberg (Balderen)",
            "timestamp": "2026-01-01T06:00:00Z"
        }));

        let round_tripped = normalize(&serde_json::to_value(&verdict).unwrap());
        assert_eq!(round_tripped, verdict);
    }

    #[test]
    fn test_batch_round_trip_preserves_order() {
        let mut first = Verdict::default();
        first.date = "2026-01-01".to_string();
        let mut second = Verdict::default();
        second.date = "2026-01-02".to_string();
        second.conditions = Conditions::Dangerous;

        let batch = EvaluationBatch {
            last_updated: "2026-01-01T06:00:00Z".to_string(),
            location: "Uetliberg (Balderen)".to_string(),
            evaluations: vec![first, second],
        };

        let json = serde_json::to_string_pretty(&batch).unwrap();
        let reloaded: EvaluationBatch = serde_json::from_str(&json).unwrap();
        assert_eq!(reloaded, batch);
    }
}
