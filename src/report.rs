//! Terminal ticker rendering of a stored verdict.

use crate::llm::verdict::{Conditions, Verdict};

const GREEN: &str = "\x1b[92m";
const YELLOW: &str = "\x1b[93m";
const ORANGE: &str = "\x1b[38;5;208m";
const RED: &str = "\x1b[91m";
const CYAN: &str = "\x1b[96m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

const RULE: &str = "─────────────────────────────────────────────────────────────────";

fn condition_color(conditions: Conditions) -> &'static str {
    match conditions {
        Conditions::Excellent | Conditions::Good => GREEN,
        Conditions::Moderate | Conditions::Unknown => YELLOW,
        Conditions::Poor => ORANGE,
        Conditions::Dangerous => RED,
    }
}

/// Renders one verdict as the flight-ticker block shown in the terminal.
pub fn format_report(verdict: &Verdict, flight_hours: (u32, u32), use_colors: bool) -> String {
    let color = |text: &str, code: &str| {
        if use_colors {
            format!("{code}{text}{RESET}")
        } else {
            text.to_string()
        }
    };

    let flyable_text = if verdict.flyable {
        color("FLYABLE", GREEN)
    } else {
        color("NOT FLYABLE", RED)
    };
    let conditions_text = color(verdict.conditions.label(), condition_color(verdict.conditions));

    let rating = verdict.rating.clamp(0, 10) as usize;
    let confidence = verdict.confidence.clamp(0, 10) as usize;
    let rating_bar = format!("{}{}", "█".repeat(rating), "░".repeat(10 - rating));
    let confidence_bar = format!("{}{}", "█".repeat(confidence), "░".repeat(10 - confidence));

    let (start, end) = flight_hours;
    let mut lines = Vec::new();
    lines.push(color("PARAGLIDING FLIGHT TICKER", BOLD));
    lines.push(RULE.to_string());
    lines.push(format!("Site:     {}", color(&verdict.location, BOLD)));
    if !verdict.date.is_empty() {
        lines.push(format!(
            "Day:      {} ({start:02}:00-{end:02}:00)",
            verdict.date
        ));
    }
    if !verdict.timestamp.is_empty() {
        lines.push(format!("Analysis: {}", verdict.timestamp));
    }
    lines.push(String::new());
    lines.push(format!("{flyable_text} - {conditions_text}"));
    lines.push(String::new());
    lines.push(format!("Rating:     {rating_bar} ({rating}/10)"));
    lines.push(format!(
        "Confidence: {} ({confidence}/10)",
        color(&confidence_bar, CYAN)
    ));
    lines.push(RULE.to_string());
    lines.push(color("Summary:", BOLD));
    lines.push(verdict.summary.clone());
    lines.push(String::new());
    lines.push(color("Wind:", BOLD));
    lines.push(verdict.details.wind.clone());
    lines.push(color("Thermal:", BOLD));
    lines.push(verdict.details.thermal.clone());
    lines.push(color("Risk:", BOLD));
    lines.push(verdict.details.risk.clone());
    lines.push(RULE.to_string());
    lines.push(color("Recommendation:", BOLD));
    lines.push(verdict.recommendation.clone());
    lines.push(RULE.to_string());

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_report_has_no_ansi_codes() {
        let mut verdict = Verdict::default();
        verdict.date = "2026-01-01".to_string();
        verdict.location = "Uetliberg (Balderen)".to_string();

        let report = format_report(&verdict, (9, 18), false);
        assert!(!report.contains("\x1b["));
        assert!(report.contains("NOT FLYABLE"));
        assert!(report.contains("2026-01-01 (09:00-18:00)"));
    }

    #[test]
    fn test_bars_reflect_rating_and_confidence() {
        let mut verdict = Verdict::default();
        verdict.rating = 7;
        verdict.confidence = 12; // out of range, must clamp

        let report = format_report(&verdict, (9, 18), false);
        assert!(report.contains(&format!("{}{}", "█".repeat(7), "░".repeat(3))));
        assert!(report.contains("(10/10)"));
    }
}
