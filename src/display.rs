//! Human-readable renderings of dates, intervals and review feedback.
use crate::models::Quality;
use chrono::{DateTime, Local, Utc};

/// Formats a timestamp as a local YYYY-MM-DD string
pub fn format_date(time: DateTime<Utc>) -> String {
    let local: DateTime<Local> = time.into();
    local.format("%Y-%m-%d").to_string()
}

/// "1 day", "3 days", "2 weeks", "1 month", ...
pub fn format_interval(days: u32) -> String {
    let (count, unit) = match days {
        0..7 => (days, "day"),
        7..30 => (days / 7, "week"),
        _ => (days / 30, "month"),
    };
    if count == 1 {
        format!("1 {unit}")
    } else {
        format!("{count} {unit}s")
    }
}

/// Feedback shown after a review is accepted.
pub fn review_message(quality: Quality, interval_days: u32) -> String {
    if quality >= Quality::EASY {
        format!(
            "Great job! You'll see this word again in {}",
            format_interval(interval_days)
        )
    } else if quality.is_pass() {
        format!("Good! Review scheduled in {}", format_interval(interval_days))
    } else {
        "Keep practicing! You'll review this again tomorrow.".to_string()
    }
}
