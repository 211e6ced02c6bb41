//! Duration parsing and human-readable formatting.
//!
//! Durations follow the admin console convention: a number optionally
//! followed by one of `s`, `m`, `h`, `d`, `w`. A bare number is minutes.

use chrono::{DateTime, Local, TimeZone, Utc};

const MINUTES_PER_HOUR: f64 = 60.0;
const MINUTES_PER_DAY: f64 = 1440.0;
const MINUTES_PER_WEEK: f64 = 10080.0;
const MINUTES_PER_YEAR: f64 = 525600.0;

/// Longest accepted duration: ten years.
pub const MAX_DURATION_MINUTES: f64 = 10.0 * MINUTES_PER_YEAR;

/// Parse a duration string like `30m`, `2h` or `1w` into minutes.
///
/// Returns `None` when the numeric part does not parse, or when the result
/// is not finite, negative, or longer than [`MAX_DURATION_MINUTES`].
pub fn time_to_minutes(duration: &str) -> Option<f64> {
    let duration = duration.trim();
    if duration.is_empty() {
        return Some(0.0);
    }

    let (number, factor) = match duration.chars().last().map(|c| c.to_ascii_lowercase()) {
        Some('s') => (&duration[..duration.len() - 1], 1.0 / 60.0),
        Some('m') => (&duration[..duration.len() - 1], 1.0),
        Some('h') => (&duration[..duration.len() - 1], MINUTES_PER_HOUR),
        Some('d') => (&duration[..duration.len() - 1], MINUTES_PER_DAY),
        Some('w') => (&duration[..duration.len() - 1], MINUTES_PER_WEEK),
        _ => (duration, 1.0),
    };

    number
        .parse::<f64>()
        .ok()
        .map(|n| n * factor)
        .filter(|m| m.is_finite() && (0.0..=MAX_DURATION_MINUTES).contains(m))
}

/// Render a number of minutes as a short readable string (`2 hours`, `1.5 days`).
pub fn minutes_str(minutes: f64) -> String {
    let (num, unit) = if minutes < 1.0 {
        (minutes * 60.0, "second")
    } else if minutes < MINUTES_PER_HOUR {
        (minutes, "minute")
    } else if minutes < MINUTES_PER_DAY {
        (minutes / MINUTES_PER_HOUR, "hour")
    } else if minutes < MINUTES_PER_WEEK {
        (minutes / MINUTES_PER_DAY, "day")
    } else if minutes < MINUTES_PER_YEAR {
        (minutes / MINUTES_PER_WEEK, "week")
    } else {
        (minutes / MINUTES_PER_YEAR, "year")
    };

    let num = (num * 100.0).round() / 100.0;
    let plural = if num == 1.0 { "" } else { "s" };

    if num.fract() == 0.0 {
        format!("{} {}{}", num as i64, unit, plural)
    } else {
        format!("{} {}{}", num, unit, plural)
    }
}

/// Minutes left until a unix timestamp, measured from now.
pub fn minutes_until(timestamp: i64) -> f64 {
    (timestamp - Utc::now().timestamp()) as f64 / 60.0
}

/// Format a unix timestamp the way the console shows "last seen" times.
pub fn format_timestamp(timestamp: i64) -> String {
    match Local.timestamp_opt(timestamp, 0).single() {
        Some(time) => format_time(&time),
        None => "n/a".to_string(),
    }
}

fn format_time(time: &DateTime<Local>) -> String {
    time.format("%a %d %b %Y %H:%M").to_string()
}
