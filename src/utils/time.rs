use std::time::{SystemTime, UNIX_EPOCH};

pub fn current_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

pub fn elapsed_seconds(start: i64, end: i64) -> i64 {
    end - start
}

/// Minutes since `last_activity`, rounded to the nearest minute
pub fn idle_minutes(last_activity: i64, now: i64) -> i64 {
    (elapsed_seconds(last_activity, now) as f64 / 60.0).round() as i64
}

/// Human readable duration, e.g. `1d 2h 3m`
pub fn format_seconds(seconds: i64) -> String {
    let sign = if seconds < 0 { "-" } else { "" };
    let total = seconds.unsigned_abs();
    let days = total / 86_400;
    let hours = (total % 86_400) / 3600;
    let minutes = (total % 3600) / 60;

    if days > 0 {
        format!("{}{}d {}h {}m", sign, days, hours, minutes)
    } else if hours > 0 {
        format!("{}{}h {}m", sign, hours, minutes)
    } else {
        format!("{}{}m", sign, minutes)
    }
}

pub fn format_minutes(minutes: i64) -> String {
    format_seconds(minutes.saturating_mul(60))
}
