const MILLIS_PER_SECOND: i64 = 1000;

/// Render an elapsed time in milliseconds for a leave notification.
///
/// Anything under one second (including zero and negative values) renders as
/// `"less than 1s"`. Otherwise hours, minutes and seconds are listed when
/// non-zero, except that seconds are dropped once the duration reaches an hour.
pub fn format_duration(millis: i64) -> String {
    if millis < MILLIS_PER_SECOND {
        return "less than 1s".to_string();
    }

    let total_seconds = millis / MILLIS_PER_SECOND;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    let mut parts = Vec::with_capacity(3);
    if hours > 0 {
        parts.push(format!("{}h", hours));
    }
    if minutes > 0 {
        parts.push(format!("{}m", minutes));
    }
    if seconds > 0 && hours == 0 {
        parts.push(format!("{}s", seconds));
    }

    parts.join(" ")
}
