use chrono::{DateTime, Duration, Utc};

/// Start of a window of `days` days ending at `now`.
pub fn window_start(now: DateTime<Utc>, days: u32) -> DateTime<Utc> {
    now - Duration::days(i64::from(days))
}

/// Window start as the `YYYY-MM-DD` form GitHub search qualifiers expect.
pub fn since_date(now: DateTime<Utc>, days: u32) -> String {
    window_start(now, days).format("%Y-%m-%d").to_string()
}
