use chrono::{DateTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Render a countdown in the coarse style used by chat replies:
/// `45s`, `12m`, `3h 5m`, `2d 4h`. Negative spans render as `0s`.
pub fn format_delta(seconds: i64) -> String {
    let s = seconds.max(0);
    if s < 60 {
        format!("{s}s")
    } else if s < 3_600 {
        format!("{}m", s / 60)
    } else if s < 86_400 {
        format!("{}h {}m", s / 3_600, (s % 3_600) / 60)
    } else {
        format!("{}d {}h", s / 86_400, (s % 86_400) / 3_600)
    }
}

/// Countdown from `now` to `at`, rounded down to whole seconds.
pub fn format_until(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    format_delta((at - now).num_seconds())
}

/// `Oct 17 at 03:00 PM`, rendered in `tz`.
pub fn format_instant<T: TimeZone>(at: &DateTime<T>, tz: &Tz) -> String {
    at.with_timezone(tz).format("%b %d at %I:%M %p").to_string()
}

/// `2026-10-16 10:00:00 UTC`, the current wall-clock time in `tz`.
pub fn format_current_time(now: DateTime<Utc>, tz: &Tz) -> String {
    now.with_timezone(tz).format("%Y-%m-%d %H:%M:%S %Z").to_string()
}
