//! Display helpers shared by the timeline builders and reports.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use crate::calendar::{DayCalendar, MINUTES_PER_DAY};

/// Duration label for sleep sessions that have not ended.
pub const ONGOING_LABEL: &str = "Ongoing...";

/// Formats a minute count as `"Xh Ym"` if >= 1 hour, `"Ym"` otherwise.
/// Negative durations are treated as 0m.
pub fn format_duration(minutes: i64) -> String {
    let minutes = minutes.max(0);
    let hours = minutes / 60;
    let rest = minutes % 60;
    if hours >= 1 {
        format!("{hours}h {rest}m")
    } else {
        format!("{rest}m")
    }
}

/// Formats minutes since midnight as `HH:MM`, wrapping past 24h.
#[allow(clippy::cast_possible_truncation)]
pub fn format_clock(minutes: f64) -> String {
    let total = (minutes.round() as i64).rem_euclid(MINUTES_PER_DAY);
    format!("{:02}:{:02}", total / 60, total % 60)
}

/// Formats an instant as local `HH:MM`.
pub fn format_time<Tz: TimeZone>(calendar: &DayCalendar<Tz>, instant: DateTime<Utc>) -> String {
    calendar.local(instant).format("%H:%M").to_string()
}

/// Short row label for a tracking day, e.g. `Mon 15`.
pub fn row_label(day: NaiveDate) -> String {
    day.format("%a %-d").to_string()
}
