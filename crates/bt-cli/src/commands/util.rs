//! Shared utilities for CLI commands.

use anyhow::Context;
use bt_core::{DayCalendar, DayWindow};
use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use regex::Regex;

/// Relative time pattern: "N minutes/hours/days/weeks ago".
const RELATIVE_TIME_PATTERN: &str = r"^(\d+)\s+(minute|hour|day|week)s?\s+ago$";

/// Conservative bounds for relative time parsing (~1000 years in minutes).
const MAX_RELATIVE_MINUTES: i64 = 1000 * 365 * 24 * 60;

/// Parse a datetime string relative to the current time.
pub fn parse_datetime(s: &str) -> anyhow::Result<DateTime<Utc>> {
    parse_datetime_at(s, Utc::now(), &Local)
}

/// Parse a datetime string as ISO 8601, local wall-clock time or relative time.
///
/// Supports:
/// - ISO 8601: "2026-01-15T10:30:00Z"
/// - Local date and time: "2026-01-15 10:30"
/// - Local time today: "10:30"
/// - Relative: "2 hours ago", "30 minutes ago", "1 day ago", "1 week ago"
pub fn parse_datetime_at<Tz: TimeZone>(
    s: &str,
    now: DateTime<Utc>,
    tz: &Tz,
) -> anyhow::Result<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%d %H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return local_to_utc(tz, naive);
        }
    }
    if let Ok(time) = NaiveTime::parse_from_str(s, "%H:%M") {
        let today = now.with_timezone(tz).date_naive();
        return local_to_utc(tz, today.and_time(time));
    }

    let relative = Regex::new(RELATIVE_TIME_PATTERN).context("invalid relative time pattern")?;
    let Some(caps) = relative.captures(s) else {
        anyhow::bail!(
            "Invalid datetime: {s}. Use ISO 8601 (e.g., 2026-01-15T10:30:00Z), local time (e.g., '2026-01-15 10:30' or '10:30') or relative (e.g., '2 hours ago')"
        );
    };

    let n: i64 = caps[1]
        .parse()
        .context("failed to parse number in relative time")?;

    let (max_for_unit, minutes_per_unit) = match &caps[2] {
        "minute" => (MAX_RELATIVE_MINUTES, 1),
        "hour" => (MAX_RELATIVE_MINUTES / 60, 60),
        "day" => (MAX_RELATIVE_MINUTES / (60 * 24), 60 * 24),
        "week" => (MAX_RELATIVE_MINUTES / (60 * 24 * 7), 60 * 24 * 7),
        unit => anyhow::bail!("Unknown time unit: {unit}"),
    };

    if n > max_for_unit {
        anyhow::bail!("Relative time value too large: {n} {}", &caps[2]);
    }

    Ok(now - Duration::minutes(n * minutes_per_unit))
}

fn local_to_utc<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> anyhow::Result<DateTime<Utc>> {
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("{naive} does not exist in the local time zone"))
}

/// The current tracking day.
pub fn today<Tz: TimeZone>(calendar: &DayCalendar<Tz>, now: DateTime<Utc>) -> NaiveDate {
    calendar.day_key(now)
}

/// The `days` completed tracking days before today.
pub fn stats_window<Tz: TimeZone>(
    calendar: &DayCalendar<Tz>,
    now: DateTime<Utc>,
    days: u32,
) -> DayWindow {
    let today = today(calendar, now);
    DayWindow::trailing(today.pred_opt().unwrap_or(today), days)
}

/// Query bounds for a window, padded by a day on each side so nights that
/// begin just before the window are still classified.
pub fn padded_range<Tz: TimeZone>(
    calendar: &DayCalendar<Tz>,
    window: DayWindow,
) -> (DateTime<Utc>, DateTime<Utc>) {
    (
        calendar.row_start(window.first) - Duration::days(1),
        calendar.row_end(window.last) + Duration::days(1),
    )
}
