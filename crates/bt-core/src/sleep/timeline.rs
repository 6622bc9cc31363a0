//! Sleep rows for the timeline chart.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::Serialize;

use crate::calendar::DayCalendar;
use crate::event::RawEvent;
use crate::event_type::EventType;
use crate::format::{ONGOING_LABEL, format_duration, format_time};
use crate::timeline::{DayRow, RowMarker, bucket_by_day, left_in_row, percent_of_row, row_days};
use crate::types::EventId;

/// One sleep session positioned within its day row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SleepBlock {
    pub event_id: EventId,
    /// Start position in percent of the row.
    pub left: f64,
    /// Length in percent of the row, truncated at the row end.
    pub width: f64,
    pub is_night: bool,
    pub is_ongoing: bool,
    /// Set when the session runs past the end of its row.
    pub clipped: bool,
    /// Full duration in minutes, measured to "now" for ongoing sessions.
    pub duration_minutes: i64,
    /// `HH:MM - HH:MM`, or `HH:MM - Now` while ongoing.
    pub time: String,
    /// `Xh Ym`, or `Ongoing...` while ongoing.
    pub duration: String,
}

impl RowMarker for SleepBlock {
    const LIST_NAME: &'static str = "blocks";
}

pub type SleepRow = DayRow<SleepBlock>;

/// Builds `num_days` rows ending at `anchor`, newest first.
///
/// Each SLEEP event lands in the row of its start time. Blocks that overflow
/// the row are truncated at 100% and flagged `clipped`; nothing is carried into
/// the next row. Completed sessions with a non-positive interval are not drawn.
pub fn generate_timeline<Tz: TimeZone>(
    events: &[RawEvent],
    night_event_ids: &BTreeSet<EventId>,
    calendar: &DayCalendar<Tz>,
    anchor: NaiveDate,
    num_days: u32,
    now: DateTime<Utc>,
) -> Vec<SleepRow> {
    let mut sleeps: Vec<&RawEvent> = events
        .iter()
        .filter(|e| e.kind == EventType::Sleep)
        .collect();
    sleeps.sort_by_key(|e| (e.start_time, e.id));
    let mut buckets = bucket_by_day(sleeps, calendar);

    row_days(anchor, num_days)
        .into_iter()
        .map(|day| {
            let blocks = buckets
                .remove(&day)
                .unwrap_or_default()
                .into_iter()
                .filter_map(|event| block(event, night_event_ids, calendar, day, now))
                .collect();
            DayRow::new(day, blocks)
        })
        .collect()
}

fn block<Tz: TimeZone>(
    event: &RawEvent,
    night_event_ids: &BTreeSet<EventId>,
    calendar: &DayCalendar<Tz>,
    day: NaiveDate,
    now: DateTime<Utc>,
) -> Option<SleepBlock> {
    let start = event.start_time?;
    let is_ongoing = event.end_time.is_none();
    let end = match event.end_time {
        Some(end) if end <= start => {
            tracing::debug!(id = %event.id, "not drawing non-positive sleep interval");
            return None;
        }
        Some(end) => end,
        None => now.max(start),
    };

    let left = left_in_row(calendar, day, start);
    let full_width = percent_of_row(end - start, calendar.row_length(day));
    let clipped = left + full_width > 100.0;
    let width = if clipped { (100.0 - left).max(0.0) } else { full_width };

    let duration_minutes = (end - start).num_minutes();
    let started = format_time(calendar, start);
    let (time, duration) = if is_ongoing {
        (format!("{started} - Now"), ONGOING_LABEL.to_string())
    } else {
        (
            format!("{started} - {}", format_time(calendar, end)),
            format_duration(duration_minutes),
        )
    };

    Some(SleepBlock {
        event_id: event.id,
        left,
        width,
        is_night: night_event_ids.contains(&event.id),
        is_ongoing,
        clipped,
        duration_minutes,
        time,
        duration,
    })
}
