//! Day rows shared by the sleep and feed timelines.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use crate::calendar::DayCalendar;
use crate::event::RawEvent;
use crate::format::row_label;

/// A marker drawn inside a [`DayRow`].
pub trait RowMarker {
    /// JSON name of the row's marker list: `blocks` for sleep, `points` for feed.
    const LIST_NAME: &'static str;
}

/// One 7am-to-7am row of a rendered timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct DayRow<M> {
    /// Display label for the row's start day, e.g. `Mon 15`.
    pub date: String,
    /// Canonical, sortable key of the row.
    pub raw_date: NaiveDate,
    /// Markers positioned within the row, ordered by start time.
    pub markers: Vec<M>,
}

impl<M> DayRow<M> {
    pub fn new(raw_date: NaiveDate, markers: Vec<M>) -> Self {
        Self {
            date: row_label(raw_date),
            raw_date,
            markers,
        }
    }
}

impl<M: RowMarker + Serialize> Serialize for DayRow<M> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut row = serializer.serialize_struct("DayRow", 3)?;
        row.serialize_field("date", &self.date)?;
        row.serialize_field("rawDate", &self.raw_date)?;
        row.serialize_field(M::LIST_NAME, &self.markers)?;
        row.end()
    }
}

/// Row keys for a timeline of `num_days` rows ending at `anchor`, newest first.
pub fn row_days(anchor: NaiveDate, num_days: u32) -> Vec<NaiveDate> {
    std::iter::successors(Some(anchor), NaiveDate::pred_opt)
        .take(num_days as usize)
        .collect()
}

/// `span` as a percentage of a row lasting `row_length`.
///
/// Rows are 23h or 25h long on DST change days, so the divisor is the real
/// row length rather than a nominal day.
#[allow(clippy::cast_precision_loss)]
pub fn percent_of_row(span: Duration, row_length: Duration) -> f64 {
    let row_ms = row_length.num_milliseconds();
    if row_ms <= 0 {
        return 0.0;
    }
    span.num_milliseconds() as f64 / row_ms as f64 * 100.0
}

/// Groups events with a start time by the tracking day that contains it.
///
/// Each group keeps the input order; callers sort beforehand when they need to.
pub fn bucket_by_day<'a, Tz: TimeZone>(
    events: impl IntoIterator<Item = &'a RawEvent>,
    calendar: &DayCalendar<Tz>,
) -> BTreeMap<NaiveDate, Vec<&'a RawEvent>> {
    let mut buckets: BTreeMap<NaiveDate, Vec<&'a RawEvent>> = BTreeMap::new();
    for event in events {
        let Some(start) = event.start_time else {
            tracing::debug!(id = %event.id, "skipping event without start time");
            continue;
        };
        buckets
            .entry(calendar.day_key(start))
            .or_default()
            .push(event);
    }
    buckets
}

/// Percent offset of `instant` from the start of its row, within `0..=100`.
pub fn left_in_row<Tz: TimeZone>(
    calendar: &DayCalendar<Tz>,
    day: NaiveDate,
    instant: DateTime<Utc>,
) -> f64 {
    percent_of_row(instant - calendar.row_start(day), calendar.row_length(day)).clamp(0.0, 100.0)
}
