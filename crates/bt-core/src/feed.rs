//! Feed timeline rows and feeding statistics.

use std::collections::BTreeMap;

use chrono::{NaiveDate, TimeZone};
use serde::Serialize;

use crate::calendar::{DayCalendar, DayWindow};
use crate::event::RawEvent;
use crate::event_type::EventType;
use crate::format::format_time;
use crate::payload::UNKNOWN_FEED_TYPE;
use crate::stats::{ratio, round_tenth};
use crate::timeline::{DayRow, RowMarker, bucket_by_day, left_in_row, row_days};
use crate::types::EventId;

/// Gaps of this many minutes or more are treated as overnight and ignored.
pub const MAX_FEED_GAP_MINUTES: f64 = 720.0;

pub const LARGE_SCALE: f64 = 1.2;
pub const SMALL_SCALE: f64 = 0.6;
pub const DEFAULT_SCALE: f64 = 0.9;

const LARGE_WORDS: &[&str] = &["big", "large", "lots", "full", "huge", "iso", "paljon", "suuri"];
const SMALL_WORDS: &[&str] = &["small", "little", "bit", "tiny", "pieni", "vähän"];

/// One feed positioned within its day row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedPoint {
    pub event_id: EventId,
    /// Position in percent of the row.
    pub left: f64,
    #[serde(rename = "type")]
    pub feed_type: String,
    /// Local `HH:MM`.
    pub time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    /// Rendering emphasis derived from the note.
    pub scale: f64,
}

impl RowMarker for FeedPoint {
    const LIST_NAME: &'static str = "points";
}

pub type FeedRow = DayRow<FeedPoint>;

/// Display emphasis for a feed note.
///
/// Matches whole words case-insensitively: a "large" word without a "small"
/// one gives [`LARGE_SCALE`], the reverse gives [`SMALL_SCALE`], anything else
/// [`DEFAULT_SCALE`].
pub fn point_scale(note: Option<&str>) -> f64 {
    let Some(note) = note else {
        return DEFAULT_SCALE;
    };
    let lowered = note.to_lowercase();
    let words: Vec<&str> = lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    let large = words.iter().any(|w| LARGE_WORDS.contains(w));
    let small = words.iter().any(|w| SMALL_WORDS.contains(w));
    match (large, small) {
        (true, false) => LARGE_SCALE,
        (false, true) => SMALL_SCALE,
        _ => DEFAULT_SCALE,
    }
}

/// User-facing name of a feed method.
pub fn display_name(feed_type: &str) -> &str {
    if feed_type == "Breastfeeding" {
        "Breast"
    } else {
        feed_type
    }
}

fn feed_type_of(event: &RawEvent) -> &str {
    event
        .data
        .as_feed()
        .map_or(UNKNOWN_FEED_TYPE, |feed| feed.feed_type_or_unknown())
}

/// Builds `num_days` rows of feed points ending at `anchor`, newest first.
pub fn generate_feed_timeline<Tz: TimeZone>(
    events: &[RawEvent],
    calendar: &DayCalendar<Tz>,
    anchor: NaiveDate,
    num_days: u32,
) -> Vec<FeedRow> {
    let mut feeds: Vec<&RawEvent> = events
        .iter()
        .filter(|e| e.kind == EventType::Feed)
        .collect();
    feeds.sort_by_key(|e| (e.start_time, e.id));
    let mut buckets = bucket_by_day(feeds, calendar);

    row_days(anchor, num_days)
        .into_iter()
        .map(|day| {
            let points = buckets
                .remove(&day)
                .unwrap_or_default()
                .into_iter()
                .filter_map(|event| {
                    let start = event.start_time?;
                    let feed = event.data.as_feed();
                    Some(FeedPoint {
                        event_id: event.id,
                        left: left_in_row(calendar, day, start),
                        feed_type: feed_type_of(event).to_string(),
                        time: format_time(calendar, start),
                        note: event.note.clone(),
                        amount: feed.and_then(|f| f.amount),
                        unit: feed.and_then(|f| f.unit.clone()),
                        scale: point_scale(event.note.as_deref()),
                    })
                })
                .collect();
            DayRow::new(day, points)
        })
        .collect()
}

/// Average daily count of one feed method.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedTypeCount {
    /// Display name, e.g. `Breast`.
    pub name: String,
    /// Stored feed method, e.g. `Breastfeeding`.
    pub feed_type: String,
    pub total: usize,
    pub per_day: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyFeeds {
    pub day: NaiveDate,
    pub feeds: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedStats {
    pub total_feeds: usize,
    /// Days in the window with at least one feed.
    pub tracked_days: usize,
    /// Rounded to one decimal.
    pub avg_feeds_per_day: f64,
    /// Mean gap between consecutive feeds in whole minutes, overnight gaps excluded.
    pub avg_gap_minutes: i64,
    pub type_breakdown: Vec<FeedTypeCount>,
    /// Feeds per tracking day, oldest first.
    pub daily: Vec<DailyFeeds>,
}

impl FeedStats {
    /// `Xh Ym` label for the average gap.
    pub fn gap_label(&self) -> String {
        format!("{}h {}m", self.avg_gap_minutes / 60, self.avg_gap_minutes % 60)
    }
}

/// Computes feeding statistics over the FEED events whose start falls in `window`.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn process_feed_stats<Tz: TimeZone>(
    events: &[RawEvent],
    calendar: &DayCalendar<Tz>,
    window: DayWindow,
) -> FeedStats {
    let mut feeds: Vec<&RawEvent> = events
        .iter()
        .filter(|e| e.kind == EventType::Feed)
        .filter(|e| e.start_time.is_some_and(|t| window.contains(calendar.day_key(t))))
        .collect();
    feeds.sort_by_key(|e| (e.start_time, e.id));

    let by_day = bucket_by_day(feeds.iter().copied(), calendar);
    let daily: Vec<DailyFeeds> = by_day
        .iter()
        .map(|(day, events)| DailyFeeds {
            day: *day,
            feeds: events.len(),
        })
        .collect();
    let tracked_days = daily.len();

    let gaps: Vec<f64> = feeds
        .windows(2)
        .filter_map(|pair| Some((pair[1].start_time? - pair[0].start_time?).num_seconds()))
        .map(|seconds| seconds as f64 / 60.0)
        .filter(|minutes| *minutes < MAX_FEED_GAP_MINUTES)
        .collect();
    let avg_gap_minutes = if gaps.is_empty() {
        0
    } else {
        (gaps.iter().sum::<f64>() / gaps.len() as f64).round() as i64
    };

    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for event in &feeds {
        *counts.entry(feed_type_of(event)).or_default() += 1;
    }
    let mut type_breakdown: Vec<FeedTypeCount> = counts
        .into_iter()
        .map(|(feed_type, total)| FeedTypeCount {
            name: display_name(feed_type).to_string(),
            feed_type: feed_type.to_string(),
            total,
            per_day: round_tenth(ratio(total, tracked_days)),
        })
        .collect();
    type_breakdown.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.name.cmp(&b.name)));

    FeedStats {
        total_feeds: feeds.len(),
        tracked_days,
        avg_feeds_per_day: round_tenth(ratio(feeds.len(), tracked_days)),
        avg_gap_minutes,
        type_breakdown,
        daily,
    }
}
