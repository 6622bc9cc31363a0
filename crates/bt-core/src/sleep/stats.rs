//! Aggregate sleep statistics over a trailing window of tracking days.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{NaiveDate, TimeZone, Timelike};
use serde::Serialize;

use super::classify::{NightClassification, NightConfig, classify_nights};
use super::probability::SleepProbability;
use crate::calendar::{DayCalendar, DayWindow, MINUTES_PER_DAY};
use crate::event::{Interval, RawEvent};
use crate::format::{format_clock, format_duration};
use crate::stats::{median, median_i64, ratio};
use crate::types::EventId;

/// Nap-duration histogram bucket width.
const NAP_BUCKET_MINUTES: i64 = 30;
/// Number of fixed-width nap-duration buckets before the overflow bucket.
const NAP_BUCKETS: i64 = 6;
/// Nap start-time histogram covers `[06:00, 18:00)` in half hours.
const NAP_START_FIRST_HOUR: u32 = 6;
const NAP_START_LAST_HOUR: u32 = 18;

/// Headline sleep numbers for a window.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SleepStats {
    /// Days in the window with at least one completed sleep.
    pub tracked_days: usize,
    pub median_daily_minutes: f64,
    pub median_night_minutes: f64,
    pub median_nap_minutes: f64,
    pub avg_naps_per_day: f64,
    pub median_wake_ups: f64,
    pub longest_stretch_minutes: i64,
    /// Median wake-up clock time in minutes after midnight.
    pub median_wake_time: Option<f64>,
    /// Median bedtime in minutes after midnight; values past midnight exceed 1440.
    pub median_bedtime: Option<f64>,
}

impl SleepStats {
    /// `HH:MM` label for the median wake time, `--:--` when unknown.
    pub fn wake_time_label(&self) -> String {
        self.median_wake_time
            .map_or_else(|| "--:--".to_string(), format_clock)
    }

    /// `HH:MM` label for the median bedtime, `--:--` when unknown.
    pub fn bedtime_label(&self) -> String {
        self.median_bedtime
            .map_or_else(|| "--:--".to_string(), format_clock)
    }

    #[allow(clippy::cast_possible_truncation)]
    pub fn daily_label(&self) -> String {
        format_duration(self.median_daily_minutes.round() as i64)
    }

    #[allow(clippy::cast_possible_truncation)]
    pub fn night_label(&self) -> String {
        format_duration(self.median_night_minutes.round() as i64)
    }

    #[allow(clippy::cast_possible_truncation)]
    pub fn nap_label(&self) -> String {
        format_duration(self.median_nap_minutes.round() as i64)
    }
}

/// Night and nap totals for one tracking day.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySleep {
    pub day: NaiveDate,
    pub night_minutes: i64,
    pub nap_minutes: i64,
    pub nap_count: usize,
}

impl DailySleep {
    pub const fn total_minutes(&self) -> i64 {
        self.night_minutes + self.nap_minutes
    }
}

/// A labelled histogram bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bucket {
    pub label: String,
    pub value: usize,
}

/// Everything derived from one pass over the SLEEP events.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SleepAnalysis {
    /// Night events across the whole input, not just the window.
    pub night_event_ids: BTreeSet<EventId>,
    pub window: DayWindow,
    pub stats: SleepStats,
    /// Per-day breakdown for days in the window, oldest first.
    pub daily: Vec<DailySleep>,
    pub nap_durations: Vec<Bucket>,
    pub nap_start_times: Vec<Bucket>,
    pub probability: SleepProbability,
}

/// Classifies SLEEP events and computes statistics for the tracking days in
/// `window`.
///
/// Classification runs over all events so the returned night IDs are stable
/// regardless of the window; statistics only use completed sleeps whose start
/// falls in the window. Ongoing sessions never contribute to durations.
pub fn process_sleep_stats<Tz: TimeZone>(
    events: &[RawEvent],
    calendar: &DayCalendar<Tz>,
    config: &NightConfig,
    window: DayWindow,
) -> SleepAnalysis {
    let classification = classify_nights(events, calendar, config);

    let in_window: Vec<Interval> = classification
        .completed
        .iter()
        .filter(|iv| window.contains(calendar.day_key(iv.start)))
        .copied()
        .collect();
    let (naps, night_sleeps): (Vec<Interval>, Vec<Interval>) = in_window
        .iter()
        .copied()
        .partition(|iv| !classification.is_night(iv.id));

    let daily = daily_breakdown(&in_window, &classification, calendar);
    let stats = headline_stats(
        &daily,
        &naps,
        &night_sleeps,
        &classification,
        calendar,
        config,
        window,
    );

    let day_start_minutes = i64::from(calendar.day_start().hour() * 60);
    let offsets = in_window.iter().map(|iv| {
        let row_start = calendar.row_start(calendar.day_key(iv.start));
        (
            (iv.start - row_start).num_minutes(),
            (iv.end - row_start).num_minutes(),
        )
    });
    let probability = SleepProbability::from_offsets(offsets, daily.len(), day_start_minutes);

    SleepAnalysis {
        night_event_ids: classification.night_event_ids,
        window,
        stats,
        daily,
        nap_durations: nap_duration_histogram(&naps),
        nap_start_times: nap_start_histogram(&naps, calendar),
        probability,
    }
}

fn daily_breakdown<Tz: TimeZone>(
    intervals: &[Interval],
    classification: &NightClassification,
    calendar: &DayCalendar<Tz>,
) -> Vec<DailySleep> {
    let mut by_day: BTreeMap<NaiveDate, DailySleep> = BTreeMap::new();
    for interval in intervals {
        let day = calendar.day_key(interval.start);
        let entry = by_day.entry(day).or_insert_with(|| DailySleep {
            day,
            ..DailySleep::default()
        });
        if classification.is_night(interval.id) {
            entry.night_minutes += interval.minutes();
        } else {
            entry.nap_minutes += interval.minutes();
            entry.nap_count += 1;
        }
    }
    by_day.into_values().collect()
}

#[allow(clippy::cast_precision_loss)]
fn headline_stats<Tz: TimeZone>(
    daily: &[DailySleep],
    naps: &[Interval],
    night_sleeps: &[Interval],
    classification: &NightClassification,
    calendar: &DayCalendar<Tz>,
    config: &NightConfig,
    window: DayWindow,
) -> SleepStats {
    let nights: Vec<_> = classification
        .nights
        .values()
        .filter(|night| window.contains(night.day))
        .collect();

    let daily_totals: Vec<i64> = daily.iter().map(DailySleep::total_minutes).collect();
    let night_totals: Vec<i64> = nights.iter().map(|n| n.total_minutes()).collect();
    let nap_minutes: Vec<i64> = naps.iter().map(Interval::minutes).collect();
    let wake_ups: Vec<f64> = nights
        .iter()
        .map(|n| n.wake_ups(config.contiguity_gap) as f64)
        .collect();

    let wake_times: Vec<f64> = nights
        .iter()
        .filter_map(|n| n.wake_time(calendar, config))
        .map(|t| f64::from(calendar.clock_minutes(t)))
        .collect();
    let bedtimes: Vec<f64> = nights
        .iter()
        .filter_map(|n| n.bedtime(calendar, config))
        .map(|t| {
            let minutes = i64::from(calendar.clock_minutes(t));
            // after-midnight bedtimes sort after the evening ones
            let minutes = if minutes < MINUTES_PER_DAY / 2 {
                minutes + MINUTES_PER_DAY
            } else {
                minutes
            };
            minutes as f64
        })
        .collect();

    SleepStats {
        tracked_days: daily.len(),
        median_daily_minutes: median_i64(&daily_totals),
        median_night_minutes: median_i64(&night_totals),
        median_nap_minutes: median_i64(&nap_minutes),
        avg_naps_per_day: ratio(naps.len(), daily.len()),
        median_wake_ups: median(&wake_ups),
        longest_stretch_minutes: night_sleeps.iter().map(Interval::minutes).max().unwrap_or(0),
        median_wake_time: (!wake_times.is_empty()).then(|| median(&wake_times)),
        median_bedtime: (!bedtimes.is_empty()).then(|| median(&bedtimes)),
    }
}

fn nap_duration_histogram(naps: &[Interval]) -> Vec<Bucket> {
    let mut buckets: Vec<Bucket> = (0..NAP_BUCKETS)
        .map(|i| {
            let from = i * NAP_BUCKET_MINUTES;
            format!("{from}-{}m", from + NAP_BUCKET_MINUTES - 1)
        })
        .chain(std::iter::once("3h+".to_string()))
        .map(|label| Bucket { label, value: 0 })
        .collect();
    for nap in naps {
        let index = (nap.minutes() / NAP_BUCKET_MINUTES).clamp(0, NAP_BUCKETS);
        if let Some(bucket) = usize::try_from(index).ok().and_then(|i| buckets.get_mut(i)) {
            bucket.value += 1;
        }
    }
    buckets
}

fn nap_start_histogram<Tz: TimeZone>(naps: &[Interval], calendar: &DayCalendar<Tz>) -> Vec<Bucket> {
    let mut buckets: Vec<Bucket> = (NAP_START_FIRST_HOUR..NAP_START_LAST_HOUR)
        .flat_map(|h| [format!("{h}:00"), format!("{h}:30")])
        .map(|label| Bucket { label, value: 0 })
        .collect();
    for nap in naps {
        let time = calendar.local(nap.start).time();
        let hour = time.hour();
        if !(NAP_START_FIRST_HOUR..NAP_START_LAST_HOUR).contains(&hour) {
            continue;
        }
        let index = ((hour - NAP_START_FIRST_HOUR) * 2 + u32::from(time.minute() >= 30)) as usize;
        buckets[index].value += 1;
    }
    buckets
}
