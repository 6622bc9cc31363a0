//! Diaper change statistics.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, TimeZone};
use serde::Serialize;

use crate::calendar::{DayCalendar, DayWindow};
use crate::event::RawEvent;
use crate::event_type::EventType;
use crate::stats::{ratio, round_tenth};
use crate::timeline::bucket_by_day;

/// Most recent days kept in [`DiaperStats::daily`].
pub const DAILY_SERIES_DAYS: usize = 7;

/// Most recent weeks kept in [`DiaperStats::weekly`].
pub const WEEKLY_SERIES_WEEKS: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyChanges {
    pub day: NaiveDate,
    pub changes: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeeklyChanges {
    /// ISO week of the tracking days, e.g. `2025-W09`.
    pub week: String,
    pub changes: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiaperStats {
    pub total_changes: usize,
    /// Days in the window with at least one change.
    pub tracked_days: usize,
    /// Changes per tracked day, rounded to one decimal.
    pub avg_per_day: f64,
    /// Changes per ISO week with at least one change, rounded to one decimal.
    pub avg_per_week: f64,
    /// Changes per tracking day, oldest first, last [`DAILY_SERIES_DAYS`] only.
    pub daily: Vec<DailyChanges>,
    /// Changes per ISO week, oldest first, last [`WEEKLY_SERIES_WEEKS`] only.
    pub weekly: Vec<WeeklyChanges>,
}

/// Computes change counts over the DIAPER events whose start falls in `window`.
pub fn process_diaper_stats<Tz: TimeZone>(
    events: &[RawEvent],
    calendar: &DayCalendar<Tz>,
    window: DayWindow,
) -> DiaperStats {
    let diapers: Vec<&RawEvent> = events
        .iter()
        .filter(|e| e.kind == EventType::Diaper)
        .filter(|e| e.start_time.is_some_and(|t| window.contains(calendar.day_key(t))))
        .collect();

    let by_day = bucket_by_day(diapers.iter().copied(), calendar);
    let mut by_week: BTreeMap<(i32, u32), usize> = BTreeMap::new();
    for (day, changes) in &by_day {
        let week = day.iso_week();
        *by_week.entry((week.year(), week.week())).or_default() += changes.len();
    }

    let daily: Vec<DailyChanges> = by_day
        .iter()
        .map(|(day, changes)| DailyChanges {
            day: *day,
            changes: changes.len(),
        })
        .collect();
    let weekly: Vec<WeeklyChanges> = by_week
        .into_iter()
        .map(|((year, week), changes)| WeeklyChanges {
            week: format!("{year}-W{week:02}"),
            changes,
        })
        .collect();

    let total_changes = diapers.len();
    DiaperStats {
        total_changes,
        tracked_days: daily.len(),
        avg_per_day: round_tenth(ratio(total_changes, daily.len())),
        avg_per_week: round_tenth(ratio(total_changes, weekly.len())),
        daily: keep_last(daily, DAILY_SERIES_DAYS),
        weekly: keep_last(weekly, WEEKLY_SERIES_WEEKS),
    }
}

fn keep_last<T>(mut items: Vec<T>, keep: usize) -> Vec<T> {
    let skip = items.len().saturating_sub(keep);
    items.drain(..skip);
    items
}
