//! Night/nap classification.
//!
//! # Algorithm Summary
//!
//! 1. Extract completed, well-formed SLEEP intervals and sort them by start.
//! 2. Group intervals by the tracking day (7am-to-7am) containing their start.
//! 3. In each day, the anchor is the longest interval that touches the night
//!    period, i.e. starts outside the daytime window `[06:00, 21:00)` or runs
//!    past its end. A day with no such interval has no night.
//! 4. Grow the night block outward from the anchor: a neighbouring interval
//!    joins when it starts outside the daytime window or when the gap between
//!    the two is at most the contiguity threshold. The chain stops at the
//!    first neighbour that does neither.
//! 5. Every other interval in the day is a nap.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};

use crate::calendar::DayCalendar;
use crate::event::{Interval, RawEvent};
use crate::event_type::EventType;
use crate::types::EventId;

/// Tunables for night detection and night-level statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NightConfig {
    /// Start of the daytime window; sleeps starting inside it are naps unless
    /// stitched into a night.
    pub day_window_start: NaiveTime,
    /// End of the daytime window (exclusive).
    pub day_window_end: NaiveTime,
    /// Largest gap between two sleeps that still counts as one continuous block.
    pub contiguity_gap: Duration,
    /// Bedtime is taken from night sleeps starting at or after this time.
    pub evening_cutoff: NaiveTime,
    /// Wake time is taken from night sleeps ending at or after this time.
    pub morning_cutoff: NaiveTime,
}

impl Default for NightConfig {
    fn default() -> Self {
        Self {
            day_window_start: hm(6, 0),
            day_window_end: hm(21, 0),
            contiguity_gap: Duration::zero(),
            evening_cutoff: hm(18, 0),
            morning_cutoff: hm(6, 0),
        }
    }
}

impl NightConfig {
    /// Default configuration with a custom contiguity threshold in minutes.
    #[must_use]
    pub fn with_gap_minutes(minutes: u32) -> Self {
        Self {
            contiguity_gap: Duration::minutes(i64::from(minutes)),
            ..Self::default()
        }
    }
}

fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN)
}

/// The sleeps making up one night, in start order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Night {
    /// The tracking day the night belongs to (the evening's date).
    pub day: NaiveDate,
    pub sessions: Vec<Interval>,
}

impl Night {
    /// Total night sleep in minutes.
    pub fn total_minutes(&self) -> i64 {
        self.sessions.iter().map(Interval::minutes).sum()
    }

    /// Longest single night interval in minutes.
    pub fn longest_minutes(&self) -> i64 {
        self.sessions.iter().map(Interval::minutes).max().unwrap_or(0)
    }

    /// Number of times the child woke and fell asleep again.
    ///
    /// Sleeps separated by no more than `contiguity_gap` are one block, so
    /// back-to-back records do not count as a wake-up.
    pub fn wake_ups(&self, contiguity_gap: Duration) -> usize {
        self.sessions
            .windows(2)
            .filter(|pair| pair[1].start - pair[0].end > contiguity_gap)
            .count()
    }

    /// Final wake-up: the first night end at or after the morning cutoff on
    /// the following date, or the latest end when the child was up earlier.
    pub fn wake_time<Tz: TimeZone>(
        &self,
        calendar: &DayCalendar<Tz>,
        config: &NightConfig,
    ) -> Option<DateTime<Utc>> {
        let next = self.day.succ_opt()?;
        let cutoff = calendar.at_local(next, config.morning_cutoff);
        self.sessions
            .iter()
            .map(|s| s.end)
            .filter(|end| *end >= cutoff)
            .min()
            .or_else(|| self.sessions.iter().map(|s| s.end).max())
    }

    /// Bedtime: the last night start between the evening cutoff and midnight,
    /// or the first start when the night began after midnight.
    pub fn bedtime<Tz: TimeZone>(
        &self,
        calendar: &DayCalendar<Tz>,
        config: &NightConfig,
    ) -> Option<DateTime<Utc>> {
        let evening = calendar.at_local(self.day, config.evening_cutoff);
        let midnight = calendar.at_local(self.day.succ_opt()?, NaiveTime::MIN);
        self.sessions
            .iter()
            .map(|s| s.start)
            .filter(|start| *start >= evening && *start < midnight)
            .max()
            .or_else(|| self.sessions.first().map(|s| s.start))
    }
}

/// Result of classifying a set of SLEEP events.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NightClassification {
    /// The definitive set of night sleep events.
    pub night_event_ids: BTreeSet<EventId>,
    /// Night blocks keyed by tracking day.
    pub nights: BTreeMap<NaiveDate, Night>,
    /// Completed, well-formed sleeps in start order.
    pub completed: Vec<Interval>,
}

impl NightClassification {
    pub fn is_night(&self, id: EventId) -> bool {
        self.night_event_ids.contains(&id)
    }
}

/// Classifies completed SLEEP events into night sleep and naps.
///
/// Input order does not matter. Ongoing, start-less and non-positive
/// intervals are ignored; events of other types are skipped.
pub fn classify_nights<Tz: TimeZone>(
    events: &[RawEvent],
    calendar: &DayCalendar<Tz>,
    config: &NightConfig,
) -> NightClassification {
    let mut completed: Vec<Interval> = events
        .iter()
        .filter(|e| e.kind == EventType::Sleep)
        .filter_map(Interval::from_event)
        .collect();
    completed.sort_by_key(|iv| (iv.start, iv.id));

    let mut by_day: BTreeMap<NaiveDate, Vec<Interval>> = BTreeMap::new();
    for interval in &completed {
        by_day
            .entry(calendar.day_key(interval.start))
            .or_default()
            .push(*interval);
    }

    let mut night_event_ids = BTreeSet::new();
    let mut nights = BTreeMap::new();
    for (day, group) in by_day {
        let Some((first, last)) = night_span(&group, calendar, config) else {
            continue;
        };
        let sessions = group[first..=last].to_vec();
        night_event_ids.extend(sessions.iter().map(|s| s.id));
        nights.insert(day, Night { day, sessions });
    }

    tracing::debug!(
        completed = completed.len(),
        nights = nights.len(),
        night_sleeps = night_event_ids.len(),
        "classified sleep events"
    );

    NightClassification {
        night_event_ids,
        nights,
        completed,
    }
}

/// Index range of the night block within one day's sorted intervals.
fn night_span<Tz: TimeZone>(
    group: &[Interval],
    calendar: &DayCalendar<Tz>,
    config: &NightConfig,
) -> Option<(usize, usize)> {
    let (anchor, _) = group
        .iter()
        .enumerate()
        .filter(|(_, iv)| touches_night(iv, calendar, config))
        .max_by_key(|(_, iv)| (iv.end - iv.start, Reverse(iv.start), Reverse(iv.id)))?;

    let mut first = anchor;
    while first > 0 && joins(&group[first - 1], &group[first], &group[first - 1], calendar, config)
    {
        first -= 1;
    }
    let mut last = anchor;
    while last + 1 < group.len()
        && joins(&group[last], &group[last + 1], &group[last + 1], calendar, config)
    {
        last += 1;
    }
    Some((first, last))
}

/// Whether `candidate` extends the block that `earlier`/`later` straddle.
fn joins<Tz: TimeZone>(
    earlier: &Interval,
    later: &Interval,
    candidate: &Interval,
    calendar: &DayCalendar<Tz>,
    config: &NightConfig,
) -> bool {
    starts_at_night(candidate, calendar, config) || later.start - earlier.end <= config.contiguity_gap
}

fn starts_at_night<Tz: TimeZone>(
    interval: &Interval,
    calendar: &DayCalendar<Tz>,
    config: &NightConfig,
) -> bool {
    let time = calendar.local(interval.start).time();
    time < config.day_window_start || time >= config.day_window_end
}

fn touches_night<Tz: TimeZone>(
    interval: &Interval,
    calendar: &DayCalendar<Tz>,
    config: &NightConfig,
) -> bool {
    if starts_at_night(interval, calendar, config) {
        return true;
    }
    let start_date = calendar.local(interval.start).date();
    interval.end > calendar.at_local(start_date, config.day_window_end)
}
