//! The 7am day calendar.
//!
//! Every timeline row and every per-day statistic is keyed by a tracking day
//! that starts at the configured hour (07:00 by default) and ends at the same
//! hour the next day, so a single night of sleep is never split across two
//! calendar dates. Clock-time reasoning happens in the calendar's time zone;
//! durations are always absolute.

use chrono::{
    DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc,
};
use serde::Serialize;

use crate::types::ValidationError;

/// Hour at which a tracking day begins unless configured otherwise.
pub const DEFAULT_DAY_START_HOUR: u32 = 7;

/// Minutes in a 24h clock day.
pub const MINUTES_PER_DAY: i64 = 24 * 60;

/// Maps instants to tracking days in a given time zone.
#[derive(Debug, Clone)]
pub struct DayCalendar<Tz: TimeZone> {
    tz: Tz,
    day_start: NaiveTime,
}

impl<Tz: TimeZone> DayCalendar<Tz> {
    /// Creates a calendar whose days begin at `day_start_hour` local time.
    pub fn new(tz: Tz, day_start_hour: u32) -> Result<Self, ValidationError> {
        let day_start = NaiveTime::from_hms_opt(day_start_hour, 0, 0).ok_or(
            ValidationError::DayStartHour {
                hour: day_start_hour,
            },
        )?;
        Ok(Self { tz, day_start })
    }

    /// Creates a calendar using the 07:00 convention.
    pub fn seven_am(tz: Tz) -> Self {
        Self {
            tz,
            day_start: NaiveTime::MIN + Duration::hours(i64::from(DEFAULT_DAY_START_HOUR)),
        }
    }

    /// The configured time zone.
    pub const fn timezone(&self) -> &Tz {
        &self.tz
    }

    /// Local clock time at which each day begins.
    pub const fn day_start(&self) -> NaiveTime {
        self.day_start
    }

    /// Converts an instant to local wall-clock time.
    pub fn local(&self, instant: DateTime<Utc>) -> NaiveDateTime {
        instant.with_timezone(&self.tz).naive_local()
    }

    /// Minutes since local midnight, independent of date.
    pub fn clock_minutes(&self, instant: DateTime<Utc>) -> u32 {
        let time = self.local(instant).time();
        time.hour() * 60 + time.minute()
    }

    /// The tracking day containing `instant`.
    ///
    /// Instants before the day start hour belong to the previous date.
    pub fn day_key(&self, instant: DateTime<Utc>) -> NaiveDate {
        let local = self.local(instant);
        if local.time() < self.day_start {
            local.date().pred_opt().unwrap_or_else(|| local.date())
        } else {
            local.date()
        }
    }

    /// The instant at which the row for `day` begins.
    pub fn row_start(&self, day: NaiveDate) -> DateTime<Utc> {
        self.resolve(day.and_time(self.day_start))
    }

    /// The instant at which the row for `day` ends (the next row's start).
    pub fn row_end(&self, day: NaiveDate) -> DateTime<Utc> {
        day.succ_opt().map_or_else(
            || self.row_start(day) + Duration::days(1),
            |next| self.row_start(next),
        )
    }

    /// Length of the row for `day`: 23h or 25h across a DST change.
    pub fn row_length(&self, day: NaiveDate) -> Duration {
        self.row_end(day) - self.row_start(day)
    }

    /// The instant of a local wall-clock time.
    pub fn at_local(&self, day: NaiveDate, time: NaiveTime) -> DateTime<Utc> {
        self.resolve(day.and_time(time))
    }

    /// Resolves a local wall-clock time to an instant.
    ///
    /// Ambiguous times (DST fall-back) resolve to the earlier instant. Times in
    /// a spring-forward gap move forward by one hour.
    fn resolve(&self, naive: NaiveDateTime) -> DateTime<Utc> {
        match self.tz.from_local_datetime(&naive) {
            LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt.with_timezone(&Utc),
            LocalResult::None => self
                .tz
                .from_local_datetime(&(naive + Duration::hours(1)))
                .earliest()
                .map_or_else(|| Utc.from_utc_datetime(&naive), |dt| dt.with_timezone(&Utc)),
        }
    }
}

/// An inclusive range of tracking days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DayWindow {
    pub first: NaiveDate,
    pub last: NaiveDate,
}

impl DayWindow {
    /// The `days` tracking days ending with `last` (inclusive).
    ///
    /// A zero-day window is empty: it contains no dates.
    #[must_use]
    pub fn trailing(last: NaiveDate, days: u32) -> Self {
        if days == 0 {
            // first > last makes every `contains` check fail
            return Self {
                first: last.succ_opt().unwrap_or(last),
                last,
            };
        }
        let first = last
            .checked_sub_signed(Duration::days(i64::from(days) - 1))
            .unwrap_or(NaiveDate::MIN);
        Self { first, last }
    }

    /// Whether `day` lies inside the window.
    #[must_use]
    pub fn contains(&self, day: NaiveDate) -> bool {
        self.first <= day && day <= self.last
    }

    /// Number of days covered.
    #[must_use]
    pub fn len(&self) -> usize {
        usize::try_from((self.last - self.first).num_days() + 1).unwrap_or(0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
