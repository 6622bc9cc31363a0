//! Sleep probability by time of day.

use serde::Serialize;

use crate::calendar::MINUTES_PER_DAY;
use crate::format::format_clock;

/// Width of one probability slot in minutes.
pub const SLOT_MINUTES: i64 = 5;

/// Number of slots across the 24h row.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub const SLOT_COUNT: usize = (MINUTES_PER_DAY / SLOT_MINUTES) as usize;

/// Points averaged by [`SleepProbability::smoothed`].
const SMOOTHING_WINDOW: usize = 5;

/// One point of the probability curve.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbabilityPoint {
    /// Local clock time at the start of the slot, `HH:MM`.
    pub time: String,
    /// Share of tracked days on which the slot was covered by sleep, in percent.
    /// Overlapping records can push this past 100.
    pub percent: f64,
}

/// Per-slot sleep coverage across the tracked days of a window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SleepProbability {
    /// Minutes after local midnight at which slot 0 begins (the day start).
    pub day_start_minutes: i64,
    pub points: Vec<ProbabilityPoint>,
}

impl SleepProbability {
    /// Builds the curve from `(start, end)` offsets in minutes from each
    /// interval's row start. Offsets past the end of the row are clamped.
    #[allow(clippy::cast_precision_loss)]
    pub fn from_offsets(
        offsets: impl IntoIterator<Item = (i64, i64)>,
        tracked_days: usize,
        day_start_minutes: i64,
    ) -> Self {
        let mut counts = [0_u32; SLOT_COUNT];
        for (start, end) in offsets {
            let start = start.clamp(0, MINUTES_PER_DAY);
            let end = end.clamp(0, MINUTES_PER_DAY);
            if end <= start {
                continue;
            }
            let first = slot_index(start);
            // the slot holding `end` is covered only if the sleep reaches into it
            let last = slot_index(end - 1);
            for count in &mut counts[first..=last] {
                *count += 1;
            }
        }

        let points = counts
            .iter()
            .enumerate()
            .map(|(index, &count)| ProbabilityPoint {
                time: format_clock((day_start_minutes + index as i64 * SLOT_MINUTES) as f64),
                percent: if tracked_days == 0 {
                    0.0
                } else {
                    f64::from(count) / tracked_days as f64 * 100.0
                },
            })
            .collect();

        Self {
            day_start_minutes,
            points,
        }
    }

    /// A circular moving average over neighbouring slots for smoother charts.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn smoothed(&self) -> Self {
        let len = self.points.len();
        let half = SMOOTHING_WINDOW / 2;
        let points = (0..len)
            .map(|i| {
                // (len - 1) * half steps forward is `half` steps back, modulo len
                let sum: f64 = (0..SMOOTHING_WINDOW)
                    .map(|k| self.points[(i + k + (len - 1) * half) % len].percent)
                    .sum();
                ProbabilityPoint {
                    time: self.points[i].time.clone(),
                    percent: sum / SMOOTHING_WINDOW as f64,
                }
            })
            .collect();
        Self {
            day_start_minutes: self.day_start_minutes,
            points,
        }
    }

    /// Coverage of the slot containing `offset` minutes into the row.
    pub fn percent_at(&self, offset: i64) -> f64 {
        self.points
            .get(slot_index(offset.clamp(0, MINUTES_PER_DAY - 1)))
            .map_or(0.0, |p| p.percent)
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
const fn slot_index(offset: i64) -> usize {
    (offset / SLOT_MINUTES) as usize
}
