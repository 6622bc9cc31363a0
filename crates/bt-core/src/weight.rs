//! Weight statistics: latest change and windowed growth rate.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::event::RawEvent;
use crate::event_type::EventType;
use crate::growth::{GrowthReference, Percentile};
use crate::types::EventId;

/// Weigh-ins spanned by the growth rate, the latest included.
pub const GROWTH_WINDOW: usize = 5;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// One weigh-in with a usable amount.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeighIn {
    pub event_id: EventId,
    pub at: DateTime<Utc>,
    pub kilograms: f64,
    /// Position on the growth reference, when one is loaded and covers `at`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentile: Option<Percentile>,
}

/// Average gain per day between two weigh-ins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrowthRate {
    /// Whole days between the two weigh-ins.
    pub days: i64,
    pub grams_per_day: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightStats {
    /// Oldest first.
    pub weigh_ins: Vec<WeighIn>,
    /// Latest weigh-in minus the one before, in whole grams.
    pub latest_change_grams: Option<i64>,
    /// Rate over the last [`GROWTH_WINDOW`] weigh-ins. `None` with fewer than
    /// two, or when they fall within half a day of each other.
    pub growth: Option<GrowthRate>,
}

impl WeightStats {
    pub fn latest(&self) -> Option<&WeighIn> {
        self.weigh_ins.last()
    }
}

/// Computes weight statistics over every WEIGHT event with a start time and
/// an amount. Events without an amount are skipped.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn process_weight_stats(
    events: &[RawEvent],
    reference: Option<&GrowthReference>,
) -> WeightStats {
    let mut weighed: Vec<(&RawEvent, DateTime<Utc>, f64)> = events
        .iter()
        .filter(|e| e.kind == EventType::Weight)
        .filter_map(|e| {
            let kilograms = e.data.as_weight()?.kilograms()?;
            Some((e, e.start_time?, kilograms))
        })
        .collect();
    weighed.sort_by_key(|(e, at, _)| (*at, e.id));

    let weigh_ins: Vec<WeighIn> = weighed
        .into_iter()
        .map(|(event, at, kilograms)| WeighIn {
            event_id: event.id,
            at,
            kilograms,
            percentile: reference.and_then(|r| r.percentile(kilograms, at)),
        })
        .collect();

    let latest_change_grams = match weigh_ins.as_slice() {
        [.., previous, latest] => Some(grams(latest.kilograms - previous.kilograms).round() as i64),
        _ => None,
    };

    let growth = weigh_ins.last().and_then(|latest| {
        let past = &weigh_ins[weigh_ins.len().saturating_sub(GROWTH_WINDOW)];
        let days = ((latest.at - past.at).num_milliseconds() as f64 / MILLIS_PER_DAY).round() as i64;
        (days > 0).then(|| GrowthRate {
            days,
            grams_per_day: (grams(latest.kilograms - past.kilograms) / days as f64).round() as i64,
        })
    });

    WeightStats {
        weigh_ins,
        latest_change_grams,
        growth,
    }
}

fn grams(kilograms: f64) -> f64 {
    kilograms * 1000.0
}
