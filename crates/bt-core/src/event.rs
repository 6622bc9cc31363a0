//! Raw events as delivered by the store.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::event_type::EventType;
use crate::payload::EventPayload;
use crate::types::{EventId, ValidationError};

/// One row from the event store.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEvent {
    /// Unique identifier, assigned at insert.
    pub id: EventId,
    /// The kind of event.
    #[serde(rename = "type")]
    pub kind: EventType,
    /// When the event started. `None` when the stored value could not be parsed;
    /// such events cannot be bucketed and are skipped by every derived view.
    pub start_time: Option<DateTime<Utc>>,
    /// When a SLEEP event ended. Absent means the session is ongoing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    /// Free text entered by the user.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Type-specific payload.
    pub data: EventPayload,
}

impl RawEvent {
    /// Whether this is a SLEEP event without an end time.
    #[must_use]
    pub const fn is_ongoing(&self) -> bool {
        matches!(self.kind, EventType::Sleep) && self.end_time.is_none()
    }

    /// Duration in whole minutes for completed events with a valid interval.
    #[must_use]
    pub fn duration_minutes(&self) -> Option<i64> {
        let start = self.start_time?;
        let end = self.end_time?;
        (end > start).then(|| (end - start).num_minutes())
    }
}

/// A completed, well-formed interval extracted from a [`RawEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub id: EventId,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Interval {
    /// Extracts the interval of a completed event.
    ///
    /// Returns `None` for ongoing events, events without a start, and
    /// zero-length or inverted intervals.
    pub fn from_event(event: &RawEvent) -> Option<Self> {
        let start = event.start_time?;
        let end = event.end_time?;
        if end <= start {
            tracing::debug!(id = %event.id, %start, %end, "skipping non-positive interval");
            return None;
        }
        Some(Self {
            id: event.id,
            start,
            end,
        })
    }

    /// Duration in whole minutes.
    #[must_use]
    pub fn minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }
}

/// Checks the interval invariant for a new or edited event.
pub fn validate_times(
    kind: EventType,
    start: DateTime<Utc>,
    end: Option<DateTime<Utc>>,
) -> Result<(), ValidationError> {
    let Some(end) = end else {
        return Ok(());
    };
    if !kind.has_duration() {
        return Err(ValidationError::UnexpectedEndTime {
            kind: kind.to_string(),
        });
    }
    if end <= start {
        return Err(ValidationError::InvalidInterval {
            start: start.to_rfc3339(),
            end: end.to_rfc3339(),
        });
    }
    Ok(())
}

/// Sorts events by start time ascending, breaking ties by ID.
///
/// Events without a start time sort first so callers can skip them in one pass.
pub fn sort_chronologically(events: &mut [RawEvent]) {
    events.sort_by_key(|e| (e.start_time, e.id));
}
