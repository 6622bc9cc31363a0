//! Core type definitions with validation.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors for core types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Event IDs are assigned by the store and are always positive.
    #[error("event ID must be positive, got {value}")]
    NonPositiveId { value: i64 },

    /// An interval whose end is not strictly after its start.
    #[error("end time {end} must be after start time {start}")]
    InvalidInterval { start: String, end: String },

    /// Only SLEEP events may carry an end time.
    #[error("{kind} events cannot have an end time")]
    UnexpectedEndTime { kind: String },

    /// The hour at which a tracking day begins must be a valid clock hour.
    #[error("day start hour must be between 0 and 23, got {hour}")]
    DayStartHour { hour: u32 },
}

/// A validated event identifier.
///
/// IDs are assigned by the store at insert time and never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct EventId(i64);

impl EventId {
    /// Creates a new ID after validation.
    pub const fn new(id: i64) -> Result<Self, ValidationError> {
        if id <= 0 {
            return Err(ValidationError::NonPositiveId { value: id });
        }
        Ok(Self(id))
    }

    /// Returns the raw row ID.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl TryFrom<i64> for EventId {
    type Error = ValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<EventId> for i64 {
    fn from(id: EventId) -> Self {
        id.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
