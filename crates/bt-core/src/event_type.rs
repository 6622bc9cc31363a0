//! Event type enum as the single source of truth for event type strings.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kinds of events that can be logged for the tracked child.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventType {
    Sleep,
    Feed,
    Diaper,
    Weight,
    Medicine,
    Note,
}

impl EventType {
    /// Every event type, in display order.
    pub const ALL: [Self; 6] = [
        Self::Sleep,
        Self::Feed,
        Self::Diaper,
        Self::Weight,
        Self::Medicine,
        Self::Note,
    ];

    /// String representation for database storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sleep => "SLEEP",
            Self::Feed => "FEED",
            Self::Diaper => "DIAPER",
            Self::Weight => "WEIGHT",
            Self::Medicine => "MEDICINE",
            Self::Note => "NOTE",
        }
    }

    /// Whether events of this type are intervals with an optional end time.
    #[must_use]
    pub const fn has_duration(self) -> bool {
        matches!(self, Self::Sleep)
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = UnknownEventType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SLEEP" => Ok(Self::Sleep),
            "FEED" => Ok(Self::Feed),
            "DIAPER" => Ok(Self::Diaper),
            "WEIGHT" => Ok(Self::Weight),
            "MEDICINE" => Ok(Self::Medicine),
            "NOTE" => Ok(Self::Note),
            _ => Err(UnknownEventType(s.to_string())),
        }
    }
}

impl Serialize for EventType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EventType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Error type for unknown event type strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownEventType(String);

impl fmt::Display for UnknownEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown event type: {}", self.0)
    }
}

impl std::error::Error for UnknownEventType {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_all_variants() {
        for variant in &EventType::ALL {
            let s = variant.to_string();
            let parsed: EventType = s.parse().expect("should parse");
            assert_eq!(parsed, *variant, "roundtrip failed for {variant:?}");
        }
    }

    #[test]
    fn parsing_is_case_insensitive() {
        assert_eq!("sleep".parse::<EventType>().unwrap(), EventType::Sleep);
        assert_eq!(" Feed ".parse::<EventType>().unwrap(), EventType::Feed);
    }

    #[test]
    fn unknown_type_errors() {
        let err = "bath".parse::<EventType>().unwrap_err();
        assert_eq!(err.to_string(), "unknown event type: bath");
    }

    #[test]
    fn only_sleep_has_duration() {
        let with_duration: Vec<_> = EventType::ALL
            .iter()
            .filter(|kind| kind.has_duration())
            .collect();
        assert_eq!(with_duration, vec![&EventType::Sleep]);
    }
}
