//! Typed per-event payloads.
//!
//! The store keeps payloads as a JSON text column whose shape depends on the
//! event type. Payloads are decoded once at the store boundary into
//! [`EventPayload`]; a payload that fails to parse decodes to the empty payload
//! for its type instead of failing the whole record.

use serde::{Deserialize, Deserializer, Serialize};

use crate::event_type::EventType;

/// Fallback label for feeds whose method was never recorded.
pub const UNKNOWN_FEED_TYPE: &str = "Unknown";

/// Structured data attached to an event, one variant per [`EventType`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EventPayload {
    Sleep(SleepPayload),
    Feed(FeedPayload),
    Diaper(DiaperPayload),
    Weight(WeightPayload),
    Medicine(MedicinePayload),
    Note(NotePayload),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SleepPayload {
    /// How the child fell asleep (rocking, feed, independent).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initiator: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedPayload {
    /// Feed method as shown to the user, e.g. `Bottle`, `Breastfeeding`, `Solid food`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feed_type: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub side: Option<String>,
}

impl FeedPayload {
    /// The feed method, or [`UNKNOWN_FEED_TYPE`] when absent.
    #[must_use]
    pub fn feed_type_or_unknown(&self) -> &str {
        self.feed_type
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(UNKNOWN_FEED_TYPE)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiaperPayload {
    /// `wet`, `dirty` or `mixed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeightPayload {
    #[serde(
        default,
        deserialize_with = "lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

impl WeightPayload {
    /// The weight in kilograms. Amounts in `g` are converted; any other or
    /// missing unit is taken as kilograms.
    #[must_use]
    pub fn kilograms(&self) -> Option<f64> {
        let amount = self.amount?;
        match self.unit.as_deref().map(str::trim) {
            Some(unit) if unit.eq_ignore_ascii_case("g") => Some(amount / 1000.0),
            _ => Some(amount),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicinePayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dose: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotePayload {}

impl EventPayload {
    /// The empty payload for an event type.
    #[must_use]
    pub fn empty(kind: EventType) -> Self {
        match kind {
            EventType::Sleep => Self::Sleep(SleepPayload::default()),
            EventType::Feed => Self::Feed(FeedPayload::default()),
            EventType::Diaper => Self::Diaper(DiaperPayload::default()),
            EventType::Weight => Self::Weight(WeightPayload::default()),
            EventType::Medicine => Self::Medicine(MedicinePayload::default()),
            EventType::Note => Self::Note(NotePayload::default()),
        }
    }

    /// Decodes a stored JSON payload for the given event type.
    ///
    /// Malformed or mistyped JSON yields the empty payload for `kind`.
    pub fn decode(kind: EventType, raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() {
            return Self::empty(kind);
        }
        let decoded = match kind {
            EventType::Sleep => serde_json::from_str(raw).map(Self::Sleep),
            EventType::Feed => serde_json::from_str(raw).map(Self::Feed),
            EventType::Diaper => serde_json::from_str(raw).map(Self::Diaper),
            EventType::Weight => serde_json::from_str(raw).map(Self::Weight),
            EventType::Medicine => serde_json::from_str(raw).map(Self::Medicine),
            EventType::Note => serde_json::from_str(raw).map(Self::Note),
        };
        decoded.unwrap_or_else(|err| {
            tracing::warn!(%kind, error = %err, "malformed event payload, using empty payload");
            Self::empty(kind)
        })
    }

    /// Encodes the payload as the JSON text stored in the `data` column.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// The event type this payload belongs to.
    #[must_use]
    pub const fn kind(&self) -> EventType {
        match self {
            Self::Sleep(_) => EventType::Sleep,
            Self::Feed(_) => EventType::Feed,
            Self::Diaper(_) => EventType::Diaper,
            Self::Weight(_) => EventType::Weight,
            Self::Medicine(_) => EventType::Medicine,
            Self::Note(_) => EventType::Note,
        }
    }

    /// Returns the feed payload, if this is one.
    #[must_use]
    pub const fn as_feed(&self) -> Option<&FeedPayload> {
        match self {
            Self::Feed(feed) => Some(feed),
            _ => None,
        }
    }

    /// Returns the weight payload, if this is one.
    #[must_use]
    pub const fn as_weight(&self) -> Option<&WeightPayload> {
        match self {
            Self::Weight(weight) => Some(weight),
            _ => None,
        }
    }

    /// Sets the quantity for payloads that carry one. Returns false otherwise.
    pub fn set_quantity(&mut self, amount: f64, unit: &str) -> bool {
        let (slot, unit_slot) = match self {
            Self::Feed(feed) => (&mut feed.amount, &mut feed.unit),
            Self::Weight(weight) => (&mut weight.amount, &mut weight.unit),
            _ => return false,
        };
        *slot = Some(amount);
        *unit_slot = Some(unit.to_string());
        true
    }
}

/// Accepts numbers and numeric strings (`"3.25"`); anything else is `None`.
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_feed_type_and_string_amount() {
        let payload = EventPayload::decode(
            EventType::Feed,
            r#"{"feedType":"Bottle","amount":"150","unit":"ml"}"#,
        );
        let feed = payload.as_feed().unwrap();
        assert_eq!(feed.feed_type_or_unknown(), "Bottle");
        assert_eq!(feed.amount, Some(150.0));
        assert_eq!(feed.unit.as_deref(), Some("ml"));
    }

    #[test]
    fn malformed_json_degrades_to_empty_payload() {
        let payload = EventPayload::decode(EventType::Feed, "{not json");
        assert_eq!(payload, EventPayload::empty(EventType::Feed));
        assert_eq!(
            payload.as_feed().unwrap().feed_type_or_unknown(),
            UNKNOWN_FEED_TYPE
        );
    }

    #[test]
    fn mistyped_fields_degrade_to_empty_payload() {
        let payload = EventPayload::decode(EventType::Diaper, r#"{"status": 3}"#);
        assert_eq!(payload, EventPayload::empty(EventType::Diaper));
    }

    #[test]
    fn unparseable_amount_is_absent() {
        let payload = EventPayload::decode(EventType::Weight, r#"{"amount":"heavy","unit":"kg"}"#);
        let EventPayload::Weight(weight) = payload else {
            panic!("expected weight payload");
        };
        assert_eq!(weight.amount, None);
        assert_eq!(weight.unit.as_deref(), Some("kg"));
    }

    #[test]
    fn weight_in_grams_converts_to_kilograms() {
        let grams = EventPayload::decode(EventType::Weight, r#"{"amount":4215,"unit":"g"}"#);
        assert_eq!(grams.as_weight().unwrap().kilograms(), Some(4.215));
        let bare = EventPayload::decode(EventType::Weight, r#"{"amount":"4.2"}"#);
        assert_eq!(bare.as_weight().unwrap().kilograms(), Some(4.2));
        assert_eq!(EventPayload::empty(EventType::Weight).as_weight().unwrap().kilograms(), None);
        assert!(EventPayload::empty(EventType::Note).as_weight().is_none());
    }

    #[test]
    fn encode_skips_absent_fields() {
        let payload = EventPayload::Feed(FeedPayload {
            feed_type: Some("Breastfeeding".into()),
            ..FeedPayload::default()
        });
        assert_eq!(payload.encode().unwrap(), r#"{"feedType":"Breastfeeding"}"#);
        assert_eq!(EventPayload::empty(EventType::Note).encode().unwrap(), "{}");
    }

    #[test]
    fn set_quantity_only_applies_to_quantities() {
        let mut weight = EventPayload::empty(EventType::Weight);
        assert!(weight.set_quantity(4.2, "kg"));
        assert_eq!(weight.encode().unwrap(), r#"{"amount":4.2,"unit":"kg"}"#);
        let mut note = EventPayload::empty(EventType::Note);
        assert!(!note.set_quantity(1.0, "ml"));
    }
}
