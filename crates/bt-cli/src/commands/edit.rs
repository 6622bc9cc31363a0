//! Edit and delete commands.

use std::io::Write;

use anyhow::{Context, Result};
use bt_core::{EventId, EventPayload};
use bt_db::{Database, EventPatch};

use super::util::parse_datetime;
use crate::cli::EditArgs;

/// Turns the edit flags into a patch against the stored `payload`.
pub fn patch_from_args(args: &EditArgs, payload: &EventPayload) -> Result<EventPatch> {
    let start_time = args.start.as_deref().map(parse_datetime).transpose()?;
    let end_time = if args.reopen {
        Some(None)
    } else {
        args.end
            .as_deref()
            .map(parse_datetime)
            .transpose()?
            .map(Some)
    };
    let note = if args.clear_note {
        Some(None)
    } else {
        args.note.clone().map(Some)
    };

    let mut data = payload.clone();
    let mut data_changed = false;
    if let Some(amount) = args.amount {
        let unit = match &data {
            EventPayload::Feed(feed) => feed.unit.clone().unwrap_or_else(|| "ml".to_string()),
            EventPayload::Weight(weight) => weight.unit.clone().unwrap_or_else(|| "kg".to_string()),
            other => anyhow::bail!("{} events have no amount", other.kind()),
        };
        data.set_quantity(amount, &unit);
        data_changed = true;
    }
    if let Some(feed_type) = &args.feed_type {
        let kind = data.kind();
        let EventPayload::Feed(feed) = &mut data else {
            anyhow::bail!("{kind} events have no feed type");
        };
        feed.feed_type = Some(feed_type.clone());
        data_changed = true;
    }

    Ok(EventPatch {
        start_time,
        end_time,
        note,
        data: data_changed.then_some(data),
    })
}

pub fn run<W: Write>(writer: &mut W, db: &mut Database, args: &EditArgs) -> Result<()> {
    let id = EventId::new(args.id)?;
    let current = db
        .get_event(id)?
        .with_context(|| format!("event {id} not found"))?;
    let patch = patch_from_args(args, &current.data)?;
    let updated = db
        .update_event(id, &patch)
        .with_context(|| format!("failed to update event {id}"))?;
    writeln!(writer, "Updated {} #{id}", updated.kind)?;
    Ok(())
}

pub fn delete<W: Write>(writer: &mut W, db: &mut Database, id: i64) -> Result<()> {
    let id = EventId::new(id)?;
    db.delete_event(id)
        .with_context(|| format!("failed to delete event {id}"))?;
    writeln!(writer, "Deleted event #{id}")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bt_core::EventType;
    use bt_db::NewEvent;
    use chrono::{TimeZone, Utc};

    fn args(id: i64) -> EditArgs {
        EditArgs {
            id,
            start: None,
            end: None,
            reopen: false,
            note: None,
            clear_note: false,
            amount: None,
            feed_type: None,
        }
    }

    #[test]
    fn amount_keeps_existing_unit() {
        let payload = EventPayload::decode(EventType::Feed, r#"{"feedType":"Bottle","unit":"oz"}"#);
        let patch = patch_from_args(
            &EditArgs {
                amount: Some(4.0),
                ..args(1)
            },
            &payload,
        )
        .unwrap();
        let data = patch.data.unwrap();
        assert_eq!(data.encode().unwrap(), r#"{"feedType":"Bottle","amount":4.0,"unit":"oz"}"#);
        assert!(patch.start_time.is_none());
        assert!(patch.end_time.is_none());
    }

    #[test]
    fn feed_type_rejected_for_other_payloads() {
        let payload = EventPayload::empty(EventType::Diaper);
        let err = patch_from_args(
            &EditArgs {
                feed_type: Some("Bottle".to_string()),
                ..args(1)
            },
            &payload,
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "DIAPER events have no feed type");
    }

    #[test]
    fn reopen_and_clear_note_patch_to_none() {
        let patch = patch_from_args(
            &EditArgs {
                reopen: true,
                clear_note: true,
                ..args(1)
            },
            &EventPayload::empty(EventType::Sleep),
        )
        .unwrap();
        assert_eq!(patch.end_time, Some(None));
        assert_eq!(patch.note, Some(None));
        assert!(patch.data.is_none());
    }

    #[test]
    fn edit_and_delete_round_trip() {
        let mut db = Database::open_in_memory().unwrap();
        let start = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
        db.insert_event(&NewEvent::new(EventType::Feed, start)).unwrap();
        let mut output = Vec::new();

        run(
            &mut output,
            &mut db,
            &EditArgs {
                note: Some("spat up".to_string()),
                ..args(1)
            },
        )
        .unwrap();
        delete(&mut output, &mut db, 1).unwrap();
        assert!(delete(&mut output, &mut db, 1).is_err());

        insta::assert_snapshot!(String::from_utf8(output).unwrap(), @r"
        Updated FEED #1
        Deleted event #1
        ");
    }
}
