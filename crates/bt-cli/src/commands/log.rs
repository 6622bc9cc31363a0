//! Log command for recording a single event.

use std::io::Write;

use anyhow::{Context, Result};
use bt_core::payload::{
    DiaperPayload, FeedPayload, MedicinePayload, NotePayload, SleepPayload, WeightPayload,
};
use bt_core::{DayCalendar, EventPayload, EventType};
use bt_db::{Database, NewEvent};
use chrono::{DateTime, TimeZone, Utc};

use super::util::parse_datetime;
use crate::cli::LogArgs;

/// Builds the payload for `args.kind` from the type-specific flags.
pub fn payload_from_args(args: &LogArgs) -> EventPayload {
    match args.kind {
        EventType::Sleep => EventPayload::Sleep(SleepPayload {
            initiator: args.initiator.clone(),
        }),
        EventType::Feed => EventPayload::Feed(FeedPayload {
            feed_type: args.feed_type.clone(),
            amount: args.amount,
            unit: args
                .amount
                .map(|_| args.unit.clone().unwrap_or_else(|| "ml".to_string())),
            side: args.side.clone(),
        }),
        EventType::Diaper => EventPayload::Diaper(DiaperPayload {
            status: args.status.clone(),
        }),
        EventType::Weight => EventPayload::Weight(WeightPayload {
            amount: args.amount,
            unit: args
                .amount
                .map(|_| args.unit.clone().unwrap_or_else(|| "kg".to_string())),
        }),
        EventType::Medicine => EventPayload::Medicine(MedicinePayload {
            name: args.name.clone(),
            dose: args.dose.clone(),
        }),
        EventType::Note => EventPayload::Note(NotePayload {}),
    }
}

pub fn run<W: Write, Tz: TimeZone>(
    writer: &mut W,
    db: &mut Database,
    calendar: &DayCalendar<Tz>,
    args: &LogArgs,
    now: DateTime<Utc>,
) -> Result<()> {
    let start_time = match &args.at {
        Some(at) => parse_datetime(at)?,
        None => now,
    };
    let end_time = args.end.as_deref().map(parse_datetime).transpose()?;

    let event = NewEvent {
        kind: args.kind,
        start_time,
        end_time,
        note: args.note.clone().filter(|n| !n.trim().is_empty()),
        data: payload_from_args(args),
    };
    let id = db
        .insert_event(&event)
        .with_context(|| format!("failed to record {} event", args.kind))?;

    writeln!(
        writer,
        "Logged {} #{id} at {}",
        args.kind,
        calendar.local(start_time).format("%Y-%m-%d %H:%M")
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(kind: EventType) -> LogArgs {
        LogArgs {
            kind,
            at: None,
            end: None,
            note: None,
            feed_type: None,
            amount: None,
            unit: None,
            side: None,
            status: None,
            name: None,
            dose: None,
            initiator: None,
        }
    }

    #[test]
    fn feed_amount_defaults_to_millilitres() {
        let payload = payload_from_args(&LogArgs {
            feed_type: Some("Bottle".to_string()),
            amount: Some(120.0),
            ..args(EventType::Feed)
        });
        assert_eq!(
            payload.encode().unwrap(),
            r#"{"feedType":"Bottle","amount":120.0,"unit":"ml"}"#
        );
    }

    #[test]
    fn weight_without_amount_has_no_unit() {
        let payload = payload_from_args(&args(EventType::Weight));
        assert_eq!(payload.encode().unwrap(), "{}");
    }

    #[test]
    fn log_writes_event_and_confirms() {
        let mut db = Database::open_in_memory().unwrap();
        let calendar = DayCalendar::seven_am(Utc);
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap();
        let mut output = Vec::new();
        run(
            &mut output,
            &mut db,
            &calendar,
            &LogArgs {
                note: Some("big one".to_string()),
                ..args(EventType::Feed)
            },
            now,
        )
        .unwrap();

        assert_eq!(
            String::from_utf8(output).unwrap(),
            "Logged FEED #1 at 2025-03-01 09:30\n"
        );
        let stored = db.recent_events(Some(EventType::Feed), 1).unwrap();
        assert_eq!(stored[0].note.as_deref(), Some("big one"));
    }
}
