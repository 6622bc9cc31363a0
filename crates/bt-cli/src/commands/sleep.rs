//! Sleep toggle: one command to fall asleep and wake up.

use std::io::Write;

use anyhow::Result;
use bt_core::DayCalendar;
use bt_core::format::{format_duration, format_time};
use bt_db::{Database, SleepToggle};
use chrono::{DateTime, TimeZone, Utc};

pub fn run<W: Write, Tz: TimeZone>(
    writer: &mut W,
    db: &mut Database,
    calendar: &DayCalendar<Tz>,
    at: DateTime<Utc>,
) -> Result<()> {
    match db.toggle_sleep(at)? {
        SleepToggle::Started(event) => {
            writeln!(writer, "Sleep #{} started at {}", event.id, format_time(calendar, at))?;
        }
        SleepToggle::Ended(event) => {
            writeln!(
                writer,
                "Sleep #{} ended at {} ({})",
                event.id,
                format_time(calendar, at),
                format_duration(event.duration_minutes().unwrap_or(0))
            )?;
        }
    }
    Ok(())
}
