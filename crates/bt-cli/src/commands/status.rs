//! Status command for showing the tracker's current state.

use std::io::Write;

use anyhow::Result;
use bt_core::DayCalendar;
use bt_core::format::{format_duration, format_time};
use bt_db::Database;
use chrono::{DateTime, TimeZone, Utc};

use crate::Config;

pub fn run<W: Write, Tz: TimeZone>(
    writer: &mut W,
    db: &Database,
    config: &Config,
    calendar: &DayCalendar<Tz>,
    now: DateTime<Utc>,
) -> Result<()> {
    let timezone = iana_time_zone::get_timezone().unwrap_or_else(|_| "UTC".to_string());

    writeln!(writer, "Baby tracker status")?;
    writeln!(writer, "Database: {}", config.database_path.display())?;
    writeln!(writer, "Time zone: {timezone}")?;
    writeln!(writer, "Day starts: {}", calendar.day_start().format("%H:%M"))?;

    match db.active_sleep()? {
        Some(sleep) => {
            let started = sleep.start_time.unwrap_or(now);
            writeln!(
                writer,
                "Sleeping since {} ({})",
                format_time(calendar, started),
                format_duration((now - started).num_minutes())
            )?;
        }
        None => writeln!(writer, "Awake")?,
    }

    let counts = db.counts_by_type()?;
    if counts.is_empty() {
        writeln!(writer, "No events recorded.")?;
        return Ok(());
    }

    writeln!(writer, "Events:")?;
    for entry in counts {
        writeln!(writer, "- {}: {}", entry.kind, entry.count)?;
    }

    Ok(())
}
