//! Events command for querying the local `SQLite` database.
//!
//! This module outputs events as JSONL for debugging and export.

use std::io::Write;

use anyhow::Result;
use bt_core::EventType;
use bt_db::Database;
use chrono::{DateTime, Utc};

/// Writes events as JSONL, newest first.
///
/// Without a time range this prints the most recent events. With one, every
/// selected type is queried over the range and the results are merged.
pub fn run<W: Write>(
    writer: &mut W,
    db: &Database,
    kind: Option<EventType>,
    after: Option<DateTime<Utc>>,
    before: Option<DateTime<Utc>>,
    limit: usize,
) -> Result<()> {
    let events = if after.is_none() && before.is_none() {
        db.recent_events(kind, limit)?
    } else {
        let start = after.unwrap_or(DateTime::<Utc>::MIN_UTC);
        let end = before.unwrap_or(DateTime::<Utc>::MAX_UTC);
        let kinds = kind.map_or_else(|| EventType::ALL.to_vec(), |k| vec![k]);
        let mut events = Vec::new();
        for kind in kinds {
            events.extend(db.query_events(kind, start, end)?);
        }
        events.sort_by_key(|e| std::cmp::Reverse((e.start_time, e.id)));
        events.truncate(limit);
        events
    };

    for event in events {
        let json = serde_json::to_string(&event)?;
        writeln!(writer, "{json}")?;
    }

    Ok(())
}
