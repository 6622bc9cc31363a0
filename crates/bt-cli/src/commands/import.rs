//! Import command for loading historical events from CSV.

use std::io::{Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use bt_core::{EventPayload, EventType, validate_times};
use bt_db::{Database, NewEvent};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::Deserialize;

/// Date-only values are stored at noon UTC so they stay on the same date in
/// every time zone close to UTC.
const DATE_ONLY_HOUR: u32 = 12;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImportRow {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    start_time: Option<String>,
    #[serde(default)]
    end_time: Option<String>,
    #[serde(default)]
    note: Option<String>,
    /// Raw JSON payload.
    #[serde(default)]
    data: Option<String>,
    /// Shorthand quantity: grams for WEIGHT, millilitres for FEED.
    #[serde(default)]
    value: Option<f64>,
}

impl ImportRow {
    /// Converts the row, or `None` when it lacks a type or start time.
    fn into_event(self) -> Result<Option<NewEvent>> {
        let Some(kind) = non_empty(self.kind) else {
            return Ok(None);
        };
        let Some(start) = non_empty(self.start_time) else {
            return Ok(None);
        };
        let kind: EventType = kind.parse()?;
        let start_time = parse_import_date(&start)?;
        let end_time = non_empty(self.end_time)
            .map(|end| parse_import_date(&end))
            .transpose()?;
        validate_times(kind, start_time, end_time)?;

        let mut data = non_empty(self.data)
            .map_or_else(|| EventPayload::empty(kind), |raw| EventPayload::decode(kind, &raw));
        if let Some(value) = self.value {
            let applied = match kind {
                EventType::Weight => data.set_quantity(grams_to_kg(value), "kg"),
                EventType::Feed => data.set_quantity(value, "ml"),
                _ => false,
            };
            if !applied {
                tracing::warn!(%kind, value, "ignoring value column");
            }
        }

        Ok(Some(NewEvent {
            kind,
            start_time,
            end_time,
            note: non_empty(self.note),
            data,
        }))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Kilograms rounded to two decimals.
fn grams_to_kg(grams: f64) -> f64 {
    (grams / 10.0).round() / 100.0
}

/// Parses an import timestamp.
///
/// Accepts RFC 3339, or a date alone as `YYYY-MM-DD`, `YYYY/MM/DD`,
/// `DD-MM-YY`, `DD/MM/YY` (four-digit years also work day-first).
pub fn parse_import_date(s: &str) -> Result<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    let separator = if s.contains('/') { '/' } else { '-' };
    let year_first = s.split(separator).next().is_some_and(|part| part.len() == 4);
    let formats: &[&str] = match (year_first, separator) {
        (true, '/') => &["%Y/%m/%d"],
        (true, _) => &["%Y-%m-%d"],
        (false, '/') => &["%d/%m/%y", "%d/%m/%Y"],
        (false, _) => &["%d-%m-%y", "%d-%m-%Y"],
    };
    let date = formats
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(s, format).ok())
        .with_context(|| format!("unrecognised date: {s}"))?;
    let noon = date
        .and_hms_opt(DATE_ONLY_HOUR, 0, 0)
        .with_context(|| format!("invalid date: {s}"))?;
    Ok(Utc.from_utc_datetime(&noon))
}

/// Parses CSV rows into events, returning them with the number of rows skipped.
fn parse_rows<R: Read>(reader: R) -> Result<(Vec<NewEvent>, usize)> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let mut events = Vec::new();
    let mut skipped = 0;
    for (idx, row) in reader.deserialize::<ImportRow>().enumerate() {
        // header is line 1
        let line = idx + 2;
        let row = row.with_context(|| format!("invalid CSV on line {line}"))?;
        match row
            .into_event()
            .with_context(|| format!("invalid event on line {line}"))?
        {
            Some(event) => events.push(event),
            None => {
                tracing::warn!(line, "skipping row without type or start time");
                skipped += 1;
            }
        }
    }
    Ok((events, skipped))
}

pub fn run<W: Write>(writer: &mut W, db: &mut Database, path: &Path) -> Result<usize> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let (events, skipped) = parse_rows(file)?;
    let inserted = db
        .insert_events(&events)
        .context("failed to store imported events")?;
    writeln!(writer, "Imported {inserted} events ({skipped} skipped)")?;
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_supported_date_shapes() {
        let noon = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        for input in ["2025-03-01", "2025/03/01", "01-03-25", "01/03/25", "01/03/2025"] {
            assert_eq!(parse_import_date(input).unwrap(), noon, "{input}");
        }
        assert_eq!(
            parse_import_date("2025-03-01T20:15:00+01:00").unwrap(),
            Utc.with_ymd_and_hms(2025, 3, 1, 19, 15, 0).unwrap()
        );
        assert!(parse_import_date("March 1st").is_err());
    }

    #[test]
    fn value_column_fills_quantities() {
        let csv = "\
type,startTime,endTime,note,data,value
WEIGHT,01/03/25,,,,4215
FEED,2025-03-01T08:00:00Z,,,\"{\"\"feedType\"\":\"\"Bottle\"\"}\",120
";
        let (events, skipped) = parse_rows(csv.as_bytes()).unwrap();
        assert_eq!(skipped, 0);
        assert_eq!(events[0].kind, EventType::Weight);
        assert_eq!(
            events[0].data.encode().unwrap(),
            r#"{"amount":4.22,"unit":"kg"}"#
        );
        assert_eq!(
            events[1].data.encode().unwrap(),
            r#"{"feedType":"Bottle","amount":120.0,"unit":"ml"}"#
        );
    }

    #[test]
    fn rows_without_type_or_start_are_skipped() {
        let csv = "\
type,startTime,endTime,note,data,value
,2025-03-01,,,,
SLEEP,,,,,
SLEEP,2025-03-01T19:00:00Z,2025-03-02T06:00:00Z,  good night ,,
";
        let (events, skipped) = parse_rows(csv.as_bytes()).unwrap();
        assert_eq!(skipped, 2);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].note.as_deref(), Some("good night"));
        assert!(events[0].end_time.is_some());
    }

    #[test]
    fn invalid_rows_abort_with_line_number() {
        let csv = "\
type,startTime,endTime,note,data,value
SLEEP,2025-03-01T19:00:00Z,2025-03-01T18:00:00Z,,,
";
        let err = parse_rows(csv.as_bytes()).unwrap_err();
        assert_eq!(err.to_string(), "invalid event on line 2");

        let csv = "type,startTime\nNAP,2025-03-01\n";
        assert!(parse_rows(csv.as_bytes()).is_err());
    }

    #[test]
    fn import_is_all_or_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.csv");
        std::fs::write(
            &path,
            "type,startTime,endTime,note,data,value\nDIAPER,2025-03-01,,,,\nNOTE,2025-03-02,,first tooth,,\n",
        )
        .unwrap();
        let mut db = Database::open_in_memory().unwrap();
        let mut output = Vec::new();

        let inserted = run(&mut output, &mut db, &path).unwrap();
        assert_eq!(inserted, 2);
        assert_eq!(
            String::from_utf8(output).unwrap(),
            "Imported 2 events (0 skipped)\n"
        );
        let notes = db.recent_events(Some(EventType::Note), 10).unwrap();
        assert_eq!(notes[0].note.as_deref(), Some("first tooth"));
    }
}
