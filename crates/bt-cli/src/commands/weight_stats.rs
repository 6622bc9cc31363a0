//! Weight report, with percentiles from an optional growth reference table.

use std::fmt::Write as _;
use std::io::{Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use bt_core::weight::GROWTH_WINDOW;
use bt_core::{
    DayCalendar, EventType, GrowthPoint, GrowthReference, WeightStats, process_weight_stats,
};
use bt_db::Database;
use chrono::TimeZone;

use super::import::parse_import_date;

/// Date followed by the P15, P25, P50, P75 and P85 weights.
const REFERENCE_COLUMNS: usize = 6;

/// Loads a growth reference table from CSV.
///
/// Columns are positional: date, then the P15, P25, P50, P75 and P85 weights in
/// kilograms. The first line is a header. Fields may be separated by `;` (then
/// decimal commas are accepted) or `,`. Dates take any form `bt import` accepts.
pub fn load_reference(path: &Path) -> Result<GrowthReference> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let header = raw.lines().next().unwrap_or_default();
    let delimiter = if header.contains(';') { b';' } else { b',' };
    let reference = parse_reference(raw.as_bytes(), delimiter)
        .with_context(|| format!("invalid growth reference {}", path.display()))?;
    tracing::debug!(rows = reference.points().len(), "loaded growth reference");
    Ok(reference)
}

fn parse_reference<R: Read>(reader: R, delimiter: u8) -> Result<GrowthReference> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let mut points = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        // header is line 1
        let line = idx + 2;
        let record = record.with_context(|| format!("invalid CSV on line {line}"))?;
        if record.len() < REFERENCE_COLUMNS {
            tracing::warn!(line, "skipping short growth reference row");
            continue;
        }
        let at = parse_import_date(&record[0])
            .with_context(|| format!("invalid date on line {line}"))?;
        let band = |column: usize| {
            parse_weight(&record[column])
                .with_context(|| format!("invalid weight in column {} on line {line}", column + 1))
        };
        points.push(GrowthPoint {
            at,
            p15: band(1)?,
            p25: band(2)?,
            p50: band(3)?,
            p75: band(4)?,
            p85: band(5)?,
        });
    }
    Ok(GrowthReference::new(points))
}

fn parse_weight(raw: &str) -> Result<f64> {
    Ok(raw.replace(',', ".").parse()?)
}

/// `+N` for gains, plain `N` otherwise.
fn signed(value: i64) -> String {
    if value > 0 {
        format!("+{value}")
    } else {
        value.to_string()
    }
}

pub fn format_report<Tz: TimeZone>(stats: &WeightStats, calendar: &DayCalendar<Tz>) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "WEIGHT: {} weigh-ins", stats.weigh_ins.len());
    let Some(latest) = stats.latest() else {
        let _ = writeln!(output);
        let _ = writeln!(output, "No weights recorded.");
        return output;
    };

    let _ = writeln!(output);
    let _ = writeln!(
        output,
        "Current:       {:.2} kg ({})",
        latest.kilograms,
        calendar.local(latest.at).format("%a %-d %b")
    );
    let _ = writeln!(
        output,
        "Percentile:    {}",
        latest
            .percentile
            .map_or_else(|| "n/a".to_string(), |p| p.to_string())
    );
    if let Some(change) = stats.latest_change_grams {
        let _ = writeln!(output, "Latest change: {} g", signed(change));
    }
    if let Some(growth) = stats.growth {
        let _ = writeln!(
            output,
            "Growth:        {} g/day (over {}d)",
            signed(growth.grams_per_day),
            growth.days
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "HISTORY");
    let _ = writeln!(output, "───────");
    for weigh_in in &stats.weigh_ins {
        let date = calendar.local(weigh_in.at).format("%Y-%m-%d");
        let _ = match weigh_in.percentile {
            Some(percentile) => {
                writeln!(output, "{date}  {:.2} kg  {percentile}", weigh_in.kilograms)
            }
            None => writeln!(output, "{date}  {:.2} kg", weigh_in.kilograms),
        };
    }

    output
}

pub fn run<W: Write, Tz: TimeZone>(
    writer: &mut W,
    db: &Database,
    calendar: &DayCalendar<Tz>,
    reference: Option<&GrowthReference>,
    json: bool,
) -> Result<()> {
    let events = db.events_of_type(EventType::Weight)?;
    let stats = process_weight_stats(&events, reference);
    tracing::debug!(
        weigh_ins = stats.weigh_ins.len(),
        window = GROWTH_WINDOW,
        "computed weight stats"
    );

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&stats)?)?;
    } else {
        write!(writer, "{}", format_report(&stats, calendar))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bt_core::EventPayload;
    use bt_db::NewEvent;
    use chrono::Utc;

    fn weigh_in(d: u32, kg: f64) -> NewEvent {
        let mut data = EventPayload::empty(EventType::Weight);
        data.set_quantity(kg, "kg");
        NewEvent {
            data,
            ..NewEvent::new(
                EventType::Weight,
                Utc.with_ymd_and_hms(2025, 3, d, 12, 0, 0).unwrap(),
            )
        }
    }

    const REFERENCE_CSV: &str = "\
Date;P15;P25;P50;P75;P85
01/03/2025;3,5;3,7;4,0;4,3;4,5
31/03/2025;4,1;4,3;4,6;4,9;5,1
";

    #[test]
    fn reference_accepts_semicolons_and_decimal_commas() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("growth.csv");
        std::fs::write(&path, REFERENCE_CSV).unwrap();

        let reference = load_reference(&path).unwrap();
        assert_eq!(reference.points().len(), 2);
        let first = reference.points()[0];
        assert_eq!(first.at, Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap());
        assert!((first.p25 - 3.7).abs() < 1e-9);
        assert!((first.p85 - 4.5).abs() < 1e-9);
    }

    #[test]
    fn reference_skips_short_rows_and_rejects_bad_weights() {
        let csv = "date,p15,p25,p50,p75,p85\n2025-03-01,3.5,3.7\n2025-03-31,4.1,4.3,4.6,4.9,5.1\n";
        let reference = parse_reference(csv.as_bytes(), b',').unwrap();
        assert_eq!(reference.points().len(), 1);

        let csv = "date,p15,p25,p50,p75,p85\n2025-03-01,3.5,heavy,4.0,4.3,4.5\n";
        let err = parse_reference(csv.as_bytes(), b',').unwrap_err();
        assert_eq!(err.to_string(), "invalid weight in column 3 on line 2");
    }

    #[test]
    fn report_with_reference() {
        let mut db = Database::open_in_memory().unwrap();
        db.insert_events(&[weigh_in(8, 4.2), weigh_in(1, 4.0), weigh_in(15, 4.35)])
            .unwrap();
        let reference = parse_reference(REFERENCE_CSV.as_bytes(), b';').unwrap();
        let calendar = DayCalendar::seven_am(Utc);
        let mut output = Vec::new();
        run(&mut output, &db, &calendar, Some(&reference), false).unwrap();

        insta::assert_snapshot!(String::from_utf8(output).unwrap(), @r"
        WEIGHT: 3 weigh-ins

        Current:       4.35 kg (Sat 15 Mar)
        Percentile:    56%
        Latest change: +150 g
        Growth:        +25 g/day (over 14d)

        HISTORY
        ───────
        2025-03-01  4.00 kg  50%
        2025-03-08  4.20 kg  55%
        2025-03-15  4.35 kg  56%
        ");
    }

    #[test]
    fn report_without_reference_or_weights() {
        let mut db = Database::open_in_memory().unwrap();
        let calendar = DayCalendar::seven_am(Utc);

        let mut output = Vec::new();
        run(&mut output, &db, &calendar, None, false).unwrap();
        assert_eq!(
            String::from_utf8(output).unwrap(),
            "WEIGHT: 0 weigh-ins\n\nNo weights recorded.\n"
        );

        db.insert_event(&weigh_in(1, 4.0)).unwrap();
        let mut output = Vec::new();
        run(&mut output, &db, &calendar, None, true).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(value["weighIns"][0]["kilograms"], 4.0);
        assert!(value["weighIns"][0].get("percentile").is_none());
        assert_eq!(value["latestChangeGrams"], serde_json::Value::Null);
        assert_eq!(value["growth"], serde_json::Value::Null);
    }
}
