//! Diaper change statistics report.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::Result;
use bt_core::format::row_label;
use bt_core::{DayCalendar, DiaperStats, EventType, process_diaper_stats};
use bt_db::Database;
use chrono::{DateTime, TimeZone, Utc};

use super::util::{padded_range, stats_window};

pub fn format_report(stats: &DiaperStats) -> String {
    let mut output = String::new();
    let _ = writeln!(
        output,
        "DIAPERS: {} over {} tracked days",
        stats.total_changes, stats.tracked_days
    );
    if stats.total_changes == 0 {
        let _ = writeln!(output);
        let _ = writeln!(output, "No changes recorded in this period.");
        return output;
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "Per day:  {:.1}", stats.avg_per_day);
    let _ = writeln!(output, "Per week: {:.1}", stats.avg_per_week);

    let _ = writeln!(output);
    let _ = writeln!(output, "BY DAY");
    let _ = writeln!(output, "──────");
    for day in &stats.daily {
        let _ = writeln!(output, "{:<7} {}", row_label(day.day), day.changes);
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "BY WEEK");
    let _ = writeln!(output, "───────");
    for week in &stats.weekly {
        let _ = writeln!(output, "{:<8} {}", week.week, week.changes);
    }

    output
}

pub fn run<W: Write, Tz: TimeZone>(
    writer: &mut W,
    db: &Database,
    calendar: &DayCalendar<Tz>,
    days: u32,
    json: bool,
    now: DateTime<Utc>,
) -> Result<()> {
    let window = stats_window(calendar, now, days);
    let (start, end) = padded_range(calendar, window);
    let events = db.query_events(EventType::Diaper, start, end)?;
    let stats = process_diaper_stats(&events, calendar, window);

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&stats)?)?;
    } else {
        write!(writer, "{}", format_report(&stats))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bt_db::NewEvent;

    fn change(d: u32, h: u32) -> NewEvent {
        NewEvent::new(
            EventType::Diaper,
            Utc.with_ymd_and_hms(2025, 3, d, h, 0, 0).unwrap(),
        )
    }

    #[test]
    fn report_lists_days_and_weeks() {
        let mut db = Database::open_in_memory().unwrap();
        db.insert_events(&[
            change(1, 8),
            change(1, 14),
            change(2, 9),
            change(3, 10),
            change(3, 18),
            change(4, 6),
            // today, outside the window
            change(5, 9),
        ])
        .unwrap();
        let calendar = DayCalendar::seven_am(Utc);
        let mut output = Vec::new();
        run(
            &mut output,
            &db,
            &calendar,
            4,
            false,
            Utc.with_ymd_and_hms(2025, 3, 5, 12, 0, 0).unwrap(),
        )
        .unwrap();

        insta::assert_snapshot!(String::from_utf8(output).unwrap(), @r"
        DIAPERS: 6 over 3 tracked days

        Per day:  2.0
        Per week: 3.0

        BY DAY
        ──────
        Sat 1   2
        Sun 2   1
        Mon 3   3

        BY WEEK
        ───────
        2025-W09 3
        2025-W10 3
        ");
    }

    #[test]
    fn empty_report() {
        let db = Database::open_in_memory().unwrap();
        let calendar = DayCalendar::seven_am(Utc);
        let now = Utc.with_ymd_and_hms(2025, 3, 5, 12, 0, 0).unwrap();

        let mut output = Vec::new();
        run(&mut output, &db, &calendar, 7, false, now).unwrap();
        assert_eq!(
            String::from_utf8(output).unwrap(),
            "DIAPERS: 0 over 0 tracked days\n\nNo changes recorded in this period.\n"
        );

        let mut output = Vec::new();
        run(&mut output, &db, &calendar, 7, true, now).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(value["totalChanges"], 0);
        assert_eq!(value["weekly"], serde_json::json!([]));
    }
}
