//! Feeding statistics report.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::Result;
use bt_core::format::row_label;
use bt_core::{DayCalendar, EventType, FeedStats, process_feed_stats};
use bt_db::Database;
use chrono::{DateTime, TimeZone, Utc};

use super::util::{padded_range, stats_window};

pub fn format_report(stats: &FeedStats) -> String {
    let mut output = String::new();
    let _ = writeln!(
        output,
        "FEEDS: {} over {} tracked days",
        stats.total_feeds, stats.tracked_days
    );
    if stats.total_feeds == 0 {
        let _ = writeln!(output);
        let _ = writeln!(output, "No feeds recorded in this period.");
        return output;
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "Per day:     {:.1}", stats.avg_feeds_per_day);
    let _ = writeln!(output, "Average gap: {}", stats.gap_label());

    let _ = writeln!(output);
    let _ = writeln!(output, "BY TYPE");
    let _ = writeln!(output, "───────");
    for entry in &stats.type_breakdown {
        let _ = writeln!(
            output,
            "{:<12} {:>4} ({:.1}/day)",
            entry.name, entry.total, entry.per_day
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "BY DAY");
    let _ = writeln!(output, "──────");
    for day in &stats.daily {
        let _ = writeln!(output, "{:<7} {}", row_label(day.day), day.feeds);
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
    let events = db.query_events(EventType::Feed, start, end)?;
    let stats = process_feed_stats(&events, calendar, window);

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&stats)?)?;
    } else {
        write!(writer, "{}", format_report(&stats))?;
    }
    Ok(())
}
