//! Sleep statistics report.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::Result;
use bt_core::format::{format_duration, row_label};
use bt_core::sleep::SleepProbability;
use bt_core::{DayCalendar, EventType, NightConfig, SleepAnalysis, process_sleep_stats};
use bt_db::Database;
use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;

use super::util::{padded_range, stats_window};

/// JSON shape of the report: the analysis plus the smoothed curve.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SleepReport<'a> {
    #[serde(flatten)]
    analysis: &'a SleepAnalysis,
    smoothed_probability: SleepProbability,
}

/// Loads the SLEEP events around the window and analyses them.
pub fn analyse<Tz: TimeZone>(
    db: &Database,
    calendar: &DayCalendar<Tz>,
    config: &NightConfig,
    days: u32,
    now: DateTime<Utc>,
) -> Result<SleepAnalysis> {
    let window = stats_window(calendar, now, days);
    let (start, end) = padded_range(calendar, window);
    let events = db.query_events(EventType::Sleep, start, end)?;
    tracing::debug!(events = events.len(), first = %window.first, last = %window.last, "loaded sleep events");
    Ok(process_sleep_stats(&events, calendar, config, window))
}

pub fn format_report(analysis: &SleepAnalysis) -> String {
    let mut output = String::new();
    let stats = &analysis.stats;
    let _ = writeln!(
        output,
        "SLEEP: {} to {} ({} days, {} tracked)",
        analysis.window.first,
        analysis.window.last,
        analysis.window.len(),
        stats.tracked_days
    );

    if stats.tracked_days == 0 {
        let _ = writeln!(output);
        let _ = writeln!(output, "No completed sleep in this period.");
        return output;
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "SUMMARY");
    let _ = writeln!(output, "───────");
    let _ = writeln!(output, "Daily total:     {}", stats.daily_label());
    let _ = writeln!(output, "Night sleep:     {}", stats.night_label());
    let _ = writeln!(
        output,
        "Naps:            {} ({:.1} per day)",
        stats.nap_label(),
        stats.avg_naps_per_day
    );
    let _ = writeln!(output, "Night wake-ups:  {:.1}", stats.median_wake_ups);
    let _ = writeln!(
        output,
        "Longest stretch: {}",
        format_duration(stats.longest_stretch_minutes)
    );
    let _ = writeln!(output, "Wake time:       {}", stats.wake_time_label());
    let _ = writeln!(output, "Bedtime:         {}", stats.bedtime_label());

    let _ = writeln!(output);
    let _ = writeln!(output, "BY DAY");
    let _ = writeln!(output, "──────");
    for day in &analysis.daily {
        let _ = writeln!(
            output,
            "{:<7} night {:<8} naps {:<8} ({})",
            row_label(day.day),
            format_duration(day.night_minutes),
            format_duration(day.nap_minutes),
            day.nap_count
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "NAP LENGTHS");
    let _ = writeln!(output, "───────────");
    for bucket in analysis.nap_durations.iter().filter(|b| b.value > 0) {
        let _ = writeln!(output, "{:<8} {}", bucket.label, "#".repeat(bucket.value));
    }

    output
}

pub fn run<W: Write, Tz: TimeZone>(
    writer: &mut W,
    db: &Database,
    calendar: &DayCalendar<Tz>,
    config: &NightConfig,
    days: u32,
    json: bool,
    now: DateTime<Utc>,
) -> Result<()> {
    let analysis = analyse(db, calendar, config, days, now)?;
    if json {
        let report = SleepReport {
            analysis: &analysis,
            smoothed_probability: analysis.probability.smoothed(),
        };
        writeln!(writer, "{}", serde_json::to_string_pretty(&report)?)?;
    } else {
        write!(writer, "{}", format_report(&analysis))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bt_db::NewEvent;

    fn at(d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, d, h, min, 0).unwrap()
    }

    fn sleep(start: DateTime<Utc>, end: DateTime<Utc>) -> NewEvent {
        NewEvent {
            end_time: Some(end),
            ..NewEvent::new(EventType::Sleep, start)
        }
    }

    fn seeded() -> Database {
        let mut db = Database::open_in_memory().unwrap();
        db.insert_events(&[
            // night of the 1st into the 2nd, one wake-up
            sleep(at(1, 19, 30), at(2, 1, 30)),
            sleep(at(2, 1, 45), at(2, 6, 15)),
            // nap on the 2nd
            sleep(at(2, 10, 0), at(2, 11, 15)),
        ])
        .unwrap();
        db
    }

    #[test]
    fn report_summarises_completed_days() {
        let db = seeded();
        let calendar = DayCalendar::seven_am(Utc);
        let analysis = analyse(&db, &calendar, &NightConfig::default(), 2, at(3, 12, 0)).unwrap();

        insta::assert_snapshot!(format_report(&analysis), @r"
        SLEEP: 2025-03-01 to 2025-03-02 (2 days, 2 tracked)

        SUMMARY
        ───────
        Daily total:     5h 53m
        Night sleep:     10h 30m
        Naps:            1h 15m (0.5 per day)
        Night wake-ups:  1.0
        Longest stretch: 6h 0m
        Wake time:       06:15
        Bedtime:         19:30

        BY DAY
        ──────
        Sat 1   night 10h 30m  naps 0m       (0)
        Sun 2   night 0m       naps 1h 15m   (1)

        NAP LENGTHS
        ───────────
        60-89m   #
        ");
    }

    #[test]
    fn empty_window_says_so() {
        let db = Database::open_in_memory().unwrap();
        let calendar = DayCalendar::seven_am(Utc);
        let mut output = Vec::new();
        run(&mut output, &db, &calendar, &NightConfig::default(), 7, false, at(10, 12, 0)).unwrap();
        let output = String::from_utf8(output).unwrap();
        assert!(output.starts_with("SLEEP: 2025-03-03 to 2025-03-09 (7 days, 0 tracked)"));
        assert!(output.contains("No completed sleep in this period."));
    }

    #[test]
    fn json_includes_smoothed_curve() {
        let db = seeded();
        let calendar = DayCalendar::seven_am(Utc);
        let mut output = Vec::new();
        run(&mut output, &db, &calendar, &NightConfig::default(), 2, true, at(3, 12, 0)).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(value["stats"]["trackedDays"], 2);
        assert_eq!(value["nightEventIds"], serde_json::json!([1, 2]));
        assert_eq!(value["smoothedProbability"]["points"].as_array().unwrap().len(), 288);
    }
}
