//! End-to-end tests driving the `bt` binary against a temporary database.

use std::process::{Command, Output};

use tempfile::TempDir;

fn bt_binary() -> String {
    env!("CARGO_BIN_EXE_bt").to_string()
}

/// A scratch home directory with its own database.
struct Tracker {
    temp: TempDir,
}

impl Tracker {
    fn new() -> Self {
        Self {
            temp: TempDir::new().unwrap(),
        }
    }

    fn command(&self, args: &[&str]) -> Output {
        Command::new(bt_binary())
            .env("HOME", self.temp.path())
            .env_remove("XDG_CONFIG_HOME")
            .env_remove("XDG_DATA_HOME")
            .env("BT_DATABASE_PATH", self.temp.path().join("data/bt.db"))
            .env("TZ", "UTC")
            .args(args)
            .output()
            .expect("failed to run bt")
    }

    /// Runs `bt` and returns stdout, failing the test on a non-zero exit.
    fn run(&self, args: &[&str]) -> String {
        let output = self.command(args);
        assert!(
            output.status.success(),
            "bt {args:?} should succeed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8(output.stdout).unwrap()
    }
}

#[test]
fn test_log_edit_delete_flow() {
    let tracker = Tracker::new();

    let logged = tracker.run(&[
        "log",
        "feed",
        "--at",
        "2025-03-01T09:30:00Z",
        "--feed-type",
        "Bottle",
        "--amount",
        "120",
    ]);
    assert_eq!(logged, "Logged FEED #1 at 2025-03-01 09:30\n");

    let edited = tracker.run(&["edit", "1", "--amount", "150", "--note", "big"]);
    assert_eq!(edited, "Updated FEED #1\n");

    let events = tracker.run(&["events", "--type", "feed"]);
    let event: serde_json::Value = serde_json::from_str(events.trim()).unwrap();
    assert_eq!(event["id"], 1);
    assert_eq!(event["type"], "FEED");
    assert_eq!(event["note"], "big");
    assert_eq!(event["data"]["amount"], 150.0);
    assert_eq!(event["data"]["unit"], "ml");

    tracker.run(&["delete", "1"]);
    assert_eq!(tracker.run(&["events"]), "");

    let missing = tracker.command(&["delete", "1"]);
    assert!(!missing.status.success());
}

#[test]
fn test_sleep_toggle_records_one_session() {
    let tracker = Tracker::new();

    let started = tracker.run(&["sleep", "--at", "3 hours ago"]);
    assert!(started.starts_with("Sleep #1 started at "), "{started}");

    let status = tracker.run(&["status"]);
    assert!(status.contains("Sleeping since "), "{status}");

    let ended = tracker.run(&["sleep"]);
    assert!(ended.starts_with("Sleep #1 ended at "), "{ended}");
    assert!(ended.contains("(3h 0m)"), "{ended}");

    let status = tracker.run(&["status"]);
    assert!(status.contains("Awake\n"));
    assert!(status.contains("- SLEEP: 1\n"));
}

#[test]
fn test_import_then_timeline() {
    let tracker = Tracker::new();
    let csv = tracker.temp.path().join("history.csv");
    std::fs::write(
        &csv,
        "type,startTime,endTime,note,data,value\n\
         WEIGHT,01/03/25,,,,4215\n\
         FEED,2025-03-01T08:00:00Z,,,,90\n\
         ,2025-03-01,,,,\n",
    )
    .unwrap();

    let imported = tracker.run(&["import", csv.to_str().unwrap()]);
    assert_eq!(imported, "Imported 2 events (1 skipped)\n");

    tracker.run(&["log", "feed", "--at", "1 day ago", "--feed-type", "Breastfeeding"]);
    let timeline = tracker.run(&["timeline", "feed", "--pages", "3", "--json"]);
    let view: serde_json::Value = serde_json::from_str(&timeline).unwrap();

    // the recent feed fills page 0; page 1 is empty, so loading stops there
    assert_eq!(view["kind"], "FEED");
    assert_eq!(view["pages"], 1);
    assert_eq!(view["hasMore"], false);
    let rows = view["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 14);
    let markers: usize = rows
        .iter()
        .map(|row| row["points"].as_array().unwrap().len())
        .sum();
    assert_eq!(markers, 1);
}

#[test]
fn test_reports_on_empty_database() {
    let tracker = Tracker::new();

    let sleep = tracker.run(&["sleep-stats", "--days", "14", "--json"]);
    let sleep: serde_json::Value = serde_json::from_str(&sleep).unwrap();
    assert_eq!(sleep["stats"]["trackedDays"], 0);
    assert_eq!(sleep["stats"]["medianWakeTime"], serde_json::Value::Null);

    let feeds = tracker.run(&["feed-stats"]);
    assert!(feeds.contains("No feeds recorded in this period."));

    let timeline = tracker.run(&["timeline", "sleep"]);
    assert_eq!(timeline, "No SLEEP history.\n");
}

#[test]
fn test_diaper_and_weight_reports() {
    let tracker = Tracker::new();

    tracker.run(&["log", "diaper", "--at", "1 day ago", "--status", "wet"]);
    tracker.run(&["log", "diaper", "--at", "1 day ago"]);
    let diapers = tracker.run(&["diaper-stats", "--days", "3", "--json"]);
    let diapers: serde_json::Value = serde_json::from_str(&diapers).unwrap();
    assert_eq!(diapers["totalChanges"], 2);
    assert_eq!(diapers["weekly"].as_array().unwrap().len(), 1);

    let reference = tracker.temp.path().join("growth.csv");
    std::fs::write(
        &reference,
        "Date;P15;P25;P50;P75;P85
         01/03/2025;3,5;3,7;4,0;4,3;4,5
         31/03/2025;4,1;4,3;4,6;4,9;5,1
",
    )
    .unwrap();
    for (at, kg) in [("2025-03-01T12:00:00Z", "4.0"), ("2025-03-08T12:00:00Z", "4.2")] {
        tracker.run(&["log", "weight", "--at", at, "--amount", kg]);
    }

    let weights = tracker.run(&[
        "weight-stats",
        "--reference",
        reference.to_str().unwrap(),
        "--json",
    ]);
    let weights: serde_json::Value = serde_json::from_str(&weights).unwrap();
    assert_eq!(weights["weighIns"][0]["percentile"], "50%");
    assert_eq!(weights["latestChangeGrams"], 200);
    assert_eq!(weights["growth"]["days"], 7);

    let report = tracker.run(&["weight-stats"]);
    assert!(report.contains("Percentile:    n/a\n"), "{report}");
}

#[test]
fn test_invalid_input_is_rejected() {
    let tracker = Tracker::new();

    let output = tracker.command(&["log", "nap"]);
    assert!(!output.status.success());

    let output = tracker.command(&[
        "log",
        "sleep",
        "--at",
        "2025-03-01T20:00:00Z",
        "--end",
        "2025-03-01T19:00:00Z",
    ]);
    assert!(!output.status.success());
    assert_eq!(tracker.run(&["events"]), "");
}

#[test]
fn test_no_subcommand_prints_help() {
    let tracker = Tracker::new();
    let help = tracker.run(&[]);
    assert!(help.contains("Usage: bt"), "{help}");
}
