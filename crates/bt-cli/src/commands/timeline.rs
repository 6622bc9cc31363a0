//! Timeline command: day-by-day rows, loaded fourteen days at a time.
//!
//! Rows run from the day start to the next day start. Each row is drawn as a
//! bar of half-hour cells followed by one line per marker:
//! - `#` night sleep, `=` nap, `~` sleep still in progress
//! - `*` feed

use std::fmt::Write as _;
use std::io::Write;

use anyhow::{Context, Result};
use bt_core::feed::display_name;
use bt_core::{
    DayCalendar, DayRow, EventType, FeedRow, HistoryState, NightConfig, RowMarker, SleepRow,
};
use bt_db::{Database, DatabaseHistory};
use chrono::{DateTime, NaiveDate, TimeZone, Timelike, Utc};
use serde::Serialize;

use super::util::today;

/// Half-hour cells per row.
const BAR_CELLS: usize = 48;
/// Hours between axis labels.
const AXIS_STEP_HOURS: u32 = 3;
/// Guards cell boundaries against float noise in row percentages.
const CELL_EPSILON: f64 = 1e-6;

#[derive(Serialize)]
#[serde(rename_all = "camelCase", bound = "M: Serialize + RowMarker")]
struct TimelineJson<'a, M> {
    kind: EventType,
    pages: usize,
    has_more: bool,
    rows: &'a [DayRow<M>],
}

/// Loads up to `pages` pages of history for `kind`, stopping at the first
/// empty page.
pub fn load_history<Tz: TimeZone>(
    db: &Database,
    calendar: &DayCalendar<Tz>,
    kind: EventType,
    today: NaiveDate,
    pages: u32,
) -> Result<HistoryState> {
    let mut source = DatabaseHistory::new(db, calendar, today);
    let mut state = HistoryState::load(kind, &mut source)
        .with_context(|| format!("failed to load {kind} history"))?;
    while state.chunks().len() < pages as usize {
        if !state.load_more(&mut source)? {
            break;
        }
    }
    tracing::debug!(
        %kind,
        pages = state.chunks().len(),
        has_more = state.has_more(),
        "history loaded"
    );
    Ok(state)
}

#[expect(
    clippy::too_many_arguments,
    reason = "mirrors the command's flags plus the injected clock"
)]
pub fn run<W: Write, Tz: TimeZone>(
    writer: &mut W,
    db: &Database,
    calendar: &DayCalendar<Tz>,
    config: &NightConfig,
    kind: EventType,
    pages: u32,
    json: bool,
    now: DateTime<Utc>,
) -> Result<()> {
    let today = today(calendar, now);
    let state = load_history(db, calendar, kind, today, pages)?;
    let day_start_hour = calendar.day_start().hour();

    match kind {
        EventType::Sleep => {
            let rows = state.sleep_rows(calendar, config, today, now);
            if json {
                write_json(writer, &state, &rows)?;
            } else if rows.is_empty() {
                writeln!(writer, "No {kind} history.")?;
            } else {
                write!(writer, "{}", render_sleep(&rows, day_start_hour))?;
            }
        }
        _ => {
            let rows = state.feed_rows(calendar, today);
            if json {
                write_json(writer, &state, &rows)?;
            } else if rows.is_empty() {
                writeln!(writer, "No {kind} history.")?;
            } else {
                write!(writer, "{}", render_feed(&rows, day_start_hour))?;
            }
        }
    }
    Ok(())
}

fn write_json<W: Write, M: Serialize + RowMarker>(
    writer: &mut W,
    state: &HistoryState,
    rows: &[DayRow<M>],
) -> Result<()> {
    let view = TimelineJson {
        kind: state.kind(),
        pages: state.chunks().len(),
        has_more: state.has_more(),
        rows,
    };
    writeln!(writer, "{}", serde_json::to_string_pretty(&view)?)?;
    Ok(())
}

pub fn render_sleep(rows: &[SleepRow], day_start_hour: u32) -> String {
    let mut output = axis_line(day_start_hour);
    for row in rows {
        let mut bar = ['.'; BAR_CELLS];
        for block in &row.markers {
            let mark = if block.is_ongoing {
                '~'
            } else if block.is_night {
                '#'
            } else {
                '='
            };
            fill(&mut bar, block.left, block.left + block.width, mark);
        }
        push_bar(&mut output, &row.date, &bar);

        for block in &row.markers {
            let mut tag = if block.is_ongoing {
                "ongoing"
            } else if block.is_night {
                "night"
            } else {
                "nap"
            }
            .to_string();
            if block.clipped {
                tag.push_str(", continues");
            }
            let _ = writeln!(
                output,
                "        {:<15} {:<10} {tag}",
                block.time, block.duration
            );
        }
    }
    output
}

pub fn render_feed(rows: &[FeedRow], day_start_hour: u32) -> String {
    let mut output = axis_line(day_start_hour);
    for row in rows {
        let mut bar = ['.'; BAR_CELLS];
        for point in &row.markers {
            let cell = start_cell(point.left);
            bar[cell] = '*';
        }
        push_bar(&mut output, &row.date, &bar);

        for point in &row.markers {
            let mut line = format!("        {} {}", point.time, display_name(&point.feed_type));
            if let Some(amount) = point.amount {
                let _ = write!(line, " {amount}{}", point.unit.as_deref().unwrap_or_default());
            }
            if let Some(note) = &point.note {
                let _ = write!(line, " ({note})");
            }
            let _ = writeln!(output, "{line}");
        }
    }
    output
}

#[allow(clippy::cast_possible_truncation)]
fn axis_line(day_start_hour: u32) -> String {
    let cells_per_label = (AXIS_STEP_HOURS * 2) as usize;
    let axis: String = (0..BAR_CELLS / cells_per_label)
        .map(|k| {
            let hour = (day_start_hour + AXIS_STEP_HOURS * k as u32) % 24;
            format!("{hour:02}{:width$}", "", width = cells_per_label - 2)
        })
        .collect();
    format!("{:<7} |{axis}|\n", "Day")
}

fn push_bar(output: &mut String, label: &str, bar: &[char]) {
    let bar: String = bar.iter().collect();
    let _ = writeln!(output, "{label:<7} |{bar}|");
}

/// Marks every cell touched by `[from, to)`, given in percent of the row.
fn fill(bar: &mut [char], from: f64, to: f64, mark: char) {
    let first = start_cell(from);
    let last = end_cell(to).max(first);
    for cell in &mut bar[first..=last] {
        *cell = mark;
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn start_cell(percent: f64) -> usize {
    let cell = (percent / 100.0 * BAR_CELLS as f64 + CELL_EPSILON).floor();
    (cell.max(0.0) as usize).min(BAR_CELLS - 1)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn end_cell(percent: f64) -> usize {
    let cell = (percent / 100.0 * BAR_CELLS as f64 - CELL_EPSILON).ceil() - 1.0;
    (cell.max(0.0) as usize).min(BAR_CELLS - 1)
}
