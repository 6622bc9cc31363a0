//! Command-line argument definitions.

use std::path::PathBuf;

use bt_core::EventType;
use clap::{Args, Parser, Subcommand, ValueEnum};

/// Baby tracker.
///
/// Records sleeps, feeds and other care events and reconstructs sleep and
/// feeding timelines on a 7am-to-7am day.
#[derive(Debug, Parser)]
#[command(name = "bt", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Record an event.
    Log(LogArgs),

    /// Start a sleep, or end the one in progress.
    Sleep {
        /// When it happened (default: now).
        #[arg(long)]
        at: Option<String>,
    },

    /// Change a recorded event.
    Edit(EditArgs),

    /// Delete an event.
    Delete {
        /// Event id.
        id: i64,
    },

    /// Print events as JSON lines, newest first.
    Events {
        /// Only events of this type.
        #[arg(long = "type")]
        kind: Option<EventType>,

        /// Only events starting at or after this time.
        #[arg(long)]
        after: Option<String>,

        /// Only events starting at or before this time.
        #[arg(long)]
        before: Option<String>,

        /// Maximum number of events to print.
        #[arg(long, default_value_t = 50)]
        limit: usize,
    },

    /// Sleep statistics over the last completed days.
    SleepStats(StatsArgs),

    /// Feeding statistics over the last completed days.
    FeedStats(StatsArgs),

    /// Diaper changes per day and per week over the last completed days.
    DiaperStats(StatsArgs),

    /// Latest weight, growth rate and growth percentiles.
    WeightStats {
        /// Growth reference CSV: date, then P15, P25, P50, P75 and P85 in kg
        /// (default: `growth_reference` from config).
        #[arg(long)]
        reference: Option<PathBuf>,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Day-by-day timeline, loaded two weeks at a time.
    Timeline {
        kind: TimelineKind,

        /// Number of 14-day pages to load (stops early at the end of history).
        #[arg(long, default_value_t = 1)]
        pages: u32,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Import events from a CSV file with columns
    /// `type,startTime,endTime,note,data,value`.
    Import {
        /// CSV file to read.
        path: PathBuf,
    },

    /// Show current tracking status.
    Status,
}

#[derive(Debug, Args)]
pub struct LogArgs {
    /// Event type: sleep, feed, diaper, weight, medicine or note.
    pub kind: EventType,

    /// When it happened (default: now).
    #[arg(long)]
    pub at: Option<String>,

    /// When a sleep ended.
    #[arg(long)]
    pub end: Option<String>,

    #[arg(long)]
    pub note: Option<String>,

    /// Feed method, e.g. Bottle, Breastfeeding, Solid food.
    #[arg(long)]
    pub feed_type: Option<String>,

    /// Feed volume or weight.
    #[arg(long)]
    pub amount: Option<f64>,

    /// Unit for --amount (default: ml for feeds, kg for weight).
    #[arg(long)]
    pub unit: Option<String>,

    /// Breast side.
    #[arg(long)]
    pub side: Option<String>,

    /// Diaper status: wet, dirty or mixed.
    #[arg(long)]
    pub status: Option<String>,

    /// Medicine name.
    #[arg(long)]
    pub name: Option<String>,

    /// Medicine dose.
    #[arg(long)]
    pub dose: Option<String>,

    /// How the child fell asleep.
    #[arg(long)]
    pub initiator: Option<String>,
}

#[derive(Debug, Args)]
pub struct EditArgs {
    /// Event id.
    pub id: i64,

    #[arg(long)]
    pub start: Option<String>,

    #[arg(long, conflicts_with = "reopen")]
    pub end: Option<String>,

    /// Clear the end time of a sleep, making it ongoing again.
    #[arg(long)]
    pub reopen: bool,

    #[arg(long, conflicts_with = "clear_note")]
    pub note: Option<String>,

    #[arg(long)]
    pub clear_note: bool,

    /// New feed volume or weight.
    #[arg(long)]
    pub amount: Option<f64>,

    /// New feed method.
    #[arg(long)]
    pub feed_type: Option<String>,
}

#[derive(Debug, Args)]
pub struct StatsArgs {
    /// Days in the window (default: `stats_days` from config).
    #[arg(long)]
    pub days: Option<u32>,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Event types with a history timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TimelineKind {
    Sleep,
    Feed,
}

impl From<TimelineKind> for EventType {
    fn from(kind: TimelineKind) -> Self {
        match kind {
            TimelineKind::Sleep => Self::Sleep,
            TimelineKind::Feed => Self::Feed,
        }
    }
}
