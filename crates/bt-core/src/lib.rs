//! Core domain logic for the baby tracker.
//!
//! This crate contains the event model and the pure reconstruction passes:
//! - Sleep: night/nap classification, statistics and timeline rows
//! - Feed: timeline points and feeding statistics
//! - History: 14-day pagination with full recompute over loaded pages
//! - Diaper and weight: change counts, growth rate and reference percentiles
//!
//! Everything is keyed by a tracking day that starts at 07:00 local time.

pub mod calendar;
pub mod diaper;
pub mod event;
pub mod event_type;
pub mod feed;
pub mod format;
pub mod growth;
pub mod history;
pub mod payload;
pub mod sleep;
mod stats;
pub mod timeline;
pub mod types;
pub mod weight;

pub use calendar::{DEFAULT_DAY_START_HOUR, DayCalendar, DayWindow};
pub use diaper::{DiaperStats, process_diaper_stats};
pub use event::{Interval, RawEvent, sort_chronologically, validate_times};
pub use event_type::{EventType, UnknownEventType};
pub use feed::{FeedPoint, FeedRow, FeedStats, generate_feed_timeline, process_feed_stats};
pub use growth::{GrowthPoint, GrowthReference, Percentile};
pub use history::{
    DAYS_PER_PAGE, HistoryChunk, HistoryError, HistorySource, HistoryState, PageWindow,
    page_window,
};
pub use payload::{EventPayload, FeedPayload};
pub use sleep::{
    NightConfig, SleepAnalysis, SleepBlock, SleepRow, SleepStats, classify_nights,
    generate_timeline, process_sleep_stats,
};
pub use timeline::{DayRow, RowMarker};
pub use types::{EventId, ValidationError};
pub use weight::{WeightStats, process_weight_stats};
