//! Sleep reconstruction: night/nap classification, statistics and timeline rows.

pub mod classify;
pub mod probability;
pub mod stats;
pub mod timeline;

pub use classify::{Night, NightClassification, NightConfig, classify_nights};
pub use probability::{ProbabilityPoint, SleepProbability};
pub use stats::{Bucket, DailySleep, SleepAnalysis, SleepStats, process_sleep_stats};
pub use timeline::{SleepBlock, SleepRow, generate_timeline};
