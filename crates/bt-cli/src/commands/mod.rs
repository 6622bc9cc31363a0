//! CLI subcommand implementations.

pub mod diaper_stats;
pub mod edit;
pub mod events;
pub mod feed_stats;
pub mod import;
pub mod log;
pub mod sleep;
pub mod sleep_stats;
pub mod status;
pub mod timeline;
pub mod util;
pub mod weight_stats;
