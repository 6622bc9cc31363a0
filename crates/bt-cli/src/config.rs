//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};

use bt_core::calendar::DEFAULT_DAY_START_HOUR;
use bt_core::{DayCalendar, NightConfig, ValidationError};
use chrono::Local;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the database file.
    pub database_path: PathBuf,
    /// Local hour at which a tracking day begins.
    pub day_start_hour: u32,
    /// Largest gap between two night sleeps that still counts as one block.
    pub night_gap_minutes: u32,
    /// Length of the trailing statistics window.
    pub stats_days: u32,
    /// Growth reference CSV used for weight percentiles.
    pub growth_reference: Option<PathBuf>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_path", &self.database_path)
            .field("day_start_hour", &self.day_start_hour)
            .field("night_gap_minutes", &self.night_gap_minutes)
            .field("stats_days", &self.stats_days)
            .field("growth_reference", &self.growth_reference)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            database_path: data_dir.join("bt.db"),
            day_start_hour: DEFAULT_DAY_START_HOUR,
            night_gap_minutes: 0,
            stats_days: 7,
            growth_reference: None,
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    ///
    /// Later sources win: defaults, `~/.config/bt/config.toml`, the given
    /// file, then `BT_*` environment variables.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        figment = figment.merge(Env::prefixed("BT_"));

        figment.extract()
    }

    /// The day calendar in the machine's local time zone.
    pub fn calendar(&self) -> Result<DayCalendar<Local>, ValidationError> {
        DayCalendar::new(Local, self.day_start_hour)
    }

    pub fn night_config(&self) -> NightConfig {
        NightConfig::with_gap_minutes(self.night_gap_minutes)
    }
}

/// Returns the platform-specific config directory for bt.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("bt"))
}

/// Returns the platform-specific data directory for bt.
///
/// On Linux: `~/.local/share/bt`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("bt"))
}
