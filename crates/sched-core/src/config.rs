#![forbid(unsafe_code)]

//! Schedule layout configuration.
//!
//! # Loading
//!
//! ```toml
//! # sched.toml
//! segments_by_hour = 4
//! day_start_hour = 8
//! day_end_hour = 18
//! ```
//!
//! ```rust,ignore
//! let config = ScheduleConfig::from_toml_file("sched.toml")?;
//! let config = ScheduleConfig::from_env();
//! ```
//!
//! Every value is clamped by [`ScheduleConfig::validated`] after loading.

#[cfg(feature = "config")]
use std::path::Path;

use chrono::Duration;

const MIN_SEGMENTS: u32 = 1;
const MAX_SEGMENTS: u32 = 60;
const MAX_HOUR: u32 = 24;

/// How a schedule column divides its day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ScheduleConfig {
    /// Clickable segments per hour (default: 6, i.e. 10 minutes).
    pub segments_by_hour: u32,
    /// First visible hour (default: 6).
    pub day_start_hour: u32,
    /// Last visible hour (default: 21).
    pub day_end_hour: u32,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            segments_by_hour: 6,
            day_start_hour: 6,
            day_end_hour: 21,
        }
    }
}

/// Configuration loading errors.
#[cfg(feature = "config")]
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read schedule config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse schedule config: {0}")]
    Toml(#[from] toml::de::Error),
}

impl ScheduleConfig {
    /// Length of one clickable segment.
    #[must_use]
    pub fn segment_length(&self) -> Duration {
        Duration::minutes(i64::from(60 / self.segments_by_hour.max(1)))
    }

    /// Load config from environment variables.
    ///
    /// Reads:
    /// - `SCHED_SEGMENTS_BY_HOUR`
    /// - `SCHED_DAY_START_HOUR`
    /// - `SCHED_DAY_END_HOUR`
    ///
    /// Unparsable values are ignored; the result is validated.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup.
    #[must_use]
    pub fn from_env_with(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        let read = |key: &str| lookup(key).and_then(|val| val.trim().parse::<u32>().ok());

        if let Some(v) = read("SCHED_SEGMENTS_BY_HOUR") {
            config.segments_by_hour = v;
        }
        if let Some(v) = read("SCHED_DAY_START_HOUR") {
            config.day_start_hour = v;
        }
        if let Some(v) = read("SCHED_DAY_END_HOUR") {
            config.day_end_hour = v;
        }
        config.validated()
    }

    /// Clamp values to safe ranges.
    ///
    /// - `segments_by_hour` to 1-60
    /// - both hours to 0-24
    /// - an empty or inverted day falls back to the default hours
    #[must_use]
    pub fn validated(mut self) -> Self {
        self.segments_by_hour = self.segments_by_hour.clamp(MIN_SEGMENTS, MAX_SEGMENTS);
        self.day_start_hour = self.day_start_hour.min(MAX_HOUR);
        self.day_end_hour = self.day_end_hour.min(MAX_HOUR);
        if self.day_start_hour >= self.day_end_hour {
            let defaults = Self::default();
            self.day_start_hour = defaults.day_start_hour;
            self.day_end_hour = defaults.day_end_hour;
        }
        self
    }

    /// Parse and validate a TOML document.
    #[cfg(feature = "config")]
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        Ok(config.validated())
    }

    /// Read, parse and validate a TOML file.
    #[cfg(feature = "config")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }
}
