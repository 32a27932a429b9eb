//! Board and scheduler configuration.
//!
//! Both structs load from RON so that tools and tests can share
//! configuration files with the rest of the game data.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Board dimensions and playable area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    /// Width in tiles.
    pub width: i32,
    /// Height in tiles.
    pub height: i32,
    /// Tiles between the board edge and the playable area.
    pub border: i32,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            width: 32,
            height: 32,
            border: 0,
        }
    }
}

impl BoardConfig {
    /// Standard border used by full-size round boards.
    pub const STANDARD_BORDER: i32 = 8;

    /// A board of the given size with no border.
    #[must_use]
    pub const fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            border: 0,
        }
    }

    /// A full-size round board: the given playable size plus the standard
    /// border on every side.
    #[must_use]
    pub const fn round(playable_width: i32, playable_height: i32) -> Self {
        Self {
            width: playable_width + 2 * Self::STANDARD_BORDER,
            height: playable_height + 2 * Self::STANDARD_BORDER,
            border: Self::STANDARD_BORDER,
        }
    }

    /// Set the border.
    #[must_use]
    pub const fn with_border(mut self, border: i32) -> Self {
        self.border = border;
        self
    }

    /// Load from a RON string.
    pub fn from_ron_str(ron: &str) -> Result<Self> {
        Ok(ron::from_str(ron)?)
    }
}

/// Action scheduler tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// How long an action may execute before the watchdog flags it.
    pub watchdog_ms: u64,
    /// Log every queue, dispatch and completion at debug level.
    pub trace_actions: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            watchdog_ms: 5_000,
            trace_actions: false,
        }
    }
}

impl SchedulerConfig {
    /// The watchdog threshold.
    #[must_use]
    pub const fn watchdog(&self) -> Duration {
        Duration::from_millis(self.watchdog_ms)
    }

    /// Set the watchdog threshold.
    #[must_use]
    pub fn with_watchdog(mut self, watchdog: Duration) -> Self {
        self.watchdog_ms = u64::try_from(watchdog.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Load from a RON string.
    pub fn from_ron_str(ron: &str) -> Result<Self> {
        Ok(ron::from_str(ron)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_board_has_standard_border() {
        let config = BoardConfig::round(16, 12);
        assert_eq!(config.width, 32);
        assert_eq!(config.height, 28);
        assert_eq!(config.border, 8);
    }

    #[test]
    fn test_board_config_from_ron() {
        let config = BoardConfig::from_ron_str("(width: 12, height: 10)").unwrap();
        assert_eq!(config, BoardConfig::new(12, 10));
    }

    #[test]
    fn test_scheduler_config_from_ron() {
        let config = SchedulerConfig::from_ron_str("(watchdog_ms: 250)").unwrap();
        assert_eq!(config.watchdog(), Duration::from_millis(250));
        assert!(!config.trace_actions);
    }

    #[test]
    fn test_bad_ron_is_an_error() {
        assert!(BoardConfig::from_ron_str("(width: \"wide\")").is_err());
    }
}
