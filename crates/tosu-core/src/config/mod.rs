//! Runtime configuration and tuning constants.
//!
//! `Config` is loaded once at startup and handed to every instance by value;
//! nothing mutates it afterwards. The constant modules below hold values that
//! are part of the decoding contract rather than user preferences.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Address resolution retry configuration.
pub mod retry {
    /// Default number of resolution attempts before an instance is destroyed.
    pub const RESOLVE_ATTEMPTS: u32 = 3;

    /// Default delay (in ms) between resolution attempts.
    pub const RESOLVE_RETRY_DELAY_MS: u64 = 1000;
}

/// Error report thresholds.
///
/// The first `N` failures of a call site are logged at debug level, everything
/// after that at error level. A successful read resets the counter.
pub mod report {
    pub const DEFAULT_MAX_REPEATS: u32 = 10;

    /// Hit errors fail routinely while the list is being rebuilt.
    pub const HIT_ERRORS_MAX_REPEATS: u32 = 50;
}

/// Timing windows used by the polling loops.
pub mod timing {
    use std::time::Duration;

    /// Play time (ms) before the precise loop starts reading key overlay and hit errors.
    pub const PRECISE_GRACE_MS: i32 = 150;

    /// A tournament map change must be stable this long before it is committed.
    pub const TOURNEY_MAP_DEBOUNCE: Duration = Duration::from_millis(500);

    /// Hit errors beyond this magnitude mark the end of valid data.
    pub const HIT_ERROR_LIMIT: i32 = 500;

    /// How often an instance checks that its process is still running.
    pub const HEALTH_CHECK_INTERVAL: Duration = Duration::from_secs(1);
}

/// Key overlay sanity bounds.
pub mod key_overlay {
    /// Counts above this value are treated as garbage and reset.
    pub const MAX_COUNT: i32 = 1_000_000;
}

/// User-facing configuration shared by the manager and every instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Regular loop interval in milliseconds.
    pub poll_rate: u64,
    /// Precise loop interval in milliseconds.
    pub precise_data_poll_rate: u64,
    pub enable_key_overlay: bool,
    pub calculate_pp: bool,
    /// Keep `!mp` commands in tournament chat.
    pub show_mp_commands: bool,
    pub resolve_attempts: u32,
    pub resolve_retry_delay: u64,
    /// Process discovery interval in milliseconds.
    pub discovery_interval: u64,
    /// Foreground window poll interval in milliseconds.
    pub focus_interval: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            poll_rate: 100,
            precise_data_poll_rate: 10,
            enable_key_overlay: true,
            calculate_pp: true,
            show_mp_commands: false,
            resolve_attempts: retry::RESOLVE_ATTEMPTS,
            resolve_retry_delay: retry::RESOLVE_RETRY_DELAY_MS,
            discovery_interval: 1000,
            focus_interval: 100,
        }
    }
}

impl Config {
    /// Load configuration from a JSON file. Missing keys take their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(content)
            .map_err(|e| Error::ConfigParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.poll_rate == 0 || self.precise_data_poll_rate == 0 {
            return Err(Error::ConfigParseError(
                "poll rates must be greater than zero".to_string(),
            ));
        }
        if self.resolve_attempts == 0 {
            return Err(Error::ConfigParseError(
                "resolve_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_rate)
    }

    pub fn precise_interval(&self) -> Duration {
        Duration::from_millis(self.precise_data_poll_rate)
    }

    pub fn discovery_period(&self) -> Duration {
        Duration::from_millis(self.discovery_interval)
    }

    pub fn focus_period(&self) -> Duration {
        Duration::from_millis(self.focus_interval)
    }

    pub fn resolve_delay(&self) -> Duration {
        Duration::from_millis(self.resolve_retry_delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_constants() {
        assert_eq!(report::DEFAULT_MAX_REPEATS, 10);
        assert_eq!(report::HIT_ERRORS_MAX_REPEATS, 50);
    }

    #[test]
    fn test_timing_constants() {
        assert_eq!(timing::PRECISE_GRACE_MS, 150);
        assert_eq!(timing::TOURNEY_MAP_DEBOUNCE.as_millis(), 500);
        assert_eq!(timing::HIT_ERROR_LIMIT, 500);
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.poll_rate, 100);
        assert_eq!(config.precise_data_poll_rate, 10);
        assert!(config.enable_key_overlay);
        assert!(!config.show_mp_commands);
        assert_eq!(config.resolve_attempts, 3);
        assert_eq!(config.poll_interval(), Duration::from_millis(100));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = Config::from_json(r#"{ "poll_rate": 250 }"#).unwrap();
        assert_eq!(config.poll_rate, 250);
        assert_eq!(config.precise_data_poll_rate, 10);
        assert!(config.calculate_pp);
    }

    #[test]
    fn test_zero_poll_rate_rejected() {
        let result = Config::from_json(r#"{ "poll_rate": 0 }"#);
        assert!(matches!(result, Err(Error::ConfigParseError(_))));
    }

    #[test]
    fn test_invalid_json_rejected() {
        let result = Config::from_json("{ poll_rate: ");
        assert!(matches!(result, Err(Error::ConfigParseError(_))));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let config = Config {
            show_mp_commands: true,
            poll_rate: 50,
            ..Default::default()
        };
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded, config);
    }
}
