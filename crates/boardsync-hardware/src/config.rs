//! Board link configuration.

use boardsync_core::{
    Error,
    constants::{
        DEFAULT_BAUD_RATE, DEFAULT_DEBOUNCE_MS, DEFAULT_EVENT_CAPACITY, DEFAULT_QUIET_WINDOW_MS,
        MIN_SETTLE_MS,
    },
};
use boardsync_protocol::UpdateMode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings for one board connection.
///
/// Every field has a default, so a partial config file is enough:
///
/// ```
/// use boardsync_hardware::BoardConfig;
///
/// let config: BoardConfig = serde_json::from_str(r#"{ "port": "/dev/ttyACM0" }"#).unwrap();
/// assert_eq!(config.port, "/dev/ttyACM0");
/// assert_eq!(config.baud_rate, 9600);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    /// Serial device path.
    pub port: String,

    pub baud_rate: u32,

    /// Silence required after reset before the handshake starts.
    pub quiet_window_ms: u64,

    /// Debounce window for field updates.
    pub debounce_ms: u64,

    /// Reporting mode requested after the handshake.
    pub update_mode: UpdateMode,

    /// Run move detection after each debounced change.
    pub detect_moves: bool,

    /// Capacity of the board event broadcast channel.
    pub event_capacity: usize,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            port: "/dev/ttyUSB0".to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
            quiet_window_ms: DEFAULT_QUIET_WINDOW_MS,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            update_mode: UpdateMode::default(),
            detect_moves: true,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl BoardConfig {
    /// Config for the given port with all other fields defaulted.
    pub fn with_port(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            ..Self::default()
        }
    }

    pub fn quiet_window(&self) -> Duration {
        Duration::from_millis(self.quiet_window_ms)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Check the config for values the board link cannot work with.
    ///
    /// # Errors
    /// Returns `Error::Config` describing the first offending field.
    pub fn validate(&self) -> boardsync_core::Result<()> {
        if self.port.trim().is_empty() {
            return Err(Error::Config("port must not be empty".to_string()));
        }
        if self.baud_rate == 0 {
            return Err(Error::Config("baud_rate must be positive".to_string()));
        }
        if self.quiet_window_ms < MIN_SETTLE_MS {
            return Err(Error::Config(format!(
                "quiet_window_ms must be at least {MIN_SETTLE_MS}, got {}",
                self.quiet_window_ms
            )));
        }
        if self.debounce_ms < MIN_SETTLE_MS {
            return Err(Error::Config(format!(
                "debounce_ms must be at least {MIN_SETTLE_MS}, got {}",
                self.debounce_ms
            )));
        }
        if self.event_capacity == 0 {
            return Err(Error::Config("event_capacity must be positive".to_string()));
        }
        Ok(())
    }
}
