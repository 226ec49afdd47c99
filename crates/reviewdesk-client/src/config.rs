//! Client connection settings

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Live connection settings
///
/// Defaults: ping every 30s, reconnect 3s after a drop, give up after 10
/// reconnects, keep the 50 most recent notifications.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Interval between heartbeat pings, in seconds
    #[serde(default = "default_heartbeat_interval_secs")]
    pub heartbeat_interval_secs: u64,

    /// Fixed delay before each reconnect, in milliseconds
    #[serde(default = "default_reconnect_interval_ms")]
    pub reconnect_interval_ms: u64,

    /// Reconnects attempted before going pull-only
    #[serde(default = "default_max_reconnect_attempts")]
    pub max_reconnect_attempts: u32,

    /// Notifications kept in the local buffer
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,

    /// Whether a dropped connection is retried at all
    #[serde(default = "default_auto_reconnect")]
    pub auto_reconnect: bool,
}

fn default_heartbeat_interval_secs() -> u64 {
    30
}

fn default_reconnect_interval_ms() -> u64 {
    3000
}

fn default_max_reconnect_attempts() -> u32 {
    10
}

fn default_buffer_size() -> usize {
    50
}

fn default_auto_reconnect() -> bool {
    true
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval_secs: default_heartbeat_interval_secs(),
            reconnect_interval_ms: default_reconnect_interval_ms(),
            max_reconnect_attempts: default_max_reconnect_attempts(),
            buffer_size: default_buffer_size(),
            auto_reconnect: default_auto_reconnect(),
        }
    }
}

impl ClientConfig {
    /// Heartbeat interval (at least one second)
    pub fn heartbeat(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs.max(1))
    }

    /// Delay before each reconnect
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_interval_ms)
    }
}
