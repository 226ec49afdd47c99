//! Configuration for the notification hub

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Notification hub configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HubConfig {
    /// Expected interval between client pings, in seconds
    #[serde(default = "default_heartbeat_interval_secs")]
    pub heartbeat_interval_secs: u64,

    /// A connection silent for more than this many intervals is reaped
    #[serde(default = "default_stale_after_intervals")]
    pub stale_after_intervals: u32,

    /// Bounded outbound buffer per connection
    #[serde(default = "default_client_buffer_size")]
    pub client_buffer_size: usize,
}

fn default_heartbeat_interval_secs() -> u64 {
    30
}

fn default_stale_after_intervals() -> u32 {
    2
}

fn default_client_buffer_size() -> usize {
    64
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval_secs: default_heartbeat_interval_secs(),
            stale_after_intervals: default_stale_after_intervals(),
            client_buffer_size: default_client_buffer_size(),
        }
    }
}

impl HubConfig {
    /// Heartbeat interval as a Duration (at least one second)
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs.max(1))
    }

    /// Silence after which a connection counts as dead
    pub fn stale_after(&self) -> Duration {
        self.heartbeat_interval() * self.stale_after_intervals.max(1)
    }

    /// Buffer size actually used (mpsc channels need at least one slot)
    pub fn buffer_size(&self) -> usize {
        self.client_buffer_size.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = HubConfig::default();
        assert_eq!(config.heartbeat_interval(), Duration::from_secs(30));
        assert_eq!(config.stale_after(), Duration::from_secs(60));
        assert_eq!(config.buffer_size(), 64);
    }

    #[test]
    fn test_zero_values_are_clamped() {
        let config = HubConfig {
            heartbeat_interval_secs: 0,
            stale_after_intervals: 0,
            client_buffer_size: 0,
        };
        assert_eq!(config.heartbeat_interval(), Duration::from_secs(1));
        assert_eq!(config.stale_after(), Duration::from_secs(1));
        assert_eq!(config.buffer_size(), 1);
    }
}
