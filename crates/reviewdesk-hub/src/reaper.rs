//! Background worker that removes silent connections

use crate::NotificationHub;
use std::future::Future;
use tokio::time::{interval, Duration, MissedTickBehavior};

/// Periodically reaps connections that stopped sending heartbeats
///
/// Runs once per heartbeat interval; a connection is removed once it has been
/// silent for longer than the configured number of intervals.
pub struct HeartbeatReaper {
    hub: NotificationHub,
    interval: Duration,
    sweeps: usize,
}

impl HeartbeatReaper {
    /// Create a reaper for `hub`, ticking at the hub's heartbeat interval
    pub fn new(hub: NotificationHub) -> Self {
        let interval = hub.config().heartbeat_interval();
        Self {
            hub,
            interval,
            sweeps: 0,
        }
    }

    /// Sweeps completed so far
    pub fn sweeps(&self) -> usize {
        self.sweeps
    }

    fn sweep(&mut self) {
        let reaped = self.hub.reap_stale();
        self.sweeps += 1;
        tracing::debug!(
            "Heartbeat sweep {}: {} reaped, {} active",
            self.sweeps,
            reaped.len(),
            self.hub.connection_count()
        );
    }

    /// Run until `shutdown` completes
    pub async fn run_until<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        tracing::info!("Heartbeat reaper started (interval: {:?})", self.interval);

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = ticker.tick() => self.sweep(),
                _ = &mut shutdown => {
                    tracing::info!("Heartbeat reaper stopped after {} sweeps", self.sweeps);
                    break;
                }
            }
        }
    }

    /// Run a fixed number of sweeps (useful for testing)
    pub async fn run_cycles(&mut self, cycles: usize) {
        let mut ticker = interval(self.interval);
        ticker.tick().await;

        for _ in 0..cycles {
            ticker.tick().await;
            self.sweep();
        }
    }
}
