//! Connection registry and non-blocking fan-out

use crate::{HubConfig, HubError};
use reviewdesk_domain::traits::EventPublisher;
use reviewdesk_domain::{ClientMessage, ControlMessage, DomainEvent, ServerMessage};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::{TryRecvError, TrySendError};
use tokio::time::Instant;

/// Identifier of one live connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Raw numeric value
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Counters exposed on the status endpoint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HubStats {
    /// Currently registered connections
    pub active_connections: usize,
    /// Events broadcast
    pub published: u64,
    /// Per-connection deliveries
    pub delivered: u64,
    /// Per-connection backpressure drops
    pub dropped: u64,
    /// Connections removed for silence
    pub reaped: u64,
}

/// Outcome of one broadcast
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Connections the event was queued for
    pub delivered: usize,
    /// Connections whose buffer was full
    pub dropped: usize,
    /// Connections found closed and removed
    pub closed: usize,
}

struct Slot {
    tx: mpsc::Sender<ServerMessage>,
    last_seen: Instant,
}

struct HubInner {
    config: HubConfig,
    connections: RwLock<HashMap<ConnectionId, Slot>>,
    next_id: AtomicU64,
    published: AtomicU64,
    delivered: AtomicU64,
    dropped: AtomicU64,
    reaped: AtomicU64,
}

/// In-process broker fanning domain events out to live connections
///
/// Cheap to clone; clones share one registry. A broadcast holds the registry
/// read lock only while queueing with `try_send`, so it never waits on a
/// connection. A connection whose buffer is full misses that event.
#[derive(Clone)]
pub struct NotificationHub {
    inner: Arc<HubInner>,
}

impl NotificationHub {
    /// Create a hub with the given configuration
    pub fn new(config: HubConfig) -> Self {
        Self {
            inner: Arc::new(HubInner {
                config,
                connections: RwLock::new(HashMap::new()),
                next_id: AtomicU64::new(1),
                published: AtomicU64::new(0),
                delivered: AtomicU64::new(0),
                dropped: AtomicU64::new(0),
                reaped: AtomicU64::new(0),
            }),
        }
    }

    /// Hub configuration
    pub fn config(&self) -> &HubConfig {
        &self.inner.config
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<ConnectionId, Slot>>, HubError> {
        self.inner
            .connections
            .read()
            .map_err(|_| HubError::LockPoisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<ConnectionId, Slot>>, HubError> {
        self.inner
            .connections
            .write()
            .map_err(|_| HubError::LockPoisoned)
    }

    /// Register a new connection
    ///
    /// The returned subscription yields every event broadcast from now on and
    /// deregisters itself when dropped.
    pub fn subscribe(&self) -> Result<Subscription, HubError> {
        let id = ConnectionId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::channel(self.inner.config.buffer_size());

        let active = {
            let mut connections = self.write()?;
            connections.insert(
                id,
                Slot {
                    tx,
                    last_seen: Instant::now(),
                },
            );
            connections.len()
        };

        tracing::info!(connection = %id, active, "client connected");

        Ok(Subscription {
            id,
            rx,
            hub: self.clone(),
        })
    }

    /// Remove a connection; a no-op if it is already gone
    pub fn unsubscribe(&self, id: ConnectionId) {
        match self.write() {
            Ok(mut connections) => {
                if connections.remove(&id).is_some() {
                    tracing::info!(connection = %id, active = connections.len(), "client disconnected");
                }
            }
            Err(e) => tracing::error!("Failed to unsubscribe {}: {}", id, e),
        }
    }

    /// Queue one event for every live connection without waiting
    pub fn broadcast(&self, event: DomainEvent) -> BroadcastReport {
        self.inner.published.fetch_add(1, Ordering::Relaxed);

        let message = ServerMessage::Event(event);
        let mut report = BroadcastReport::default();
        let mut closed = Vec::new();

        match self.read() {
            Ok(connections) => {
                for (id, slot) in connections.iter() {
                    match slot.tx.try_send(message.clone()) {
                        Ok(()) => report.delivered += 1,
                        Err(TrySendError::Full(_)) => {
                            report.dropped += 1;
                            tracing::debug!(connection = %id, "outbound buffer full, event dropped");
                        }
                        Err(TrySendError::Closed(_)) => closed.push(*id),
                    }
                }
            }
            Err(e) => {
                tracing::error!("Broadcast skipped: {}", e);
                return report;
            }
        }

        self.inner
            .delivered
            .fetch_add(report.delivered as u64, Ordering::Relaxed);
        self.inner
            .dropped
            .fetch_add(report.dropped as u64, Ordering::Relaxed);

        if !closed.is_empty() {
            report.closed = closed.len();
            if let Ok(mut connections) = self.write() {
                for id in closed {
                    connections.remove(&id);
                    tracing::debug!(connection = %id, "removed closed connection");
                }
            }
        }

        report
    }

    /// Queue a control message for one connection
    pub fn send_to(&self, id: ConnectionId, message: ControlMessage) -> Result<(), HubError> {
        let connections = self.read()?;
        let slot = connections
            .get(&id)
            .ok_or(HubError::ConnectionNotFound(id))?;

        slot.tx
            .try_send(ServerMessage::Control(message))
            .map_err(|e| match e {
                TrySendError::Full(_) => HubError::BufferFull(id),
                TrySendError::Closed(_) => HubError::ConnectionNotFound(id),
            })
    }

    /// Record that a connection showed signs of life
    pub fn touch(&self, id: ConnectionId) -> Result<(), HubError> {
        let mut connections = self.write()?;
        let slot = connections
            .get_mut(&id)
            .ok_or(HubError::ConnectionNotFound(id))?;
        slot.last_seen = Instant::now();
        Ok(())
    }

    /// Remove every connection silent for longer than the stale threshold
    ///
    /// Dropping a connection's sender ends its subscription stream.
    pub fn reap_stale(&self) -> Vec<ConnectionId> {
        let stale_after = self.inner.config.stale_after();
        let now = Instant::now();

        let reaped: Vec<ConnectionId> = match self.write() {
            Ok(mut connections) => {
                let stale: Vec<ConnectionId> = connections
                    .iter()
                    .filter(|(_, slot)| now.duration_since(slot.last_seen) > stale_after)
                    .map(|(id, _)| *id)
                    .collect();
                for id in &stale {
                    connections.remove(id);
                }
                stale
            }
            Err(e) => {
                tracing::error!("Reap skipped: {}", e);
                Vec::new()
            }
        };

        if !reaped.is_empty() {
            self.inner
                .reaped
                .fetch_add(reaped.len() as u64, Ordering::Relaxed);
            tracing::info!("Reaped {} silent connections", reaped.len());
        }

        reaped
    }

    /// Number of live connections
    pub fn connection_count(&self) -> usize {
        self.read().map(|c| c.len()).unwrap_or(0)
    }

    /// Snapshot of hub counters
    pub fn stats(&self) -> HubStats {
        HubStats {
            active_connections: self.connection_count(),
            published: self.inner.published.load(Ordering::Relaxed),
            delivered: self.inner.delivered.load(Ordering::Relaxed),
            dropped: self.inner.dropped.load(Ordering::Relaxed),
            reaped: self.inner.reaped.load(Ordering::Relaxed),
        }
    }
}

impl Default for NotificationHub {
    fn default() -> Self {
        Self::new(HubConfig::default())
    }
}

impl EventPublisher for NotificationHub {
    fn publish(&self, event: DomainEvent) {
        self.broadcast(event);
    }
}

/// One registered connection's receiving end
///
/// Dropping it deregisters the connection.
pub struct Subscription {
    id: ConnectionId,
    rx: mpsc::Receiver<ServerMessage>,
    hub: NotificationHub,
}

impl Subscription {
    /// Connection id
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Wait for the next message; `None` once the hub dropped this connection
    pub async fn recv(&mut self) -> Option<ServerMessage> {
        self.rx.recv().await
    }

    /// Take the next message if one is queued
    pub fn try_recv(&mut self) -> Result<ServerMessage, TryRecvError> {
        self.rx.try_recv()
    }

    /// Refresh liveness
    pub fn touch(&self) -> Result<(), HubError> {
        self.hub.touch(self.id)
    }

    /// Handle an inbound client frame: refresh liveness and queue the reply
    pub fn handle_client_message(&self, message: &ClientMessage) -> Result<(), HubError> {
        self.touch()?;
        self.hub.send_to(self.id, message.reply())
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.hub.unsubscribe(self.id);
    }
}
