//! Client Connection Manager
//!
//! Keeps one live connection to the notification endpoint:
//! `disconnected → connecting → connected → disconnected`, then a fixed-delay
//! reconnect while attempts remain. A successful connect resets the attempt
//! counter; running out of attempts leaves the client pull-only.

use crate::buffer::NotificationBuffer;
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::transport::{Connection, Connector};
use chrono::Utc;
use reviewdesk_domain::{ClientMessage, ControlMessage, DomainEvent, ServerMessage};
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval, sleep, MissedTickBehavior};

/// Live connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// No connection; may be waiting to reconnect
    Disconnected,
    /// Connection attempt in progress
    Connecting,
    /// Receiving events
    Connected,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
        };
        f.write_str(s)
    }
}

enum SessionEnd {
    Shutdown,
    Closed,
    Lost(ClientError),
}

struct Shared {
    config: ClientConfig,
    connector: Arc<dyn Connector>,
    state: watch::Sender<ConnectionState>,
    refetch: watch::Sender<u64>,
    events: broadcast::Sender<DomainEvent>,
    buffer: Mutex<NotificationBuffer>,
    reconnect_attempts: AtomicU32,
    connections: AtomicU64,
    gave_up: AtomicBool,
}

impl Shared {
    fn set_state(&self, state: ConnectionState) {
        let previous = self.state.send_replace(state);
        if previous != state {
            tracing::debug!("connection state: {} -> {}", previous, state);
        }
    }

    fn deliver(&self, event: DomainEvent) {
        let fresh = match self.buffer.lock() {
            Ok(mut buffer) => buffer.push(event.clone()),
            Err(_) => true,
        };
        if !fresh {
            tracing::debug!(event_id = %event.id, "duplicate event ignored");
            return;
        }

        if event.event_type.requires_refetch() {
            self.refetch.send_modify(|n| *n += 1);
        }
        let _ = self.events.send(event);
    }
}

/// Resilient live connection with a local notification buffer
///
/// Events are signals: any `record_*`, `batch_*`, `export_complete` or
/// `sync_complete` event bumps the [`refetch_signal`](Self::refetch_signal)
/// counter so the caller reloads its records from the server.
pub struct ConnectionManager {
    shared: Arc<Shared>,
    shutdown: Option<watch::Sender<bool>>,
    task: Option<JoinHandle<()>>,
}

impl ConnectionManager {
    /// Create a manager; nothing connects until [`connect`](Self::connect)
    pub fn new(config: ClientConfig, connector: Arc<dyn Connector>) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        let (refetch, _) = watch::channel(0);
        let (events, _) = broadcast::channel(config.buffer_size.max(1));
        let buffer = Mutex::new(NotificationBuffer::new(config.buffer_size));

        Self {
            shared: Arc::new(Shared {
                config,
                connector,
                state,
                refetch,
                events,
                buffer,
                reconnect_attempts: AtomicU32::new(0),
                connections: AtomicU64::new(0),
                gave_up: AtomicBool::new(false),
            }),
            shutdown: None,
            task: None,
        }
    }

    /// Start connecting in the background; a no-op while already running
    pub fn connect(&mut self) {
        if self.is_running() {
            return;
        }

        let (tx, rx) = watch::channel(false);
        self.shared.reconnect_attempts.store(0, Ordering::SeqCst);
        self.shared.gave_up.store(false, Ordering::SeqCst);
        self.shutdown = Some(tx);
        self.task = Some(tokio::spawn(run(Arc::clone(&self.shared), rx)));
    }

    /// Close the connection; never schedules a reconnect
    pub async fn disconnect(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(true);
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
        self.shared.set_state(ConnectionState::Disconnected);
    }

    /// Wait until the background task ends on its own
    pub async fn wait(&mut self) {
        if let Some(task) = self.task.as_mut() {
            let _ = task.await;
            self.task = None;
        }
    }

    /// Whether the background task is alive
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Current state
    pub fn state(&self) -> ConnectionState {
        *self.shared.state.borrow()
    }

    /// Receiver notified on every state change
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.shared.state.subscribe()
    }

    /// Counter bumped by every event that requires a refetch
    pub fn refetch_signal(&self) -> watch::Receiver<u64> {
        self.shared.refetch.subscribe()
    }

    /// Live stream of new (non-duplicate) events
    pub fn events(&self) -> broadcast::Receiver<DomainEvent> {
        self.shared.events.subscribe()
    }

    /// Reconnects attempted since the last successful connect
    pub fn reconnect_attempts(&self) -> u32 {
        self.shared.reconnect_attempts.load(Ordering::SeqCst)
    }

    /// Successful connects so far
    pub fn connection_count(&self) -> u64 {
        self.shared.connections.load(Ordering::SeqCst)
    }

    /// Whether reconnecting stopped because attempts ran out
    pub fn gave_up(&self) -> bool {
        self.shared.gave_up.load(Ordering::SeqCst)
    }

    /// Buffered notifications, newest first
    pub fn notifications(&self) -> Vec<DomainEvent> {
        self.shared
            .buffer
            .lock()
            .map(|b| b.to_vec())
            .unwrap_or_default()
    }

    /// Notifications received since the last [`mark_all_read`](Self::mark_all_read)
    pub fn unread_count(&self) -> usize {
        self.shared
            .buffer
            .lock()
            .map(|b| b.unread_count())
            .unwrap_or(0)
    }

    /// Reset the unread counter
    pub fn mark_all_read(&self) {
        if let Ok(mut buffer) = self.shared.buffer.lock() {
            buffer.mark_all_read();
        }
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(true);
        }
    }
}

async fn stopped(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}

async fn run(shared: Arc<Shared>, mut shutdown: watch::Receiver<bool>) {
    let config = &shared.config;

    loop {
        shared.set_state(ConnectionState::Connecting);

        let connected = tokio::select! {
            result = shared.connector.connect() => result,
            _ = stopped(&mut shutdown) => break,
        };

        match connected {
            Ok(conn) => {
                shared.reconnect_attempts.store(0, Ordering::SeqCst);
                shared.connections.fetch_add(1, Ordering::SeqCst);
                shared.set_state(ConnectionState::Connected);
                tracing::info!("Live notifications connected");

                match session(&shared, conn, &mut shutdown).await {
                    SessionEnd::Shutdown => break,
                    SessionEnd::Closed => tracing::info!("Live notifications closed by server"),
                    SessionEnd::Lost(e) => tracing::warn!("Live notifications lost: {}", e),
                }
            }
            Err(e) => tracing::debug!("Connect failed: {}", e),
        }

        shared.set_state(ConnectionState::Disconnected);

        if !config.auto_reconnect {
            tracing::info!("Auto reconnect disabled; staying disconnected");
            break;
        }

        let attempts = shared.reconnect_attempts.load(Ordering::SeqCst);
        if attempts >= config.max_reconnect_attempts {
            tracing::warn!(
                "Giving up after {} reconnect attempts; falling back to polling",
                attempts
            );
            shared.gave_up.store(true, Ordering::SeqCst);
            break;
        }
        shared.reconnect_attempts.store(attempts + 1, Ordering::SeqCst);

        tokio::select! {
            _ = sleep(config.reconnect_delay()) => {}
            _ = stopped(&mut shutdown) => break,
        }
        tracing::debug!("Reconnect attempt {}", attempts + 1);
    }

    shared.set_state(ConnectionState::Disconnected);
}

async fn session(
    shared: &Shared,
    mut conn: Box<dyn Connection>,
    shutdown: &mut watch::Receiver<bool>,
) -> SessionEnd {
    if let Err(e) = conn.send(&ClientMessage::Subscribe { channel: None }).await {
        return SessionEnd::Lost(e);
    }

    let mut heartbeat = interval(shared.config.heartbeat());
    heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);
    heartbeat.tick().await;

    loop {
        tokio::select! {
            frame = conn.recv() => {
                match frame {
                    Some(Ok(ServerMessage::Event(event))) => shared.deliver(event),
                    Some(Ok(ServerMessage::Control(ControlMessage::Pong))) => {
                        tracing::trace!("pong");
                    }
                    Some(Ok(ServerMessage::Control(ControlMessage::Subscribed { channel }))) => {
                        tracing::debug!("subscribed to {}", channel);
                    }
                    Some(Err(e)) => return SessionEnd::Lost(e),
                    None => return SessionEnd::Closed,
                }
            }
            _ = heartbeat.tick() => {
                let ping = ClientMessage::Ping {
                    timestamp: Some(serde_json::Value::String(Utc::now().to_rfc3339())),
                };
                if let Err(e) = conn.send(&ping).await {
                    return SessionEnd::Lost(e);
                }
            }
            _ = stopped(shutdown) => {
                conn.close().await;
                return SessionEnd::Shutdown;
            }
        }
    }
}
