//! Connection manager behavior against a scripted transport
//!
//! All tests run with paused time so reconnect delays and heartbeats elapse
//! instantly.

use async_trait::async_trait;
use reviewdesk_client::{
    ClientConfig, ClientError, Connection, ConnectionManager, ConnectionState, Connector,
};
use reviewdesk_domain::{
    ClientMessage, ControlMessage, DomainEvent, EventType, RecordId, ServerMessage,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

struct MockConnection {
    inbound: mpsc::UnboundedReceiver<ServerMessage>,
    sent: Arc<Mutex<Vec<ClientMessage>>>,
}

#[async_trait]
impl Connection for MockConnection {
    async fn send(&mut self, message: &ClientMessage) -> Result<(), ClientError> {
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }

    async fn recv(&mut self) -> Option<Result<ServerMessage, ClientError>> {
        self.inbound.recv().await.map(Ok)
    }

    async fn close(&mut self) {
        self.inbound.close();
    }
}

/// Server side of one scripted connection
struct Peer {
    tx: mpsc::UnboundedSender<ServerMessage>,
    sent: Arc<Mutex<Vec<ClientMessage>>>,
}

impl Peer {
    fn push(&self, message: impl Into<ServerMessage>) {
        self.tx.send(message.into()).unwrap();
    }

    fn pings(&self) -> usize {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|m| matches!(m, ClientMessage::Ping { .. }))
            .count()
    }
}

enum Outcome {
    Fail,
    Open(MockConnection),
}

/// Hands out scripted outcomes in order; fails once the script is empty
#[derive(Default)]
struct ScriptedConnector {
    attempts: AtomicUsize,
    script: Mutex<VecDeque<Outcome>>,
}

impl ScriptedConnector {
    fn failing() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn push_fail(&self) {
        self.script.lock().unwrap().push_back(Outcome::Fail);
    }

    fn push_open(&self) -> Peer {
        let (tx, inbound) = mpsc::unbounded_channel();
        let sent = Arc::new(Mutex::new(Vec::new()));
        self.script.lock().unwrap().push_back(Outcome::Open(MockConnection {
            inbound,
            sent: Arc::clone(&sent),
        }));
        Peer { tx, sent }
    }

    fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    async fn connect(&self) -> Result<Box<dyn Connection>, ClientError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        match self.script.lock().unwrap().pop_front() {
            Some(Outcome::Open(conn)) => Ok(Box::new(conn)),
            Some(Outcome::Fail) | None => Err(ClientError::Connection("refused".into())),
        }
    }
}

async fn wait_connected(manager: &ConnectionManager) {
    let mut state = manager.watch_state();
    tokio::time::timeout(
        Duration::from_secs(300),
        state.wait_for(|s| *s == ConnectionState::Connected),
    )
    .await
    .expect("never connected")
    .unwrap();
}

fn approved(id: RecordId) -> DomainEvent {
    DomainEvent::batch(EventType::BatchApproved, &[id])
}

#[tokio::test(start_paused = true)]
async fn test_gives_up_after_exact_attempts() {
    let connector = ScriptedConnector::failing();
    let mut manager = ConnectionManager::new(ClientConfig::default(), connector.clone());

    manager.connect();
    manager.wait().await;

    // One initial attempt plus ten reconnects
    assert_eq!(connector.attempts(), 11);
    assert_eq!(manager.reconnect_attempts(), 10);
    assert!(manager.gave_up());
    assert_eq!(manager.state(), ConnectionState::Disconnected);
    assert!(!manager.is_running());
}

#[tokio::test(start_paused = true)]
async fn test_custom_attempt_limit_and_interval() {
    let connector = ScriptedConnector::failing();
    let config = ClientConfig {
        max_reconnect_attempts: 3,
        reconnect_interval_ms: 5_000,
        ..Default::default()
    };
    let mut manager = ConnectionManager::new(config, connector.clone());

    let started = tokio::time::Instant::now();
    manager.connect();
    manager.wait().await;

    assert_eq!(connector.attempts(), 4);
    assert_eq!(manager.reconnect_attempts(), 3);
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(15) && elapsed < Duration::from_secs(16));
}

#[tokio::test(start_paused = true)]
async fn test_auto_reconnect_disabled() {
    let connector = ScriptedConnector::failing();
    let config = ClientConfig {
        auto_reconnect: false,
        ..Default::default()
    };
    let mut manager = ConnectionManager::new(config, connector.clone());

    manager.connect();
    manager.wait().await;

    assert_eq!(connector.attempts(), 1);
    assert_eq!(manager.reconnect_attempts(), 0);
    assert!(!manager.gave_up());
}

#[tokio::test(start_paused = true)]
async fn test_events_buffered_and_pong_filtered() {
    let connector = ScriptedConnector::failing();
    let peer = connector.push_open();
    let mut manager = ConnectionManager::new(ClientConfig::default(), connector.clone());
    let mut events = manager.events();
    let mut refetch = manager.refetch_signal();

    manager.connect();
    wait_connected(&manager).await;

    let first = approved(RecordId::new());
    let failure = DomainEvent::error("sync failed", None);

    peer.push(ControlMessage::Pong);
    peer.push(first.clone());
    peer.push(first.clone());
    peer.push(failure.clone());

    assert_eq!(events.recv().await.unwrap().id, first.id);
    assert_eq!(events.recv().await.unwrap().id, failure.id);

    let buffered = manager.notifications();
    assert_eq!(buffered.len(), 2);
    assert_eq!(buffered[0].id, failure.id);
    assert_eq!(buffered[1].id, first.id);
    assert_eq!(manager.unread_count(), 2);

    // Only the batch event asks for a refetch; errors do not
    assert!(refetch.has_changed().unwrap());
    assert_eq!(*refetch.borrow_and_update(), 1);

    manager.mark_all_read();
    assert_eq!(manager.unread_count(), 0);

    // First frame after connecting subscribes
    let sent = peer.sent.lock().unwrap().clone();
    assert_eq!(sent.first(), Some(&ClientMessage::Subscribe { channel: None }));

    manager.disconnect().await;
}

#[tokio::test(start_paused = true)]
async fn test_heartbeat_pings_while_connected() {
    let connector = ScriptedConnector::failing();
    let peer = connector.push_open();
    let mut manager = ConnectionManager::new(ClientConfig::default(), connector.clone());

    manager.connect();
    wait_connected(&manager).await;

    tokio::time::sleep(Duration::from_secs(29)).await;
    assert_eq!(peer.pings(), 0);

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(peer.pings(), 1);

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(peer.pings(), 2);

    manager.disconnect().await;
}

#[tokio::test(start_paused = true)]
async fn test_reconnect_resets_counter() {
    let connector = ScriptedConnector::failing();
    let first = connector.push_open();
    connector.push_fail();
    let _second = connector.push_open();
    let mut manager = ConnectionManager::new(ClientConfig::default(), connector.clone());

    manager.connect();
    wait_connected(&manager).await;
    assert_eq!(manager.connection_count(), 1);

    // Server closes the connection
    drop(first);

    for _ in 0..30 {
        if manager.connection_count() == 2 {
            break;
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
    }

    assert_eq!(manager.connection_count(), 2);
    assert_eq!(connector.attempts(), 3);
    assert_eq!(manager.reconnect_attempts(), 0);
    assert_eq!(manager.state(), ConnectionState::Connected);

    manager.disconnect().await;
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_never_reconnects() {
    let connector = ScriptedConnector::failing();
    let _peer = connector.push_open();
    let mut manager = ConnectionManager::new(ClientConfig::default(), connector.clone());

    manager.connect();
    wait_connected(&manager).await;

    manager.disconnect().await;
    tokio::time::sleep(Duration::from_secs(120)).await;

    assert_eq!(connector.attempts(), 1);
    assert_eq!(manager.state(), ConnectionState::Disconnected);
    assert!(!manager.is_running());
    assert!(!manager.gave_up());
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_while_waiting_to_reconnect() {
    let connector = ScriptedConnector::failing();
    let mut manager = ConnectionManager::new(ClientConfig::default(), connector.clone());

    manager.connect();
    tokio::time::sleep(Duration::from_secs(1)).await;
    manager.disconnect().await;
    tokio::time::sleep(Duration::from_secs(60)).await;

    assert_eq!(connector.attempts(), 1);
    assert!(!manager.is_running());
}
