//! Error types for hub operations

use crate::hub::ConnectionId;
use thiserror::Error;

/// Errors that can occur when addressing a single connection
///
/// Broadcasts never fail; per-connection drops are counted in
/// [`crate::HubStats`] instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HubError {
    /// Connection registry lock was poisoned
    #[error("Connection registry lock poisoned")]
    LockPoisoned,

    /// Connection is not (or no longer) registered
    #[error("Connection not found: {0}")]
    ConnectionNotFound(ConnectionId),

    /// Connection's outbound buffer is full
    #[error("Outbound buffer full for connection {0}")]
    BufferFull(ConnectionId),
}
