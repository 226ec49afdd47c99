//! reviewdesk client
//!
//! Reviewer-side library: an async REST client for the review API and the
//! Client Connection Manager that keeps a live notification stream open.
//!
//! # Overview
//!
//! - [`ReviewApiClient`]: typed calls for every review endpoint
//! - [`ConnectionManager`]: heartbeat, fixed-delay reconnect with a bounded
//!   attempt count, and a de-duplicating [`NotificationBuffer`]
//! - [`RecordCache`]: last fetched page and statistics, reloaded whenever the
//!   manager signals a refetch
//!
//! Events are refetch signals, never merged into local state.
//!
//! # Example
//!
//! ```no_run
//! use reviewdesk_client::{ClientConfig, ConnectionManager, RecordCache, ReviewApiClient, WsConnector};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), reviewdesk_client::ClientError> {
//! let api = ReviewApiClient::new("http://localhost:8000").with_reviewer("maria");
//! let connector = Arc::new(WsConnector::new(api.notifications_url()));
//! let mut manager = ConnectionManager::new(ClientConfig::default(), connector);
//! manager.connect();
//!
//! let mut cache = RecordCache::default();
//! let mut refetch = manager.refetch_signal();
//! while refetch.changed().await.is_ok() {
//!     cache.refresh(&api).await?;
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod api;
mod buffer;
mod cache;
mod config;
mod error;
mod manager;
mod transport;

pub use api::{RecordSource, ReviewApiClient};
pub use buffer::NotificationBuffer;
pub use cache::RecordCache;
pub use config::ClientConfig;
pub use error::ClientError;
pub use manager::{ConnectionManager, ConnectionState};
pub use transport::{Connection, Connector, WsConnector};
