//! reviewdesk Notification Hub
//!
//! In-process pub/sub broker that pushes domain events to every connected
//! client.
//!
//! # Overview
//!
//! - **Registry**: one bounded outbound channel per connection behind a
//!   read/write lock; subscribing and unsubscribing take the write lock,
//!   broadcasting takes the read lock
//! - **Fan-out**: `try_send` to each connection; a full buffer drops the event
//!   for that connection only, and a closed one is removed
//! - **Liveness**: every inbound frame refreshes a connection's timestamp and
//!   [`HeartbeatReaper`] removes connections silent for longer than
//!   `stale_after_intervals` heartbeat intervals
//!
//! Nothing is persisted; clients recover missed events by refetching.
//!
//! # Usage
//!
//! ```no_run
//! use reviewdesk_domain::DomainEvent;
//! use reviewdesk_hub::{HubConfig, NotificationHub};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let hub = NotificationHub::new(HubConfig::default());
//! let mut subscription = hub.subscribe()?;
//!
//! hub.broadcast(DomainEvent::sync_complete(3, None));
//! if let Some(message) = subscription.recv().await {
//!     println!("{:?}", message);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod hub;
mod reaper;

pub use config::HubConfig;
pub use error::HubError;
pub use hub::{BroadcastReport, ConnectionId, HubStats, NotificationHub, Subscription};
pub use reaper::HeartbeatReaper;
