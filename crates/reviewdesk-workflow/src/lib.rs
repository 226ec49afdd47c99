//! reviewdesk Workflow
//!
//! Review operations over extraction records: single transitions, batch
//! approve/reject, export coordination and the audit trail.
//!
//! # Overview
//!
//! [`ReviewService`] is the only component that mutates records. Every
//! operation:
//! - validates the action against the status state machine
//! - persists the new record state and its audit entry in one conditional write
//! - publishes a domain event after the write commits (best-effort)
//!
//! # Usage
//!
//! ```no_run
//! use reviewdesk_domain::traits::EventPublisher;
//! use reviewdesk_domain::{DomainEvent, RecordId};
//! use reviewdesk_store::SqliteStore;
//! use reviewdesk_workflow::ReviewService;
//! use std::sync::Arc;
//!
//! struct Discard;
//! impl EventPublisher for Discard {
//!     fn publish(&self, _event: DomainEvent) {}
//! }
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = SqliteStore::new("reviewdesk.db")?;
//! let service = ReviewService::new(store, Arc::new(Discard));
//!
//! let ids = vec![RecordId::new(), RecordId::new()];
//! let result = service.approve_batch(&ids, None, Some("maria"))?;
//! println!("{}", result.summary());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod audit;
mod batch;
mod error;
mod export;
mod metrics;
mod service;

pub use audit::AuditRecorder;
pub use batch::{BatchAction, BatchCoordinator};
pub use error::WorkflowError;
pub use export::ExportCoordinator;
pub use metrics::WorkflowMetrics;
pub use reviewdesk_domain::api::{
    BatchItemError, BatchResult, ExportManifest, ExportRequest, RecordPage, SUPPORTED_FORMATS,
};
pub use service::{ReviewService, TransitionOutcome};
