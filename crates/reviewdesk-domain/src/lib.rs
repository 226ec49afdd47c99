//! reviewdesk Domain Layer
//!
//! This crate contains the core business model for the review workflow:
//! extraction records, their review status, the pure status state machine,
//! domain events, and the wire protocol spoken between the notification hub
//! and connected clients. It performs no I/O.
//!
//! ## Key Concepts
//!
//! - **Extraction record**: machine-extracted data awaiting human review
//! - **Status**: `pending → edited → approved/rejected → exported`
//! - **Review action**: approve, reject (reason required), edit, export
//! - **Domain event**: transient message describing a state change
//!
//! ## Architecture
//!
//! This crate follows Clean Architecture:
//! - Pure business logic only
//! - Infrastructure implementations live in other crates
//! - Trait definitions for storage and event publication

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod api;
pub mod audit;
pub mod event;
pub mod protocol;
pub mod record;
pub mod status;
pub mod traits;
pub mod transition;

// Re-exports for convenience
pub use audit::AuditEntry;
pub use event::{DomainEvent, EventId, EventType};
pub use protocol::{ClientMessage, ControlMessage, ServerMessage};
pub use record::{ExtractionRecord, RecordId, RecordType, SourceDocument};
pub use status::RecordStatus;
pub use transition::{
    apply_action, list_eligible_for_review, next_status, ActionKind, ReviewAction,
    TransitionError,
};
