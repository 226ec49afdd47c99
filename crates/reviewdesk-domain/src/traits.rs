//! Trait definitions for external interactions
//!
//! These traits define the boundaries between domain logic and infrastructure.
//! Infrastructure implementations live in other crates.

use crate::{AuditEntry, DomainEvent, ExtractionRecord, RecordId, RecordStatus, RecordType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default page size for record listings
pub const DEFAULT_LIST_LIMIT: usize = 100;

/// Largest page size a caller may request
pub const MAX_LIST_LIMIT: usize = 500;

/// Trait for storing and retrieving extraction records
///
/// Implemented by the infrastructure layer (reviewdesk-store)
pub trait RecordStore {
    /// Error type for store operations
    type Error;

    /// Insert a new record together with its creation audit entry
    fn insert_record(
        &mut self,
        record: &ExtractionRecord,
        audit: &AuditEntry,
    ) -> Result<(), Self::Error>;

    /// Get a record by ID
    fn get_record(&self, id: RecordId) -> Result<Option<ExtractionRecord>, Self::Error>;

    /// List records matching the query, newest first, with the unpaged total
    fn list_records(
        &self,
        query: &RecordQuery,
    ) -> Result<(Vec<ExtractionRecord>, usize), Self::Error>;

    /// Persist a transitioned record, conditional on its stored status
    ///
    /// The write and the audit entry commit in one transaction, and only if
    /// the stored status still equals `expected_status`.
    fn update_record(
        &mut self,
        record: &ExtractionRecord,
        expected_status: RecordStatus,
        audit: &AuditEntry,
    ) -> Result<(), Self::Error>;

    /// Aggregate counts over all records
    fn stats(&self) -> Result<RecordStats, Self::Error>;

    /// Full audit chain for one record, oldest first
    fn audit_trail(&self, id: RecordId) -> Result<Vec<AuditEntry>, Self::Error>;

    /// Records in any of `statuses`, oldest first
    fn records_with_status(
        &self,
        statuses: &[RecordStatus],
    ) -> Result<Vec<ExtractionRecord>, Self::Error>;
}

/// Trait for handing domain events to whoever fans them out
///
/// Publication is best-effort: implementations must not block on slow
/// consumers and report nothing back to the caller.
pub trait EventPublisher: Send + Sync {
    /// Publish one event
    fn publish(&self, event: DomainEvent);
}

/// Query criteria for listing records
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordQuery {
    /// Filter by status
    pub status: Option<RecordStatus>,

    /// Filter by record type
    pub record_type: Option<RecordType>,

    /// Number of records to skip
    #[serde(default)]
    pub offset: usize,

    /// Page size; `None` means the default
    pub limit: Option<usize>,
}

impl RecordQuery {
    /// The page size actually applied, clamped to `1..=MAX_LIST_LIMIT`
    pub fn effective_limit(&self) -> usize {
        self.limit
            .unwrap_or(DEFAULT_LIST_LIMIT)
            .clamp(1, MAX_LIST_LIMIT)
    }

    /// The offset actually applied; SQLite offsets are signed 64-bit
    pub fn effective_offset(&self) -> usize {
        self.offset.min(i64::MAX as usize)
    }
}

/// Aggregate record counts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordStats {
    /// All records
    pub total: usize,

    /// Count per status name
    pub by_status: BTreeMap<String, usize>,

    /// Count per record type
    pub by_type: BTreeMap<String, usize>,

    /// Mean confidence over all records
    pub average_confidence: Option<f64>,
}

impl RecordStats {
    fn count(&self, status: RecordStatus) -> usize {
        self.by_status.get(status.as_str()).copied().unwrap_or(0)
    }

    /// Records awaiting first review
    pub fn pending_count(&self) -> usize {
        self.count(RecordStatus::Pending)
    }

    /// Approved plus edited, as the review dashboard counts them
    pub fn approved_count(&self) -> usize {
        self.count(RecordStatus::Approved) + self.count(RecordStatus::Edited)
    }

    /// Rejected records
    pub fn rejected_count(&self) -> usize {
        self.count(RecordStatus::Rejected)
    }

    /// Exported records
    pub fn exported_count(&self) -> usize {
        self.count(RecordStatus::Exported)
    }
}
