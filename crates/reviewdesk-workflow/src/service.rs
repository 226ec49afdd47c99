//! Review service - the single entry point for every record mutation
//!
//! Every state change goes read → [`apply_action`] → conditional write with
//! audit entry → publish. Publication happens after the write commits and
//! outside the store lock; a publisher that drops the event never undoes the
//! write.

use crate::audit::AuditRecorder;
use crate::batch::{BatchAction, BatchCoordinator};
use crate::export::ExportCoordinator;
use crate::{WorkflowError, WorkflowMetrics};
use chrono::Utc;
use reviewdesk_domain::api::{BatchResult, ExportManifest, ExportRequest, RecordPage};
use reviewdesk_domain::record::FieldMap;
use reviewdesk_domain::traits::{EventPublisher, RecordQuery, RecordStats, RecordStore};
use reviewdesk_domain::{
    apply_action, AuditEntry, DomainEvent, EventType, ExtractionRecord, RecordId, RecordStatus,
    ReviewAction, SourceDocument,
};
use reviewdesk_store::StoreError;
use serde_json::json;
use std::sync::{Arc, Mutex, MutexGuard};

/// Result of one successful transition
#[derive(Debug, Clone)]
pub struct TransitionOutcome {
    /// The persisted record
    pub record: ExtractionRecord,

    /// The event handed to the publisher, if the action has one
    pub event: Option<DomainEvent>,
}

/// Review workflow over a record store and an event publisher
///
/// Cheap to clone; clones share the store, publisher and metrics.
pub struct ReviewService<S> {
    store: Arc<Mutex<S>>,
    publisher: Arc<dyn EventPublisher>,
    audit: AuditRecorder,
    metrics: Arc<Mutex<WorkflowMetrics>>,
}

impl<S> Clone for ReviewService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            publisher: Arc::clone(&self.publisher),
            audit: self.audit,
            metrics: Arc::clone(&self.metrics),
        }
    }
}

impl<S> ReviewService<S>
where
    S: RecordStore<Error = StoreError>,
{
    /// Create a service that owns `store`
    pub fn new(store: S, publisher: Arc<dyn EventPublisher>) -> Self {
        Self::with_shared_store(Arc::new(Mutex::new(store)), publisher)
    }

    /// Create a service over an already shared store
    pub fn with_shared_store(store: Arc<Mutex<S>>, publisher: Arc<dyn EventPublisher>) -> Self {
        Self {
            store,
            publisher,
            audit: AuditRecorder::new(),
            metrics: Arc::new(Mutex::new(WorkflowMetrics::new())),
        }
    }

    pub(crate) fn lock_store(&self) -> Result<MutexGuard<'_, S>, WorkflowError> {
        self.store
            .lock()
            .map_err(|_| WorkflowError::Store("store lock poisoned".to_string()))
    }

    pub(crate) fn with_metrics(&self, f: impl FnOnce(&mut WorkflowMetrics)) {
        if let Ok(mut metrics) = self.metrics.lock() {
            f(&mut metrics);
        }
    }

    pub(crate) fn publish(&self, event: DomainEvent) {
        tracing::debug!(event_type = %event.event_type, event_id = %event.id, "publishing event");
        self.publisher.publish(event);
    }

    /// Snapshot of the workflow counters
    pub fn metrics(&self) -> WorkflowMetrics {
        self.metrics
            .lock()
            .map(|m| m.clone())
            .unwrap_or_default()
    }

    /// Insert a new `pending` record and announce it
    pub fn create_record(
        &self,
        source: SourceDocument,
        extracted_data: FieldMap,
        confidence_score: f64,
    ) -> Result<ExtractionRecord, WorkflowError> {
        let record = ExtractionRecord::new(source, extracted_data, confidence_score, Utc::now())
            .map_err(WorkflowError::ValidationFailed)?;
        let audit = self.audit.creation(&record);

        {
            let mut store = self.lock_store()?;
            store.insert_record(&record, &audit).map_err(|e| {
                tracing::error!("Failed to insert record {}: {}", record.id, e);
                WorkflowError::from(e)
            })?;
        }

        self.audit.committed(&audit);
        self.with_metrics(|m| m.record_created());
        tracing::info!(
            record_id = %record.id,
            record_type = %record.source.record_type,
            "record created from {}",
            record.source.source_file
        );

        self.publish(DomainEvent::record_created(&record));
        Ok(record)
    }

    /// Get one record
    pub fn get_record(&self, id: RecordId) -> Result<ExtractionRecord, WorkflowError> {
        self.lock_store()?
            .get_record(id)?
            .ok_or(WorkflowError::NotFound(id))
    }

    /// List records, newest first
    pub fn list_records(&self, query: &RecordQuery) -> Result<RecordPage, WorkflowError> {
        let (records, total) = self.lock_store()?.list_records(query)?;
        let limit = query.effective_limit();

        Ok(RecordPage {
            has_more: query.offset.saturating_add(records.len()) < total,
            records,
            total,
            offset: query.offset,
            limit,
        })
    }

    /// Aggregate counts
    pub fn stats(&self) -> Result<RecordStats, WorkflowError> {
        Ok(self.lock_store()?.stats()?)
    }

    /// Full audit chain for one record, oldest first
    pub fn audit_trail(&self, id: RecordId) -> Result<Vec<AuditEntry>, WorkflowError> {
        let store = self.lock_store()?;
        if store.get_record(id)?.is_none() {
            return Err(WorkflowError::NotFound(id));
        }
        Ok(store.audit_trail(id)?)
    }

    /// Validate and apply one action to one record
    ///
    /// When `expected_status` is given and the stored status differs, fails
    /// with [`WorkflowError::Conflict`] without touching the record. The
    /// persisted write is conditional on the status that was read, so a
    /// concurrent change between read and write also yields `Conflict`.
    pub fn apply_transition(
        &self,
        id: RecordId,
        expected_status: Option<RecordStatus>,
        action: &ReviewAction,
        actor: Option<&str>,
    ) -> Result<TransitionOutcome, WorkflowError> {
        self.transition(id, expected_status, action, actor, None)
    }

    pub(crate) fn transition(
        &self,
        id: RecordId,
        expected_status: Option<RecordStatus>,
        action: &ReviewAction,
        actor: Option<&str>,
        batch_size: Option<usize>,
    ) -> Result<TransitionOutcome, WorkflowError> {
        action.validate()?;
        let kind = action.kind();

        let (record, audit) = {
            let mut store = self.lock_store()?;
            let current = store.get_record(id)?.ok_or(WorkflowError::NotFound(id))?;

            if let Some(expected) = expected_status {
                if current.status != expected {
                    self.with_metrics(|m| m.record_conflict());
                    return Err(WorkflowError::Conflict {
                        id,
                        expected,
                        actual: current.status,
                    });
                }
            }

            let updated = apply_action(&current, action, actor, Utc::now())?;
            let audit = match batch_size {
                Some(size) => self.audit.batch_transition(&current, &updated, kind, actor, size),
                None => self.audit.transition(&current, &updated, kind, actor),
            };

            store
                .update_record(&updated, current.status, &audit)
                .map_err(|e| {
                    if matches!(e, StoreError::Conflict { .. }) {
                        self.with_metrics(|m| m.record_conflict());
                    } else {
                        tracing::error!("Failed to persist {} on {}: {}", kind, id, e);
                    }
                    WorkflowError::from(e)
                })?;

            (updated, audit)
        };

        self.audit.committed(&audit);
        self.with_metrics(|m| m.record_transition(kind));
        tracing::info!(record_id = %id, action = %kind, status = %record.status, "transition applied");

        let event = EventType::for_action(kind).map(|event_type| match event_type {
            EventType::RecordApproved => DomainEvent::record_approved(&record),
            EventType::RecordRejected => DomainEvent::record_rejected(&record),
            _ => DomainEvent::record_edited(&record, actor),
        });

        if let Some(event) = &event {
            self.publish(event.clone());
        }

        Ok(TransitionOutcome { record, event })
    }

    /// Approve one record
    pub fn approve(
        &self,
        id: RecordId,
        notes: Option<String>,
        actor: Option<&str>,
    ) -> Result<ExtractionRecord, WorkflowError> {
        self.apply_transition(id, None, &ReviewAction::Approve { notes }, actor)
            .map(|o| o.record)
    }

    /// Reject one record; `reason` must not be blank
    pub fn reject(
        &self,
        id: RecordId,
        reason: String,
        actor: Option<&str>,
    ) -> Result<ExtractionRecord, WorkflowError> {
        self.apply_transition(id, None, &ReviewAction::Reject { reason }, actor)
            .map(|o| o.record)
    }

    /// Replace the edited payload of one record
    pub fn edit(
        &self,
        id: RecordId,
        data: FieldMap,
        notes: Option<String>,
        actor: Option<&str>,
    ) -> Result<ExtractionRecord, WorkflowError> {
        self.apply_transition(id, None, &ReviewAction::Edit { data, notes }, actor)
            .map(|o| o.record)
    }

    /// Approve many records, isolating per-item failures
    pub fn approve_batch(
        &self,
        ids: &[RecordId],
        notes: Option<String>,
        actor: Option<&str>,
    ) -> Result<BatchResult, WorkflowError> {
        BatchCoordinator::new(self).apply_batch(ids, BatchAction::Approve { notes }, actor)
    }

    /// Reject many records with one shared reason
    pub fn reject_batch(
        &self,
        ids: &[RecordId],
        reason: String,
        actor: Option<&str>,
    ) -> Result<BatchResult, WorkflowError> {
        BatchCoordinator::new(self).apply_batch(ids, BatchAction::Reject { reason }, actor)
    }

    /// Select records for an export and mark approved ones as exported
    pub fn export(
        &self,
        request: &ExportRequest,
        actor: Option<&str>,
    ) -> Result<ExportManifest, WorkflowError> {
        ExportCoordinator::new(self).export(request, actor)
    }

    /// Announce that an external sync finished
    pub fn publish_sync_complete(&self, count: usize, target: Option<&str>) {
        tracing::info!("sync complete: {} records", count);
        self.publish(DomainEvent::sync_complete(count, target));
    }

    /// Announce a server-side failure to connected clients
    pub fn publish_error(&self, kind: &str, message: &str) {
        tracing::warn!(kind, "{}", message);
        self.publish(DomainEvent::error(message, Some(json!({ "kind": kind }))));
    }
}
