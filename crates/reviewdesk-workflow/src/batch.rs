//! Batch Coordinator - apply approve/reject to many records, one at a time
//!
//! Each id is re-read at execution time. Ids no longer eligible for review are
//! reported as skipped; unknown ids, lost races and store failures are captured
//! per item in `errors`. A batch never aborts early.

use crate::service::ReviewService;
use crate::WorkflowError;
use reviewdesk_domain::api::{BatchItemError, BatchResult};
use reviewdesk_domain::traits::RecordStore;
use reviewdesk_domain::{ActionKind, DomainEvent, EventType, RecordId, ReviewAction};
use reviewdesk_store::StoreError;
use std::collections::HashSet;

/// Action applied uniformly to every record of a batch
#[derive(Debug, Clone, PartialEq)]
pub enum BatchAction {
    /// Approve, with optional shared notes
    Approve {
        /// Notes applied to every record
        notes: Option<String>,
    },
    /// Reject, with one shared reason
    Reject {
        /// Reason applied to every record
        reason: String,
    },
}

impl BatchAction {
    fn to_review_action(&self) -> ReviewAction {
        match self {
            BatchAction::Approve { notes } => ReviewAction::Approve {
                notes: notes.clone(),
            },
            BatchAction::Reject { reason } => ReviewAction::Reject {
                reason: reason.clone(),
            },
        }
    }

    fn kind(&self) -> ActionKind {
        match self {
            BatchAction::Approve { .. } => ActionKind::Approve,
            BatchAction::Reject { .. } => ActionKind::Reject,
        }
    }

    fn event_type(&self) -> EventType {
        match self {
            BatchAction::Approve { .. } => EventType::BatchApproved,
            BatchAction::Reject { .. } => EventType::BatchRejected,
        }
    }
}

/// Applies one action to a list of record ids through a [`ReviewService`]
pub struct BatchCoordinator<'a, S> {
    service: &'a ReviewService<S>,
}

impl<'a, S> BatchCoordinator<'a, S>
where
    S: RecordStore<Error = StoreError>,
{
    /// Create a coordinator bound to a service
    pub fn new(service: &'a ReviewService<S>) -> Self {
        Self { service }
    }

    /// Apply `action` to every eligible id
    ///
    /// Fails up front only when the shared payload is invalid (a blank
    /// rejection reason); everything else is reported per item.
    pub fn apply_batch(
        &self,
        ids: &[RecordId],
        action: BatchAction,
        actor: Option<&str>,
    ) -> Result<BatchResult, WorkflowError> {
        let review_action = action.to_review_action();
        review_action.validate()?;

        let kind = action.kind();
        let mut seen = HashSet::new();
        let unique: Vec<RecordId> = ids.iter().copied().filter(|id| seen.insert(*id)).collect();

        let mut result = BatchResult {
            operation: kind.as_str().to_string(),
            ..Default::default()
        };

        tracing::info!("Starting batch {} of {} records", kind, unique.len());

        for id in unique.iter().copied() {
            let current = match self.service.lock_store() {
                Ok(store) => store.get_record(id).map_err(WorkflowError::from),
                Err(e) => Err(e),
            };

            let current = match current {
                Ok(Some(record)) => record,
                Ok(None) => {
                    Self::push_error(&mut result, id, &WorkflowError::NotFound(id));
                    continue;
                }
                Err(e) => {
                    Self::push_error(&mut result, id, &e);
                    continue;
                }
            };

            if !current.is_eligible_for_review() {
                tracing::debug!("Skipping {}: status is {}", id, current.status);
                result.skipped_ids.push(id);
                continue;
            }

            match self.service.transition(
                id,
                Some(current.status),
                &review_action,
                actor,
                Some(unique.len()),
            ) {
                Ok(_) => result.succeeded_ids.push(id),
                Err(WorkflowError::Conflict { actual, .. }) if !actual.is_eligible_for_review() => {
                    tracing::debug!("Skipping {}: reviewed concurrently, now {}", id, actual);
                    result.skipped_ids.push(id);
                }
                Err(e) => Self::push_error(&mut result, id, &e),
            }
        }

        match kind {
            ActionKind::Reject => result.rejected_count = result.succeeded_ids.len(),
            _ => result.approved_count = result.succeeded_ids.len(),
        }
        result.error_count = result.errors.len();

        self.service
            .with_metrics(|m| m.record_batch(result.error_count, result.skipped_ids.len()));

        tracing::info!("Batch {} finished: {}", kind, result.summary());

        if !result.succeeded_ids.is_empty() {
            self.service
                .publish(DomainEvent::batch(action.event_type(), &result.succeeded_ids));
        }

        Ok(result)
    }

    fn push_error(result: &mut BatchResult, id: RecordId, error: &WorkflowError) {
        tracing::warn!("Batch item {} failed: {}", id, error);
        result.errors.push(BatchItemError {
            record_id: id,
            error: error.to_string(),
            code: error.code().to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_action_mapping() {
        let reject = BatchAction::Reject { reason: "dup".into() };
        assert_eq!(reject.kind(), ActionKind::Reject);
        assert_eq!(reject.event_type(), EventType::BatchRejected);
        assert_eq!(
            reject.to_review_action(),
            ReviewAction::Reject { reason: "dup".into() }
        );
    }
}
