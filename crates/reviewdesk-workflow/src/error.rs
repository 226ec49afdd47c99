//! Error types for workflow operations

use reviewdesk_domain::{ActionKind, RecordId, RecordStatus, TransitionError};
use reviewdesk_store::StoreError;
use thiserror::Error;

/// Errors returned synchronously by mutating and reading operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WorkflowError {
    /// Record id unknown
    #[error("Record not found: {0}")]
    NotFound(RecordId),

    /// Action is illegal from the record's current status
    #[error("Cannot {action} record with status: {from}")]
    InvalidTransition {
        /// Status the record was in
        from: RecordStatus,
        /// Action that was attempted
        action: ActionKind,
    },

    /// Payload failed validation (e.g. blank rejection reason)
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    /// The record's status changed between read and write
    #[error("Record {id} changed concurrently: expected {expected}, found {actual}")]
    Conflict {
        /// Record being transitioned
        id: RecordId,
        /// Status the caller expected
        expected: RecordStatus,
        /// Status actually stored
        actual: RecordStatus,
    },

    /// Storage layer error
    #[error("Storage error: {0}")]
    Store(String),
}

impl WorkflowError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            WorkflowError::NotFound(_) => "not_found",
            WorkflowError::InvalidTransition { .. } => "invalid_transition",
            WorkflowError::ValidationFailed(_) => "validation_failed",
            WorkflowError::Conflict { .. } => "conflict",
            WorkflowError::Store(_) => "store_error",
        }
    }
}

impl From<TransitionError> for WorkflowError {
    fn from(e: TransitionError) -> Self {
        match e {
            TransitionError::InvalidTransition { from, action } => {
                WorkflowError::InvalidTransition { from, action }
            }
            TransitionError::ValidationFailed(msg) => WorkflowError::ValidationFailed(msg),
        }
    }
}

impl From<StoreError> for WorkflowError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => WorkflowError::NotFound(id),
            StoreError::Conflict {
                id,
                expected,
                actual,
            } => WorkflowError::Conflict {
                id,
                expected,
                actual,
            },
            other => WorkflowError::Store(other.to_string()),
        }
    }
}
