//! Audit entries - who did what to which record, and when

use crate::record::{ExtractionRecord, RecordId};
use crate::status::RecordStatus;
use crate::transition::ActionKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One row of the append-only audit log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Record the action was applied to
    pub record_id: RecordId,

    /// Action name (`approve`, `reject`, `edit`, `export`, `create`)
    pub action: String,

    /// Reviewer, if known
    pub actor: Option<String>,

    /// Status before the action; `None` on creation
    pub from_status: Option<RecordStatus>,

    /// Status after the action
    pub to_status: RecordStatus,

    /// Notes or rejection reason
    pub notes: Option<String>,

    /// Free-form extra context (e.g. edited fields, batch membership)
    #[serde(default)]
    pub details: Value,

    /// When the action was applied
    pub at: DateTime<Utc>,
}

impl AuditEntry {
    /// Entry describing a transition from `before` to `after`
    pub fn for_transition(
        before: &ExtractionRecord,
        after: &ExtractionRecord,
        action: ActionKind,
        actor: Option<&str>,
    ) -> Self {
        Self {
            record_id: after.id,
            action: action.as_str().to_string(),
            actor: actor.map(str::to_string),
            from_status: Some(before.status),
            to_status: after.status,
            notes: after.review_notes.clone(),
            details: Value::Null,
            at: after.updated_at,
        }
    }

    /// Entry describing the creation of a record
    pub fn for_creation(record: &ExtractionRecord) -> Self {
        Self {
            record_id: record.id,
            action: "create".to_string(),
            actor: None,
            from_status: None,
            to_status: record.status,
            notes: None,
            details: Value::Null,
            at: record.created_at,
        }
    }

    /// Attach extra context
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }
}
