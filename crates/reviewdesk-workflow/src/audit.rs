//! Audit Recorder
//!
//! Builds the audit entry that travels with every state-changing write. The
//! store persists it in the same transaction as the record update; once the
//! write commits the entry is also emitted on the `audit` tracing target.

use reviewdesk_domain::{ActionKind, AuditEntry, ExtractionRecord};
use serde_json::{json, Value};

/// Produces and reports audit entries
#[derive(Debug, Clone, Copy, Default)]
pub struct AuditRecorder;

impl AuditRecorder {
    /// Create a recorder
    pub fn new() -> Self {
        Self
    }

    /// Entry for a single transition from `before` to `after`
    ///
    /// Edits record which fields were touched.
    pub fn transition(
        &self,
        before: &ExtractionRecord,
        after: &ExtractionRecord,
        action: ActionKind,
        actor: Option<&str>,
    ) -> AuditEntry {
        let entry = AuditEntry::for_transition(before, after, action, actor);
        match (action, after.edited_data.as_ref()) {
            (ActionKind::Edit, Some(edited)) => {
                let fields: Vec<&String> = edited.keys().collect();
                entry.with_details(json!({ "fields": fields }))
            }
            _ => entry,
        }
    }

    /// Entry for a transition performed as part of a batch
    pub fn batch_transition(
        &self,
        before: &ExtractionRecord,
        after: &ExtractionRecord,
        action: ActionKind,
        actor: Option<&str>,
        batch_size: usize,
    ) -> AuditEntry {
        self.transition(before, after, action, actor)
            .with_details(json!({ "batch_size": batch_size }))
    }

    /// Entry for a freshly created record
    pub fn creation(&self, record: &ExtractionRecord) -> AuditEntry {
        AuditEntry::for_creation(record).with_details(json!({
            "source_file": record.source.source_file,
            "confidence_score": record.confidence_score,
        }))
    }

    /// Report a committed entry on the `audit` target
    pub fn committed(&self, entry: &AuditEntry) {
        let details = match &entry.details {
            Value::Null => String::new(),
            other => other.to_string(),
        };
        tracing::info!(
            target: "audit",
            record_id = %entry.record_id,
            action = %entry.action,
            actor = entry.actor.as_deref().unwrap_or("-"),
            from = entry.from_status.map(|s| s.as_str()).unwrap_or("-"),
            to = %entry.to_status,
            details = %details,
            "record state changed"
        );
    }
}
