//! Domain events - transient messages describing review state changes
//!
//! Events are produced by the workflow after a change commits and fanned out
//! by the notification hub. They are never persisted.

use crate::record::{ExtractionRecord, RecordId};
use crate::transition::ActionKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;

/// Event type tag carried in the `type` field on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// A new record entered the review queue
    RecordCreated,
    /// A record was approved
    RecordApproved,
    /// A record was rejected
    RecordRejected,
    /// A record was edited
    RecordEdited,
    /// A batch approval finished with at least one success
    BatchApproved,
    /// A batch rejection finished with at least one success
    BatchRejected,
    /// An export finished
    ExportComplete,
    /// An external sync finished
    SyncComplete,
    /// Something failed server side
    Error,
}

impl EventType {
    /// Get the wire name of the event type
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::RecordCreated => "record_created",
            EventType::RecordApproved => "record_approved",
            EventType::RecordRejected => "record_rejected",
            EventType::RecordEdited => "record_edited",
            EventType::BatchApproved => "batch_approved",
            EventType::BatchRejected => "batch_rejected",
            EventType::ExportComplete => "export_complete",
            EventType::SyncComplete => "sync_complete",
            EventType::Error => "error",
        }
    }

    /// Whether a client should refetch record data on receipt
    pub fn requires_refetch(&self) -> bool {
        !matches!(self, EventType::Error)
    }

    /// The per-record event for a single transition
    pub fn for_action(action: ActionKind) -> Option<Self> {
        match action {
            ActionKind::Approve => Some(EventType::RecordApproved),
            ActionKind::Reject => Some(EventType::RecordRejected),
            ActionKind::Edit => Some(EventType::RecordEdited),
            ActionKind::Export => None,
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unique event identifier, used by clients for de-duplication
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    /// Generate a fresh, time-ordered event id
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7().to_string())
    }

    /// Borrow the id as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EventId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A notification about a state change
///
/// Wire shape: `{"type", "id", "timestamp", "data", "message"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainEvent {
    /// Event type tag
    #[serde(rename = "type")]
    pub event_type: EventType,

    /// Unique id
    pub id: EventId,

    /// When the event was produced
    pub timestamp: DateTime<Utc>,

    /// Event payload
    #[serde(default)]
    pub data: Value,

    /// Human-readable summary
    #[serde(default)]
    pub message: String,
}

impl DomainEvent {
    /// Build an event with a fresh id and the current time
    pub fn new(event_type: EventType, data: Value, message: impl Into<String>) -> Self {
        Self {
            event_type,
            id: EventId::new(),
            timestamp: Utc::now(),
            data,
            message: message.into(),
        }
    }

    /// A record entered the review queue
    pub fn record_created(record: &ExtractionRecord) -> Self {
        Self::new(
            EventType::RecordCreated,
            json!({
                "record_id": record.id,
                "record_type": record.source.record_type,
                "source_file": record.source.source_file,
                "confidence_score": record.confidence_score,
            }),
            format!(
                "New {} extracted from {}",
                record.source.record_type.as_str().to_lowercase(),
                record.source.source_file
            ),
        )
    }

    /// A record was approved
    pub fn record_approved(record: &ExtractionRecord) -> Self {
        Self::new(
            EventType::RecordApproved,
            json!({
                "record_id": record.id,
                "approved_by": record.reviewed_by,
            }),
            format!("Record {} approved", record.id),
        )
    }

    /// A record was rejected
    pub fn record_rejected(record: &ExtractionRecord) -> Self {
        Self::new(
            EventType::RecordRejected,
            json!({
                "record_id": record.id,
                "rejected_by": record.reviewed_by,
                "reason": record.review_notes,
            }),
            format!("Record {} rejected", record.id),
        )
    }

    /// A record was edited
    pub fn record_edited(record: &ExtractionRecord, actor: Option<&str>) -> Self {
        Self::new(
            EventType::RecordEdited,
            json!({
                "record_id": record.id,
                "edited_by": actor,
            }),
            format!("Record {} edited", record.id),
        )
    }

    /// A batch operation finished
    pub fn batch(event_type: EventType, ids: &[RecordId]) -> Self {
        let verb = match event_type {
            EventType::BatchRejected => "rejected",
            _ => "approved",
        };
        Self::new(
            event_type,
            json!({
                "count": ids.len(),
                "record_ids": ids,
            }),
            format!("{} records {}", ids.len(), verb),
        )
    }

    /// An export finished
    pub fn export_complete(format: &str, count: usize, exported_ids: &[RecordId]) -> Self {
        Self::new(
            EventType::ExportComplete,
            json!({
                "format": format,
                "count": count,
                "exported_ids": exported_ids,
            }),
            format!("Exported {} records to {}", count, format.to_uppercase()),
        )
    }

    /// An external sync finished
    pub fn sync_complete(count: usize, target: Option<&str>) -> Self {
        Self::new(
            EventType::SyncComplete,
            json!({
                "count": count,
                "target": target,
            }),
            format!("Synced {} records", count),
        )
    }

    /// Something failed server side
    pub fn error(message: impl Into<String>, details: Option<Value>) -> Self {
        Self::new(EventType::Error, details.unwrap_or(Value::Null), message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{RecordType, SourceDocument};
    use crate::RecordStatus;

    fn record() -> ExtractionRecord {
        ExtractionRecord::new(
            SourceDocument {
                source_file: "email_03.eml".to_string(),
                record_type: RecordType::Email,
            },
            serde_json::Map::new(),
            0.75,
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn test_wire_shape() {
        let event = DomainEvent::record_created(&record());
        let value = serde_json::to_value(&event).unwrap();

        assert_eq!(value["type"], "record_created");
        assert!(value["id"].is_string());
        assert!(value["timestamp"].is_string());
        assert_eq!(value["data"]["record_type"], "EMAIL");
        assert_eq!(value["message"], "New email extracted from email_03.eml");
    }

    #[test]
    fn test_ids_are_unique() {
        let a = DomainEvent::error("boom", None);
        let b = DomainEvent::error("boom", None);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_rejected_carries_reason() {
        let mut r = record();
        r.status = RecordStatus::Rejected;
        r.reviewed_by = Some("maria".into());
        r.review_notes = Some("duplicate".into());

        let event = DomainEvent::record_rejected(&r);
        assert_eq!(event.data["reason"], "duplicate");
        assert_eq!(event.data["rejected_by"], "maria");
    }

    #[test]
    fn test_batch_event() {
        let ids = vec![RecordId::new(), RecordId::new()];
        let event = DomainEvent::batch(EventType::BatchRejected, &ids);

        assert_eq!(event.event_type, EventType::BatchRejected);
        assert_eq!(event.data["count"], 2);
        assert_eq!(event.message, "2 records rejected");
    }

    #[test]
    fn test_sync_type_name() {
        let event = DomainEvent::sync_complete(4, Some("sheet-1"));
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], EventType::SyncComplete.as_str());
    }

    #[test]
    fn test_refetch_classification() {
        assert!(EventType::RecordApproved.requires_refetch());
        assert!(EventType::BatchApproved.requires_refetch());
        assert!(EventType::ExportComplete.requires_refetch());
        assert!(!EventType::Error.requires_refetch());
    }

    #[test]
    fn test_round_trip_from_wire() {
        let raw = r#"{"type":"record_approved","id":"abc","timestamp":"2026-01-05T10:00:00Z","data":{"record_id":"x"},"message":"ok"}"#;
        let event: DomainEvent = serde_json::from_str(raw).unwrap();
        assert_eq!(event.event_type, EventType::RecordApproved);
        assert_eq!(event.id.as_str(), "abc");
    }
}
