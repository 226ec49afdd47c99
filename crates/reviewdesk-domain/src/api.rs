//! Request and response bodies of the review HTTP API
//!
//! Shared by the server handlers and the REST client.

use crate::record::{FieldMap, RecordId};
use crate::traits::RecordStats;
use crate::{ExtractionRecord, RecordType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Header carrying the reviewer identity on mutating requests
pub const REVIEWER_HEADER: &str = "x-reviewer-id";

/// File formats the external export writer understands
pub const SUPPORTED_FORMATS: [&str; 3] = ["csv", "xlsx", "json"];

/// One page of records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordPage {
    /// Records on this page, newest first
    pub records: Vec<ExtractionRecord>,
    /// Matching records across all pages
    pub total: usize,
    /// Offset that was applied
    pub offset: usize,
    /// Page size that was applied
    pub limit: usize,
    /// Whether another page follows
    pub has_more: bool,
}

/// Body of `POST /api/v1/records`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateRecordRequest {
    /// Original file name
    pub source_file: String,
    /// Kind of document
    pub record_type: RecordType,
    /// Extracted payload
    pub extracted_data: FieldMap,
    /// Extractor confidence in [0, 1]
    pub confidence_score: f64,
}

/// Body of the approve endpoints
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApproveRequest {
    /// Optional reviewer notes
    #[serde(default)]
    pub notes: Option<String>,
}

/// Body of the reject endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RejectRequest {
    /// Mandatory reason; blank is rejected by the workflow
    #[serde(default)]
    pub reason: String,
}

/// Body of `PUT /api/v1/records/{id}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EditRequest {
    /// Field overrides
    #[serde(default)]
    pub data: FieldMap,
    /// Optional reviewer notes
    #[serde(default)]
    pub notes: Option<String>,
}

/// Body of `POST /api/v1/records/approve-batch`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchApproveRequest {
    /// Records to approve
    pub record_ids: Vec<RecordId>,
    /// Notes applied to every record
    #[serde(default)]
    pub notes: Option<String>,
}

/// Body of `POST /api/v1/records/reject-batch`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchRejectRequest {
    /// Records to reject
    pub record_ids: Vec<RecordId>,
    /// Reason applied to every record
    #[serde(default)]
    pub reason: String,
}

/// One failed item of a batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchItemError {
    /// The record that failed
    pub record_id: RecordId,
    /// Why it failed
    pub error: String,
    /// Machine-readable failure code
    pub code: String,
}

/// Outcome of a batch call
///
/// A non-empty `errors` list does not make the call itself fail; callers
/// inspect `error_count`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    /// `approve` or `reject`
    pub operation: String,
    /// Records approved by this batch
    pub approved_count: usize,
    /// Records rejected by this batch
    pub rejected_count: usize,
    /// Items that failed
    pub error_count: usize,
    /// Ids transitioned successfully, in request order
    pub succeeded_ids: Vec<RecordId>,
    /// Ids no longer eligible at execution time
    pub skipped_ids: Vec<RecordId>,
    /// Per-item failures
    pub errors: Vec<BatchItemError>,
}

impl BatchResult {
    /// Aggregate summary, e.g. `"2 succeeded, 1 failed, 1 skipped"`
    pub fn summary(&self) -> String {
        format!(
            "{} succeeded, {} failed, {} skipped",
            self.succeeded_ids.len(),
            self.error_count,
            self.skipped_ids.len()
        )
    }
}

fn default_format() -> String {
    "csv".to_string()
}

/// What to export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRequest {
    /// Specific records; `None` selects every exportable record
    #[serde(default)]
    pub record_ids: Option<Vec<RecordId>>,

    /// Also include rejected records when selecting all
    #[serde(default)]
    pub include_rejected: bool,

    /// Target format
    #[serde(default = "default_format")]
    pub format: String,
}

impl Default for ExportRequest {
    fn default() -> Self {
        Self {
            record_ids: None,
            include_rejected: false,
            format: default_format(),
        }
    }
}

/// Records selected for export, for an external file writer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportManifest {
    /// Target format
    pub format: String,
    /// Selected records in their post-export state, oldest first
    pub records: Vec<ExtractionRecord>,
    /// Records this export moved from `approved` to `exported`
    pub exported_ids: Vec<RecordId>,
}

/// Body of `GET /api/v1/records/stats`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsResponse {
    /// All records
    pub total: usize,
    /// Awaiting first review
    pub pending_count: usize,
    /// Approved plus edited
    pub approved_count: usize,
    /// Rejected
    pub rejected_count: usize,
    /// Exported
    pub exported_count: usize,
    /// Count per status
    pub by_status: BTreeMap<String, usize>,
    /// Count per record type
    pub by_type: BTreeMap<String, usize>,
    /// Mean confidence
    pub average_confidence: Option<f64>,
}

impl From<RecordStats> for StatsResponse {
    fn from(stats: RecordStats) -> Self {
        Self {
            total: stats.total,
            pending_count: stats.pending_count(),
            approved_count: stats.approved_count(),
            rejected_count: stats.rejected_count(),
            exported_count: stats.exported_count(),
            by_status: stats.by_status,
            by_type: stats.by_type,
            average_confidence: stats.average_confidence,
        }
    }
}

/// Body of `GET /api/v1/notifications/status`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotificationStatus {
    /// Always `active` while the hub runs
    pub status: String,
    /// Currently registered connections
    pub active_connections: usize,
    /// Events broadcast
    pub published: u64,
    /// Per-connection deliveries
    pub delivered: u64,
    /// Per-connection backpressure drops
    pub dropped: u64,
    /// Connections removed for silence
    pub reaped: u64,
}

/// Error body returned by every failing endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable message
    pub error: String,
    /// Machine-readable code, e.g. `not_found`
    pub code: String,
}
