//! Record module - the unit of machine-extracted data awaiting review

use crate::status::RecordStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Field → value mapping used for extracted and edited payloads
pub type FieldMap = serde_json::Map<String, serde_json::Value>;

/// Unique identifier for an extraction record based on UUIDv7
///
/// UUIDv7 gives chronological sortability, so newer records compare greater.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordId(u128);

impl RecordId {
    /// Generate a new UUIDv7-based RecordId
    ///
    /// # Examples
    ///
    /// ```
    /// use reviewdesk_domain::RecordId;
    ///
    /// let id = RecordId::new();
    /// assert!(id.value() > 0);
    /// ```
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7().as_u128())
    }

    /// Create a RecordId from a raw u128 value
    ///
    /// This is primarily for storage layer deserialization.
    pub fn from_value(value: u128) -> Self {
        Self(value)
    }

    /// Parse a RecordId from its hyphenated UUID string
    ///
    /// # Examples
    ///
    /// ```
    /// use reviewdesk_domain::RecordId;
    ///
    /// let id = RecordId::new();
    /// let parsed = RecordId::from_string(&id.to_string()).unwrap();
    /// assert_eq!(id, parsed);
    /// ```
    pub fn from_string(s: &str) -> Result<Self, String> {
        uuid::Uuid::parse_str(s.trim())
            .map(|u| Self(u.as_u128()))
            .map_err(|e| format!("Invalid record id '{}': {}", s, e))
    }

    /// Get the raw u128 value
    pub fn value(&self) -> u128 {
        self.0
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", uuid::Uuid::from_u128(self.0))
    }
}

impl std::str::FromStr for RecordId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_string(s)
    }
}

impl Serialize for RecordId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_string(&s).map_err(serde::de::Error::custom)
    }
}

/// Kind of document a record was extracted from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecordType {
    /// Web or paper contact form
    Form,
    /// Inbound email
    Email,
    /// Supplier invoice
    Invoice,
}

impl RecordType {
    /// Get the record type as its storage/wire string
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::Form => "FORM",
            RecordType::Email => "EMAIL",
            RecordType::Invoice => "INVOICE",
        }
    }

    /// Parse a record type, case-insensitively
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "FORM" => Some(RecordType::Form),
            "EMAIL" => Some(RecordType::Email),
            "INVOICE" => Some(RecordType::Invoice),
            _ => None,
        }
    }
}

impl std::str::FromStr for RecordType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid record type: {}", s))
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference to the document a record was extracted from
///
/// Opaque to the review workflow; carried for display and notifications.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceDocument {
    /// Original file name
    pub source_file: String,

    /// Kind of document
    pub record_type: RecordType,
}

/// An extraction record and its review state
///
/// Only the status state machine ([`crate::transition::apply_action`]) may
/// change `status` and the review fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionRecord {
    /// Unique identifier, immutable
    pub id: RecordId,

    /// Originating document
    pub source: SourceDocument,

    /// Payload produced by the extractor
    pub extracted_data: FieldMap,

    /// Extractor confidence in [0, 1], set once at creation
    pub confidence_score: f64,

    /// Current review status
    pub status: RecordStatus,

    /// Reviewer overrides of the extracted payload
    pub edited_data: Option<FieldMap>,

    /// Reviewer who approved or rejected the record
    pub reviewed_by: Option<String>,

    /// When the record was approved or rejected
    pub reviewed_at: Option<DateTime<Utc>>,

    /// Approval notes, edit notes, or the rejection reason
    pub review_notes: Option<String>,

    /// When the record was first moved to `exported`
    pub exported_at: Option<DateTime<Utc>>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Bumped on every mutation
    pub updated_at: DateTime<Utc>,
}

impl ExtractionRecord {
    /// Create a new `pending` record from an extraction result
    ///
    /// Fails if the confidence score is outside [0, 1].
    pub fn new(
        source: SourceDocument,
        extracted_data: FieldMap,
        confidence_score: f64,
        now: DateTime<Utc>,
    ) -> Result<Self, String> {
        if !(0.0..=1.0).contains(&confidence_score) {
            return Err(format!(
                "Confidence score must be within [0, 1], got {}",
                confidence_score
            ));
        }

        Ok(Self {
            id: RecordId::new(),
            source,
            extracted_data,
            confidence_score,
            status: RecordStatus::Pending,
            edited_data: None,
            reviewed_by: None,
            reviewed_at: None,
            review_notes: None,
            exported_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// The data a downstream consumer should use: edits win over extraction
    pub fn final_data(&self) -> &FieldMap {
        self.edited_data.as_ref().unwrap_or(&self.extracted_data)
    }

    /// Whether a reviewer may still approve, reject or edit this record
    pub fn is_eligible_for_review(&self) -> bool {
        self.status.is_eligible_for_review()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn source() -> SourceDocument {
        SourceDocument {
            source_file: "contact_form_1.html".to_string(),
            record_type: RecordType::Form,
        }
    }

    fn payload() -> FieldMap {
        json!({"full_name": "Νίκος Παπαδόπουλος", "email": "nikos@example.gr"})
            .as_object()
            .cloned()
            .unwrap()
    }

    #[test]
    fn test_record_id_display_and_parse() {
        let id = RecordId::new();
        let id_str = id.to_string();

        assert_eq!(id_str.len(), 36);
        assert_eq!(RecordId::from_string(&id_str).unwrap(), id);
    }

    #[test]
    fn test_record_id_invalid_string() {
        assert!(RecordId::from_string("not-a-valid-uuid").is_err());
        assert!(RecordId::from_string("").is_err());
    }

    #[test]
    fn test_record_id_serializes_as_string() {
        let id = RecordId::from_value(42);
        let json = serde_json::to_value(id).unwrap();
        assert_eq!(json, json!("00000000-0000-0000-0000-00000000002a"));
    }

    #[test]
    fn test_new_record_is_pending() {
        let now = Utc::now();
        let record = ExtractionRecord::new(source(), payload(), 0.92, now).unwrap();

        assert_eq!(record.status, RecordStatus::Pending);
        assert!(record.reviewed_by.is_none());
        assert_eq!(record.created_at, record.updated_at);
        assert!(record.is_eligible_for_review());
    }

    #[test]
    fn test_confidence_out_of_range_rejected() {
        assert!(ExtractionRecord::new(source(), payload(), 1.2, Utc::now()).is_err());
        assert!(ExtractionRecord::new(source(), payload(), -0.1, Utc::now()).is_err());
    }

    #[test]
    fn test_final_data_prefers_edits() {
        let mut record = ExtractionRecord::new(source(), payload(), 0.5, Utc::now()).unwrap();
        assert_eq!(record.final_data(), &payload());

        let edited = json!({"full_name": "Nikos P."}).as_object().cloned().unwrap();
        record.edited_data = Some(edited.clone());
        assert_eq!(record.final_data(), &edited);
    }

    #[test]
    fn test_record_type_parse() {
        assert_eq!(RecordType::parse("invoice"), Some(RecordType::Invoice));
        assert_eq!(RecordType::parse("EMAIL"), Some(RecordType::Email));
        assert_eq!(RecordType::parse("fax"), None);
    }
}
