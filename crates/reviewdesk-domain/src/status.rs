//! Status module - review lifecycle stages for extraction records

use serde::{Deserialize, Serialize};
use std::fmt;

/// Review status of an extraction record
///
/// Records start `Pending`, may be `Edited` any number of times, end review as
/// `Approved` or `Rejected`, and approved records may be `Exported`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    /// Freshly extracted, not yet looked at
    Pending,

    /// Verified by a reviewer
    Approved,

    /// Discarded by a reviewer, with a reason
    Rejected,

    /// Corrected by a reviewer, still awaiting approve/reject
    Edited,

    /// Included in an export after approval
    Exported,
}

impl RecordStatus {
    /// All statuses, in lifecycle order
    pub const ALL: [RecordStatus; 5] = [
        RecordStatus::Pending,
        RecordStatus::Edited,
        RecordStatus::Approved,
        RecordStatus::Rejected,
        RecordStatus::Exported,
    ];

    /// Get the status name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::Pending => "pending",
            RecordStatus::Approved => "approved",
            RecordStatus::Rejected => "rejected",
            RecordStatus::Edited => "edited",
            RecordStatus::Exported => "exported",
        }
    }

    /// Parse a status from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(RecordStatus::Pending),
            "approved" => Some(RecordStatus::Approved),
            "rejected" => Some(RecordStatus::Rejected),
            "edited" => Some(RecordStatus::Edited),
            "exported" => Some(RecordStatus::Exported),
            _ => None,
        }
    }

    /// Whether a record in this status may be approved, rejected or edited
    ///
    /// This is exactly `status ∈ {pending, edited}`.
    pub fn is_eligible_for_review(&self) -> bool {
        matches!(self, RecordStatus::Pending | RecordStatus::Edited)
    }
}

impl std::str::FromStr for RecordStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid status: {}", s))
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eligibility() {
        assert!(RecordStatus::Pending.is_eligible_for_review());
        assert!(RecordStatus::Edited.is_eligible_for_review());
        assert!(!RecordStatus::Approved.is_eligible_for_review());
        assert!(!RecordStatus::Rejected.is_eligible_for_review());
        assert!(!RecordStatus::Exported.is_eligible_for_review());
    }

    #[test]
    fn test_parse_round_trip() {
        for status in RecordStatus::ALL {
            assert_eq!(RecordStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(RecordStatus::parse("APPROVED"), Some(RecordStatus::Approved));
        assert!("archived".parse::<RecordStatus>().is_err());
    }
}
