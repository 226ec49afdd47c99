//! Status state machine - validates and applies one review action to one record
//!
//! Transition table (all other pairs are rejected):
//!
//! | From | Action | To |
//! |------|--------|----|
//! | pending | approve | approved |
//! | pending | reject (reason) | rejected |
//! | pending | edit (data) | edited |
//! | edited | approve | approved |
//! | edited | reject (reason) | rejected |
//! | edited | edit (data) | edited |
//! | approved | export | exported |
//!
//! Everything here is pure: persistence, the conditional write and event
//! publication happen in the workflow crate.

use crate::record::{ExtractionRecord, FieldMap};
use crate::status::RecordStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of a review action, without its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    /// Mark as verified
    Approve,
    /// Mark as invalid
    Reject,
    /// Override extracted fields
    Edit,
    /// Include in an export
    Export,
}

impl ActionKind {
    /// All action kinds
    pub const ALL: [ActionKind; 4] = [
        ActionKind::Approve,
        ActionKind::Reject,
        ActionKind::Edit,
        ActionKind::Export,
    ];

    /// Get the action name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Approve => "approve",
            ActionKind::Reject => "reject",
            ActionKind::Edit => "edit",
            ActionKind::Export => "export",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A review action with its payload
#[derive(Debug, Clone, PartialEq)]
pub enum ReviewAction {
    /// Approve, with optional notes
    Approve {
        /// Reviewer notes
        notes: Option<String>,
    },
    /// Reject; the reason is mandatory
    Reject {
        /// Rejection reason
        reason: String,
    },
    /// Replace the edited payload, with optional notes
    Edit {
        /// New field values
        data: FieldMap,
        /// Reviewer notes
        notes: Option<String>,
    },
    /// Mark an approved record as exported
    Export,
}

impl ReviewAction {
    /// The payload-free kind of this action
    pub fn kind(&self) -> ActionKind {
        match self {
            ReviewAction::Approve { .. } => ActionKind::Approve,
            ReviewAction::Reject { .. } => ActionKind::Reject,
            ReviewAction::Edit { .. } => ActionKind::Edit,
            ReviewAction::Export => ActionKind::Export,
        }
    }

    /// Check the payload independently of any record state
    pub fn validate(&self) -> Result<(), TransitionError> {
        match self {
            ReviewAction::Reject { reason } if reason.trim().is_empty() => Err(
                TransitionError::ValidationFailed("Rejection reason is required".to_string()),
            ),
            ReviewAction::Edit { data, .. } if data.is_empty() => Err(
                TransitionError::ValidationFailed("Edit requires at least one field".to_string()),
            ),
            _ => Ok(()),
        }
    }
}

/// Why a transition could not be applied
#[derive(Debug, Clone, PartialEq)]
pub enum TransitionError {
    /// The action is not legal from the record's current status
    InvalidTransition {
        /// Status the record was in
        from: RecordStatus,
        /// Action that was attempted
        action: ActionKind,
    },
    /// The action payload is invalid (e.g. blank rejection reason)
    ValidationFailed(String),
}

impl fmt::Display for TransitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransitionError::InvalidTransition { from, action } => {
                write!(f, "Cannot {} record with status: {}", action, from)
            }
            TransitionError::ValidationFailed(msg) => write!(f, "Validation failed: {}", msg),
        }
    }
}

impl std::error::Error for TransitionError {}

/// Look up the transition table
///
/// Returns the status reached by applying `action` from `from`, or `None` if
/// the pair is not in the table.
pub fn next_status(from: RecordStatus, action: ActionKind) -> Option<RecordStatus> {
    use ActionKind::*;
    use RecordStatus::*;

    match (from, action) {
        (Pending | Edited, Approve) => Some(Approved),
        (Pending | Edited, Reject) => Some(Rejected),
        (Pending | Edited, Edit) => Some(Edited),
        (Approved, Export) => Some(Exported),
        _ => None,
    }
}

/// Apply one action to one record, producing the updated record
///
/// The payload is validated before the table is consulted, so a blank
/// rejection reason is always `ValidationFailed`. The input record is not
/// modified.
pub fn apply_action(
    record: &ExtractionRecord,
    action: &ReviewAction,
    actor: Option<&str>,
    now: DateTime<Utc>,
) -> Result<ExtractionRecord, TransitionError> {
    action.validate()?;

    let to = next_status(record.status, action.kind()).ok_or(
        TransitionError::InvalidTransition {
            from: record.status,
            action: action.kind(),
        },
    )?;

    let mut updated = record.clone();
    updated.status = to;
    updated.updated_at = now;

    match action {
        ReviewAction::Approve { notes } => {
            updated.reviewed_by = actor.map(str::to_string);
            updated.reviewed_at = Some(now);
            updated.review_notes = normalize_notes(notes.as_deref());
        }
        ReviewAction::Reject { reason } => {
            updated.reviewed_by = actor.map(str::to_string);
            updated.reviewed_at = Some(now);
            updated.review_notes = Some(reason.trim().to_string());
        }
        ReviewAction::Edit { data, notes } => {
            updated.edited_data = Some(data.clone());
            if let Some(notes) = normalize_notes(notes.as_deref()) {
                updated.review_notes = Some(notes);
            }
        }
        ReviewAction::Export => {
            updated.exported_at = Some(now);
        }
    }

    Ok(updated)
}

/// Filter records down to those a reviewer may still act on
///
/// Implements exactly `status ∈ {pending, edited}`.
pub fn list_eligible_for_review(records: &[ExtractionRecord]) -> Vec<&ExtractionRecord> {
    records.iter().filter(|r| r.is_eligible_for_review()).collect()
}

fn normalize_notes(notes: Option<&str>) -> Option<String> {
    notes
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::record::{RecordType, SourceDocument};
    use proptest::prelude::*;
    use serde_json::json;

    fn status_strategy() -> impl Strategy<Value = RecordStatus> {
        prop::sample::select(RecordStatus::ALL.to_vec())
    }

    fn kind_strategy() -> impl Strategy<Value = ActionKind> {
        prop::sample::select(ActionKind::ALL.to_vec())
    }

    const LEGAL: [(RecordStatus, ActionKind, RecordStatus); 7] = [
        (RecordStatus::Pending, ActionKind::Approve, RecordStatus::Approved),
        (RecordStatus::Pending, ActionKind::Reject, RecordStatus::Rejected),
        (RecordStatus::Pending, ActionKind::Edit, RecordStatus::Edited),
        (RecordStatus::Edited, ActionKind::Approve, RecordStatus::Approved),
        (RecordStatus::Edited, ActionKind::Reject, RecordStatus::Rejected),
        (RecordStatus::Edited, ActionKind::Edit, RecordStatus::Edited),
        (RecordStatus::Approved, ActionKind::Export, RecordStatus::Exported),
    ];

    fn valid_action(kind: ActionKind) -> ReviewAction {
        match kind {
            ActionKind::Approve => ReviewAction::Approve { notes: None },
            ActionKind::Reject => ReviewAction::Reject { reason: "illegible".into() },
            ActionKind::Edit => ReviewAction::Edit {
                data: json!({"k": "v"}).as_object().cloned().unwrap(),
                notes: None,
            },
            ActionKind::Export => ReviewAction::Export,
        }
    }

    fn record_in(status: RecordStatus) -> ExtractionRecord {
        let mut record = ExtractionRecord::new(
            SourceDocument { source_file: "f".into(), record_type: RecordType::Invoice },
            FieldMap::new(),
            0.5,
            Utc::now(),
        )
        .unwrap();
        record.status = status;
        record
    }

    #[test]
    fn test_every_pair_matches_table() {
        let mut legal = 0;
        for from in RecordStatus::ALL {
            for kind in ActionKind::ALL {
                let result = apply_action(&record_in(from), &valid_action(kind), None, Utc::now())
                    .map(|r| r.status);
                match LEGAL.iter().find(|(f, k, _)| *f == from && *k == kind) {
                    Some((_, _, to)) => {
                        legal += 1;
                        assert_eq!(result, Ok(*to), "{} from {}", kind, from);
                    }
                    None => assert_eq!(
                        result,
                        Err(TransitionError::InvalidTransition { from, action: kind }),
                        "{} from {}",
                        kind,
                        from
                    ),
                }
            }
        }
        assert_eq!(legal, 7);
    }

    #[test]
    fn test_rejected_and_exported_are_terminal() {
        for from in [RecordStatus::Rejected, RecordStatus::Exported] {
            for kind in ActionKind::ALL {
                let result = apply_action(&record_in(from), &valid_action(kind), None, Utc::now());
                assert!(result.is_err());
            }
        }
    }

    proptest! {
        /// Property: a transition succeeds exactly for the pairs in the table
        #[test]
        fn test_only_table_pairs_succeed(from in status_strategy(), kind in kind_strategy()) {
            let mut record = ExtractionRecord::new(
                SourceDocument { source_file: "f".into(), record_type: RecordType::Email },
                FieldMap::new(),
                0.5,
                Utc::now(),
            ).unwrap();
            record.status = from;

            let result = apply_action(&record, &valid_action(kind), Some("r"), Utc::now());
            let expected = LEGAL
                .iter()
                .find(|(f, k, _)| *f == from && *k == kind)
                .map(|(_, _, to)| *to);
            match expected {
                Some(to) => prop_assert_eq!(result.map(|r| r.status), Ok(to)),
                None => prop_assert_eq!(
                    result.map(|r| r.status),
                    Err(TransitionError::InvalidTransition { from, action: kind })
                ),
            }
        }

        /// Property: any whitespace-only reason fails validation from every status
        #[test]
        fn test_blank_reason_always_invalid(from in status_strategy(), reason in "[ \t\n]{0,8}") {
            let mut record = ExtractionRecord::new(
                SourceDocument { source_file: "f".into(), record_type: RecordType::Form },
                FieldMap::new(),
                0.5,
                Utc::now(),
            ).unwrap();
            record.status = from;

            let result = apply_action(&record, &ReviewAction::Reject { reason }, None, Utc::now());
            prop_assert!(matches!(result, Err(TransitionError::ValidationFailed(_))));
        }
    }
}
