//! Integration tests for reviewdesk-store
//!
//! These tests verify record persistence, conditional transitions and the
//! audit log.

use chrono::{Duration, Utc};
use reviewdesk_domain::record::FieldMap;
use reviewdesk_domain::traits::{RecordQuery, RecordStore};
use reviewdesk_domain::{
    apply_action, ActionKind, AuditEntry, ExtractionRecord, RecordId, RecordStatus, RecordType,
    ReviewAction, SourceDocument,
};
use reviewdesk_store::{SqliteStore, StoreError};
use serde_json::json;

fn fields(value: serde_json::Value) -> FieldMap {
    value.as_object().cloned().unwrap()
}

fn new_record(file: &str, record_type: RecordType, confidence: f64) -> ExtractionRecord {
    ExtractionRecord::new(
        SourceDocument {
            source_file: file.to_string(),
            record_type,
        },
        fields(json!({"customer": "Acme", "total": "120.00"})),
        confidence,
        Utc::now(),
    )
    .unwrap()
}

fn insert(store: &mut SqliteStore, record: &ExtractionRecord) {
    store
        .insert_record(record, &AuditEntry::for_creation(record))
        .unwrap();
}

fn transition(
    store: &mut SqliteStore,
    record: &ExtractionRecord,
    action: ReviewAction,
) -> ExtractionRecord {
    let updated = apply_action(record, &action, Some("maria"), Utc::now()).unwrap();
    let audit = AuditEntry::for_transition(record, &updated, action.kind(), Some("maria"));
    store.update_record(&updated, record.status, &audit).unwrap();
    updated
}

#[test]
fn test_store_initialization() {
    let store = SqliteStore::new(":memory:");
    assert!(store.is_ok(), "Store should initialize successfully");
}

#[test]
fn test_insert_and_get_record() {
    let mut store = SqliteStore::new(":memory:").unwrap();
    let record = new_record("invoice_1.html", RecordType::Invoice, 0.91);

    insert(&mut store, &record);

    let retrieved = store.get_record(record.id).unwrap().expect("record should exist");
    assert_eq!(retrieved.id, record.id);
    assert_eq!(retrieved.source, record.source);
    assert_eq!(retrieved.extracted_data, record.extracted_data);
    assert_eq!(retrieved.status, RecordStatus::Pending);
    assert_eq!(retrieved.created_at.timestamp_micros(), record.created_at.timestamp_micros());
}

#[test]
fn test_get_missing_record() {
    let store = SqliteStore::new(":memory:").unwrap();
    assert!(store.get_record(RecordId::new()).unwrap().is_none());
}

#[test]
fn test_duplicate_insert_rejected() {
    let mut store = SqliteStore::new(":memory:").unwrap();
    let record = new_record("form_1.html", RecordType::Form, 0.5);
    insert(&mut store, &record);

    let result = store.insert_record(&record, &AuditEntry::for_creation(&record));
    assert!(matches!(result, Err(StoreError::Duplicate(id)) if id == record.id));
}

#[test]
fn test_conditional_update_applies() {
    let mut store = SqliteStore::new(":memory:").unwrap();
    let record = new_record("form_1.html", RecordType::Form, 0.5);
    insert(&mut store, &record);

    let approved = transition(&mut store, &record, ReviewAction::Approve { notes: Some("ok".into()) });

    let stored = store.get_record(record.id).unwrap().unwrap();
    assert_eq!(stored.status, RecordStatus::Approved);
    assert_eq!(stored.reviewed_by.as_deref(), Some("maria"));
    assert_eq!(stored.review_notes.as_deref(), Some("ok"));
    assert_eq!(
        stored.reviewed_at.map(|t| t.timestamp_micros()),
        approved.reviewed_at.map(|t| t.timestamp_micros())
    );
}

#[test]
fn test_stale_expected_status_conflicts() {
    let mut store = SqliteStore::new(":memory:").unwrap();
    let record = new_record("email_1.eml", RecordType::Email, 0.7);
    insert(&mut store, &record);

    // Another reviewer approves first
    transition(&mut store, &record, ReviewAction::Approve { notes: None });

    // Our reject was computed from the stale pending copy
    let rejected = apply_action(
        &record,
        &ReviewAction::Reject { reason: "spam".into() },
        Some("kostas"),
        Utc::now(),
    )
    .unwrap();
    let audit = AuditEntry::for_transition(&record, &rejected, ActionKind::Reject, Some("kostas"));
    let result = store.update_record(&rejected, RecordStatus::Pending, &audit);

    match result {
        Err(StoreError::Conflict { expected, actual, .. }) => {
            assert_eq!(expected, RecordStatus::Pending);
            assert_eq!(actual, RecordStatus::Approved);
        }
        other => panic!("expected conflict, got {:?}", other),
    }

    // Nothing overwritten, nothing audited for the losing write
    let stored = store.get_record(record.id).unwrap().unwrap();
    assert_eq!(stored.status, RecordStatus::Approved);
    assert_eq!(store.audit_trail(record.id).unwrap().len(), 2);
}

#[test]
fn test_update_missing_record() {
    let mut store = SqliteStore::new(":memory:").unwrap();
    let record = new_record("ghost.html", RecordType::Form, 0.4);

    let approved =
        apply_action(&record, &ReviewAction::Approve { notes: None }, None, Utc::now()).unwrap();
    let audit = AuditEntry::for_transition(&record, &approved, ActionKind::Approve, None);
    let result = store.update_record(&approved, RecordStatus::Pending, &audit);

    assert!(matches!(result, Err(StoreError::NotFound(id)) if id == record.id));
}

#[test]
fn test_audit_trail_keeps_full_history() {
    let mut store = SqliteStore::new(":memory:").unwrap();
    let record = new_record("invoice_2.html", RecordType::Invoice, 0.6);
    insert(&mut store, &record);

    let first = transition(
        &mut store,
        &record,
        ReviewAction::Edit { data: fields(json!({"total": "121.00"})), notes: None },
    );
    let second = transition(
        &mut store,
        &first,
        ReviewAction::Edit { data: fields(json!({"total": "122.00"})), notes: Some("typo".into()) },
    );
    transition(&mut store, &second, ReviewAction::Reject { reason: "duplicate".into() });

    let trail = store.audit_trail(record.id).unwrap();
    let actions: Vec<&str> = trail.iter().map(|e| e.action.as_str()).collect();
    assert_eq!(actions, vec!["create", "edit", "edit", "reject"]);

    assert_eq!(trail[0].from_status, None);
    assert_eq!(trail[1].from_status, Some(RecordStatus::Pending));
    assert_eq!(trail[2].from_status, Some(RecordStatus::Edited));
    assert_eq!(trail[3].to_status, RecordStatus::Rejected);
    assert_eq!(trail[3].notes.as_deref(), Some("duplicate"));

    // Edited data survives the rejection
    let stored = store.get_record(record.id).unwrap().unwrap();
    assert_eq!(stored.edited_data, Some(fields(json!({"total": "122.00"}))));
}

#[test]
fn test_list_records_newest_first_with_filters() {
    let mut store = SqliteStore::new(":memory:").unwrap();
    let base = Utc::now();

    let mut ids = Vec::new();
    for i in 0..5 {
        let mut record = new_record(
            &format!("doc_{}.html", i),
            if i % 2 == 0 { RecordType::Form } else { RecordType::Email },
            0.5,
        );
        record.created_at = base + Duration::seconds(i);
        record.updated_at = record.created_at;
        insert(&mut store, &record);
        ids.push(record.id);
    }

    let (records, total) = store.list_records(&RecordQuery::default()).unwrap();
    assert_eq!(total, 5);
    assert_eq!(records.first().map(|r| r.id), ids.last().copied());

    let (forms, total) = store
        .list_records(&RecordQuery {
            record_type: Some(RecordType::Form),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(total, 3);
    assert!(forms.iter().all(|r| r.source.record_type == RecordType::Form));

    let (page, total) = store
        .list_records(&RecordQuery {
            offset: 3,
            limit: Some(10),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(total, 5);
    assert_eq!(page.len(), 2);

    let (beyond, total) = store
        .list_records(&RecordQuery {
            offset: usize::MAX,
            ..Default::default()
        })
        .unwrap();
    assert_eq!(total, 5);
    assert!(beyond.is_empty());

    let (approved, total) = store
        .list_records(&RecordQuery {
            status: Some(RecordStatus::Approved),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(total, 0);
    assert!(approved.is_empty());
}

#[test]
fn test_stats() {
    let mut store = SqliteStore::new(":memory:").unwrap();

    let a = new_record("a.html", RecordType::Form, 0.8);
    let b = new_record("b.eml", RecordType::Email, 0.6);
    let c = new_record("c.html", RecordType::Invoice, 0.4);
    for r in [&a, &b, &c] {
        insert(&mut store, r);
    }
    transition(&mut store, &a, ReviewAction::Approve { notes: None });
    transition(&mut store, &b, ReviewAction::Edit { data: fields(json!({"x": 1})), notes: None });

    let stats = store.stats().unwrap();
    assert_eq!(stats.total, 3);
    assert_eq!(stats.pending_count(), 1);
    assert_eq!(stats.approved_count(), 2);
    assert_eq!(stats.rejected_count(), 0);
    assert_eq!(stats.by_type.get("INVOICE"), Some(&1));
    assert!((stats.average_confidence.unwrap() - 0.6).abs() < 1e-9);
}

#[test]
fn test_records_with_status_oldest_first() {
    let mut store = SqliteStore::new(":memory:").unwrap();
    let base = Utc::now();

    let mut first = new_record("first.html", RecordType::Form, 0.9);
    first.created_at = base;
    let mut second = new_record("second.html", RecordType::Form, 0.9);
    second.created_at = base + Duration::seconds(1);
    insert(&mut store, &first);
    insert(&mut store, &second);

    transition(&mut store, &first, ReviewAction::Approve { notes: None });
    transition(&mut store, &second, ReviewAction::Approve { notes: None });

    let records = store
        .records_with_status(&[RecordStatus::Approved, RecordStatus::Edited])
        .unwrap();
    let ids: Vec<RecordId> = records.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![first.id, second.id]);

    assert!(store.records_with_status(&[]).unwrap().is_empty());
}

#[test]
fn test_persistence_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reviewdesk.db");
    let record = new_record("persist.html", RecordType::Form, 0.5);

    {
        let mut store = SqliteStore::new(&path).unwrap();
        insert(&mut store, &record);
        transition(&mut store, &record, ReviewAction::Reject { reason: "blurry scan".into() });
    }

    let store = SqliteStore::new(&path).unwrap();
    let stored = store.get_record(record.id).unwrap().unwrap();
    assert_eq!(stored.status, RecordStatus::Rejected);
    assert_eq!(stored.review_notes.as_deref(), Some("blurry scan"));
    assert_eq!(store.audit_trail(record.id).unwrap().len(), 2);
}
