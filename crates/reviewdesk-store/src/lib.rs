//! reviewdesk Storage Layer
//!
//! Implements the RecordStore trait using SQLite.
//!
//! # Architecture
//!
//! - `extraction_records` holds every record with its latest review metadata
//! - `audit_log` is append-only and written in the same transaction as the
//!   record update it describes
//! - Transitions are conditional writes (`WHERE id = ? AND status = ?`), so a
//!   concurrent change to the same record surfaces as [`StoreError::Conflict`]
//!
//! # Examples
//!
//! ```no_run
//! use reviewdesk_store::SqliteStore;
//!
//! let store = SqliteStore::new(":memory:").unwrap();
//! // Store is now ready for record operations
//! ```

#![warn(missing_docs)]

use chrono::{DateTime, Utc};
use reviewdesk_domain::record::FieldMap;
use reviewdesk_domain::traits::{RecordQuery, RecordStats, RecordStore};
use reviewdesk_domain::{
    AuditEntry, ExtractionRecord, RecordId, RecordStatus, RecordType, SourceDocument,
};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row, ToSql};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Record not found
    #[error("Record not found: {0}")]
    NotFound(RecordId),

    /// Invalid data format
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Record with the same id already exists
    #[error("Duplicate record: {0}")]
    Duplicate(RecordId),

    /// Stored status no longer matches the expected pre-state
    #[error("Record {id} changed concurrently: expected {expected}, found {actual}")]
    Conflict {
        /// Record that was being updated
        id: RecordId,
        /// Status the caller read before transitioning
        expected: RecordStatus,
        /// Status currently stored
        actual: RecordStatus,
    },
}

const RECORD_COLUMNS: &str = "id, source_file, record_type, extracted_data, confidence_score, status, \
     edited_data, reviewed_by, reviewed_at, review_notes, exported_at, created_at, updated_at";

/// SQLite-based implementation of RecordStore
///
/// # Thread Safety
///
/// SQLite connections are not thread-safe. Share a store between tasks by
/// wrapping it in a mutex, as the workflow service does.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Create a new SqliteStore with the given database path
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use reviewdesk_store::SqliteStore;
    ///
    /// let store = SqliteStore::new("reviewdesk.db").unwrap();
    /// ```
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let mut store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    fn initialize_schema(&mut self) -> Result<(), StoreError> {
        let schema = include_str!("schema.sql");
        self.conn.execute_batch(schema)?;
        Ok(())
    }

    fn id_to_bytes(id: RecordId) -> Vec<u8> {
        id.value().to_be_bytes().to_vec()
    }

    fn bytes_to_id(bytes: &[u8]) -> Result<RecordId, StoreError> {
        if bytes.len() != 16 {
            return Err(StoreError::InvalidData(format!(
                "Expected 16 bytes for RecordId, got {}",
                bytes.len()
            )));
        }
        let mut arr = [0u8; 16];
        arr.copy_from_slice(bytes);
        Ok(RecordId::from_value(u128::from_be_bytes(arr)))
    }

    fn to_micros(at: DateTime<Utc>) -> i64 {
        at.timestamp_micros()
    }

    fn from_micros(micros: i64) -> Result<DateTime<Utc>, StoreError> {
        DateTime::from_timestamp_micros(micros)
            .ok_or_else(|| StoreError::InvalidData(format!("Timestamp out of range: {}", micros)))
    }

    fn encode_fields(fields: &FieldMap) -> Result<String, StoreError> {
        serde_json::to_string(fields).map_err(|e| StoreError::InvalidData(e.to_string()))
    }

    fn decode_fields(raw: &str) -> Result<FieldMap, StoreError> {
        serde_json::from_str(raw).map_err(|e| StoreError::InvalidData(e.to_string()))
    }

    fn parse_status(raw: &str) -> Result<RecordStatus, StoreError> {
        RecordStatus::parse(raw)
            .ok_or_else(|| StoreError::InvalidData(format!("Unknown status: {}", raw)))
    }

    /// Wrap a StoreError so it can escape a rusqlite row closure
    fn conversion(idx: usize, ty: Type, e: StoreError) -> rusqlite::Error {
        rusqlite::Error::FromSqlConversionFailure(idx, ty, Box::new(e))
    }

    fn row_to_record(row: &Row<'_>) -> rusqlite::Result<ExtractionRecord> {
        let id_bytes: Vec<u8> = row.get(0)?;
        let id = Self::bytes_to_id(&id_bytes).map_err(|e| Self::conversion(0, Type::Blob, e))?;

        let record_type: String = row.get(2)?;
        let record_type = RecordType::parse(&record_type).ok_or_else(|| {
            Self::conversion(
                2,
                Type::Text,
                StoreError::InvalidData(format!("Unknown record type: {}", record_type)),
            )
        })?;

        let extracted: String = row.get(3)?;
        let extracted_data =
            Self::decode_fields(&extracted).map_err(|e| Self::conversion(3, Type::Text, e))?;

        let status: String = row.get(5)?;
        let status = Self::parse_status(&status).map_err(|e| Self::conversion(5, Type::Text, e))?;

        let edited: Option<String> = row.get(6)?;
        let edited_data = edited
            .as_deref()
            .map(Self::decode_fields)
            .transpose()
            .map_err(|e| Self::conversion(6, Type::Text, e))?;

        let timestamp = |idx: usize| -> rusqlite::Result<Option<DateTime<Utc>>> {
            let micros: Option<i64> = row.get(idx)?;
            micros
                .map(Self::from_micros)
                .transpose()
                .map_err(|e| Self::conversion(idx, Type::Integer, e))
        };

        let created_at = timestamp(11)?.ok_or(rusqlite::Error::InvalidColumnType(
            11,
            "created_at".to_string(),
            Type::Null,
        ))?;
        let updated_at = timestamp(12)?.ok_or(rusqlite::Error::InvalidColumnType(
            12,
            "updated_at".to_string(),
            Type::Null,
        ))?;

        Ok(ExtractionRecord {
            id,
            source: SourceDocument {
                source_file: row.get(1)?,
                record_type,
            },
            extracted_data,
            confidence_score: row.get(4)?,
            status,
            edited_data,
            reviewed_by: row.get(7)?,
            reviewed_at: timestamp(8)?,
            review_notes: row.get(9)?,
            exported_at: timestamp(10)?,
            created_at,
            updated_at,
        })
    }

    fn row_to_audit(row: &Row<'_>) -> rusqlite::Result<AuditEntry> {
        let id_bytes: Vec<u8> = row.get(0)?;
        let record_id =
            Self::bytes_to_id(&id_bytes).map_err(|e| Self::conversion(0, Type::Blob, e))?;

        let from_status: Option<String> = row.get(3)?;
        let from_status = from_status
            .as_deref()
            .map(Self::parse_status)
            .transpose()
            .map_err(|e| Self::conversion(3, Type::Text, e))?;

        let to_status: String = row.get(4)?;
        let to_status =
            Self::parse_status(&to_status).map_err(|e| Self::conversion(4, Type::Text, e))?;

        let details: Option<String> = row.get(6)?;
        let details = match details {
            Some(raw) => serde_json::from_str(&raw).map_err(|e| {
                Self::conversion(6, Type::Text, StoreError::InvalidData(e.to_string()))
            })?,
            None => serde_json::Value::Null,
        };

        let at: i64 = row.get(7)?;
        let at = Self::from_micros(at).map_err(|e| Self::conversion(7, Type::Integer, e))?;

        Ok(AuditEntry {
            record_id,
            action: row.get(1)?,
            actor: row.get(2)?,
            from_status,
            to_status,
            notes: row.get(5)?,
            details,
            at,
        })
    }

    fn append_audit(conn: &Connection, entry: &AuditEntry) -> Result<(), StoreError> {
        let details = if entry.details.is_null() {
            None
        } else {
            Some(entry.details.to_string())
        };

        conn.execute(
            "INSERT INTO audit_log (record_id, action, actor, from_status, to_status, notes, details, at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                Self::id_to_bytes(entry.record_id),
                &entry.action,
                &entry.actor,
                entry.from_status.map(|s| s.as_str()),
                entry.to_status.as_str(),
                &entry.notes,
                details,
                Self::to_micros(entry.at),
            ],
        )?;
        Ok(())
    }
}

impl RecordStore for SqliteStore {
    type Error = StoreError;

    fn insert_record(
        &mut self,
        record: &ExtractionRecord,
        audit: &AuditEntry,
    ) -> Result<(), Self::Error> {
        let id_bytes = Self::id_to_bytes(record.id);
        let tx = self.conn.transaction()?;

        let exists: bool = tx
            .query_row(
                "SELECT 1 FROM extraction_records WHERE id = ?1",
                params![&id_bytes],
                |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false);

        if exists {
            return Err(StoreError::Duplicate(record.id));
        }

        let edited = record
            .edited_data
            .as_ref()
            .map(Self::encode_fields)
            .transpose()?;

        tx.execute(
            &format!(
                "INSERT INTO extraction_records ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                RECORD_COLUMNS
            ),
            params![
                &id_bytes,
                &record.source.source_file,
                record.source.record_type.as_str(),
                Self::encode_fields(&record.extracted_data)?,
                record.confidence_score,
                record.status.as_str(),
                edited,
                &record.reviewed_by,
                record.reviewed_at.map(Self::to_micros),
                &record.review_notes,
                record.exported_at.map(Self::to_micros),
                Self::to_micros(record.created_at),
                Self::to_micros(record.updated_at),
            ],
        )?;

        Self::append_audit(&tx, audit)?;
        tx.commit()?;
        Ok(())
    }

    fn get_record(&self, id: RecordId) -> Result<Option<ExtractionRecord>, Self::Error> {
        let record = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM extraction_records WHERE id = ?1",
                    RECORD_COLUMNS
                ),
                params![Self::id_to_bytes(id)],
                Self::row_to_record,
            )
            .optional()?;

        Ok(record)
    }

    fn list_records(
        &self,
        query: &RecordQuery,
    ) -> Result<(Vec<ExtractionRecord>, usize), Self::Error> {
        let mut filter = String::from(" WHERE 1=1");
        let mut params: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(status) = query.status {
            filter.push_str(" AND status = ?");
            params.push(Box::new(status.as_str()));
        }

        if let Some(record_type) = query.record_type {
            filter.push_str(" AND record_type = ?");
            params.push(Box::new(record_type.as_str()));
        }

        let param_refs: Vec<&dyn ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let total: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM extraction_records{}", filter),
            &param_refs[..],
            |row| row.get(0),
        )?;

        let sql = format!(
            "SELECT {} FROM extraction_records{} ORDER BY created_at DESC, id DESC LIMIT {} OFFSET {}",
            RECORD_COLUMNS,
            filter,
            query.effective_limit(),
            query.effective_offset()
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let records = stmt
            .query_map(&param_refs[..], Self::row_to_record)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok((records, total as usize))
    }

    fn update_record(
        &mut self,
        record: &ExtractionRecord,
        expected_status: RecordStatus,
        audit: &AuditEntry,
    ) -> Result<(), Self::Error> {
        let id_bytes = Self::id_to_bytes(record.id);
        let edited = record
            .edited_data
            .as_ref()
            .map(Self::encode_fields)
            .transpose()?;

        let tx = self.conn.transaction()?;

        let changed = tx.execute(
            "UPDATE extraction_records
             SET status = ?2, edited_data = ?3, reviewed_by = ?4, reviewed_at = ?5,
                 review_notes = ?6, exported_at = ?7, updated_at = ?8
             WHERE id = ?1 AND status = ?9",
            params![
                &id_bytes,
                record.status.as_str(),
                edited,
                &record.reviewed_by,
                record.reviewed_at.map(Self::to_micros),
                &record.review_notes,
                record.exported_at.map(Self::to_micros),
                Self::to_micros(record.updated_at),
                expected_status.as_str(),
            ],
        )?;

        if changed == 0 {
            let actual: Option<String> = tx
                .query_row(
                    "SELECT status FROM extraction_records WHERE id = ?1",
                    params![&id_bytes],
                    |row| row.get(0),
                )
                .optional()?;

            return match actual {
                None => Err(StoreError::NotFound(record.id)),
                Some(actual) => Err(StoreError::Conflict {
                    id: record.id,
                    expected: expected_status,
                    actual: Self::parse_status(&actual)?,
                }),
            };
        }

        Self::append_audit(&tx, audit)?;
        tx.commit()?;
        Ok(())
    }

    fn stats(&self) -> Result<RecordStats, Self::Error> {
        let mut stats = RecordStats::default();

        let (total, average): (i64, Option<f64>) = self.conn.query_row(
            "SELECT COUNT(*), AVG(confidence_score) FROM extraction_records",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        stats.total = total as usize;
        stats.average_confidence = average;

        for status in RecordStatus::ALL {
            stats.by_status.insert(status.as_str().to_string(), 0);
        }

        let mut stmt = self
            .conn
            .prepare("SELECT status, COUNT(*) FROM extraction_records GROUP BY status")?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?;
        for row in rows {
            let (status, count) = row?;
            stats.by_status.insert(status, count as usize);
        }

        let mut stmt = self
            .conn
            .prepare("SELECT record_type, COUNT(*) FROM extraction_records GROUP BY record_type")?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?;
        for row in rows {
            let (record_type, count) = row?;
            stats.by_type.insert(record_type, count as usize);
        }

        Ok(stats)
    }

    fn audit_trail(&self, id: RecordId) -> Result<Vec<AuditEntry>, Self::Error> {
        let mut stmt = self.conn.prepare(
            "SELECT record_id, action, actor, from_status, to_status, notes, details, at
             FROM audit_log WHERE record_id = ?1 ORDER BY id ASC",
        )?;

        let entries = stmt
            .query_map(params![Self::id_to_bytes(id)], Self::row_to_audit)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    fn records_with_status(
        &self,
        statuses: &[RecordStatus],
    ) -> Result<Vec<ExtractionRecord>, Self::Error> {
        if statuses.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; statuses.len()].join(", ");
        let sql = format!(
            "SELECT {} FROM extraction_records WHERE status IN ({}) ORDER BY created_at ASC, id ASC",
            RECORD_COLUMNS, placeholders
        );
        let names: Vec<&str> = statuses.iter().map(|s| s.as_str()).collect();

        let mut stmt = self.conn.prepare(&sql)?;
        let records = stmt
            .query_map(rusqlite::params_from_iter(names), Self::row_to_record)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }
}
