use crate::domain::hash::is_fingerprint;
use crate::domain::{AuditRecord, Document, VerificationStatus};
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Database error: {0}")]
    SqliteError(#[from] rusqlite::Error),

    #[error("Document not found")]
    NotFound,

    #[error("Duplicate document hash")]
    DuplicateHash,

    #[error("Ledger connection lock poisoned")]
    LockPoisoned,

    #[error("Failed to prepare ledger location: {0}")]
    Io(#[from] std::io::Error),
}

/// Durable storage for documents and the audit trail.
///
/// The document hash is unique at the storage level: `put_document` reports
/// `DuplicateHash` instead of storing a second record with the same content.
pub trait LedgerStore: Send + Sync {
    fn put_document(&self, doc: &Document) -> Result<Document, LedgerError>;
    fn find_document_by_hash(&self, hash: &str) -> Result<Option<Document>, LedgerError>;
    fn find_document_by_id(&self, id: &str) -> Result<Option<Document>, LedgerError>;
    fn update_verification(
        &self,
        document_id: &str,
        result: VerificationStatus,
        at: DateTime<Utc>,
    ) -> Result<Document, LedgerError>;
    fn append_audit(&self, record: &AuditRecord) -> Result<AuditRecord, LedgerError>;
    /// Newest first, at most `limit` records.
    fn list_audit(&self, limit: usize) -> Result<Vec<AuditRecord>, LedgerError>;
    fn count_documents(&self) -> Result<usize, LedgerError>;
}

const DOCUMENT_COLUMNS: &str = "id, content_hash, file_name, file_size, content_type, blob_locator,
     uploaded_at, last_verified, verification_count, last_verification_result";

const AUDIT_COLUMNS: &str = "id, actor, subject_name, action, result, document_id, content_hash, timestamp";

pub struct SqliteLedger {
    conn: Mutex<Connection>,
}

impl SqliteLedger {
    pub fn new(path: impl AsRef<Path>) -> Result<Self, LedgerError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn new_in_memory() -> Result<Self, LedgerError> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn init_schema(conn: &Connection) -> Result<(), LedgerError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS documents (
                id TEXT PRIMARY KEY,
                content_hash TEXT UNIQUE NOT NULL,
                file_name TEXT NOT NULL,
                file_size INTEGER NOT NULL,
                content_type TEXT NOT NULL,
                blob_locator TEXT NOT NULL,
                uploaded_at INTEGER NOT NULL,
                last_verified INTEGER,
                verification_count INTEGER NOT NULL DEFAULT 0,
                last_verification_result TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_content_hash ON documents(content_hash);
            CREATE INDEX IF NOT EXISTS idx_uploaded_at ON documents(uploaded_at);

            CREATE TABLE IF NOT EXISTS audit_logs (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT UNIQUE NOT NULL,
                actor TEXT NOT NULL,
                subject_name TEXT NOT NULL,
                action TEXT NOT NULL,
                result TEXT NOT NULL,
                document_id TEXT,
                content_hash TEXT,
                timestamp INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_audit_timestamp ON audit_logs(timestamp);",
        )?;

        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, LedgerError> {
        self.conn.lock().map_err(|_| LedgerError::LockPoisoned)
    }

    fn row_to_document(row: &rusqlite::Row) -> Result<Document, rusqlite::Error> {
        let last_verification_result: Option<String> = row.get(9)?;
        let last_verification_result = last_verification_result
            .map(|s| s.parse::<VerificationStatus>().map_err(|e| conversion_error(9, e)))
            .transpose()?;
        let last_verified: Option<i64> = row.get(7)?;
        let hash: String = row.get(1)?;
        if !is_fingerprint(&hash) {
            return Err(conversion_error(1, format!("not a SHA-256 fingerprint: {}", hash)));
        }

        Ok(Document {
            document_id: row.get(0)?,
            hash,
            file_name: row.get(2)?,
            file_size: row.get::<_, i64>(3)? as u64,
            content_type: row.get(4)?,
            blob_locator: row.get(5)?,
            upload_timestamp: from_micros(6, row.get(6)?)?,
            last_verified: last_verified.map(|m| from_micros(7, m)).transpose()?,
            verification_count: row.get::<_, i64>(8)? as u64,
            last_verification_result,
        })
    }

    fn row_to_audit(row: &rusqlite::Row) -> Result<AuditRecord, rusqlite::Error> {
        let action: String = row.get(3)?;
        let result: String = row.get(4)?;

        Ok(AuditRecord {
            id: row.get(0)?,
            actor: row.get(1)?,
            subject_name: row.get(2)?,
            action: action.parse().map_err(|e| conversion_error(3, e))?,
            result: result.parse().map_err(|e| conversion_error(4, e))?,
            document_id: row.get(5)?,
            hash: row.get(6)?,
            timestamp: from_micros(7, row.get(7)?)?,
        })
    }

    fn select_document(
        conn: &Connection,
        column: &str,
        value: &str,
    ) -> Result<Option<Document>, LedgerError> {
        let sql = format!(
            "SELECT {} FROM documents WHERE {} = ?1",
            DOCUMENT_COLUMNS, column
        );
        let doc = conn
            .query_row(&sql, params![value], Self::row_to_document)
            .optional()?;
        Ok(doc)
    }
}

impl LedgerStore for SqliteLedger {
    fn put_document(&self, doc: &Document) -> Result<Document, LedgerError> {
        let conn = self.lock()?;
        let inserted = conn.execute(
            "INSERT INTO documents (id, content_hash, file_name, file_size, content_type,
                                    blob_locator, uploaded_at, last_verified,
                                    verification_count, last_verification_result)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                &doc.document_id,
                &doc.hash,
                &doc.file_name,
                doc.file_size as i64,
                &doc.content_type,
                &doc.blob_locator,
                doc.upload_timestamp.timestamp_micros(),
                doc.last_verified.map(|t| t.timestamp_micros()),
                doc.verification_count as i64,
                doc.last_verification_result.map(|s| s.as_str()),
            ],
        );

        match inserted {
            // Read back so callers see timestamps at stored precision.
            Ok(_) => Self::select_document(&conn, "id", &doc.document_id)?
                .ok_or(LedgerError::NotFound),
            Err(rusqlite::Error::SqliteFailure(err, msg))
                if is_hash_conflict(&err, msg.as_deref()) =>
            {
                Err(LedgerError::DuplicateHash)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn find_document_by_hash(&self, hash: &str) -> Result<Option<Document>, LedgerError> {
        let conn = self.lock()?;
        Self::select_document(&conn, "content_hash", hash)
    }

    fn find_document_by_id(&self, id: &str) -> Result<Option<Document>, LedgerError> {
        let conn = self.lock()?;
        Self::select_document(&conn, "id", id)
    }

    fn update_verification(
        &self,
        document_id: &str,
        result: VerificationStatus,
        at: DateTime<Utc>,
    ) -> Result<Document, LedgerError> {
        let conn = self.lock()?;
        let changed = conn.execute(
            "UPDATE documents
             SET last_verified = ?1,
                 verification_count = verification_count + 1,
                 last_verification_result = ?2
             WHERE id = ?3",
            params![at.timestamp_micros(), result.as_str(), document_id],
        )?;

        if changed == 0 {
            return Err(LedgerError::NotFound);
        }

        Self::select_document(&conn, "id", document_id)?.ok_or(LedgerError::NotFound)
    }

    fn append_audit(&self, record: &AuditRecord) -> Result<AuditRecord, LedgerError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO audit_logs (id, actor, subject_name, action, result,
                                     document_id, content_hash, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                &record.id,
                &record.actor,
                &record.subject_name,
                record.action.as_str(),
                record.result.as_str(),
                &record.document_id,
                &record.hash,
                record.timestamp.timestamp_micros(),
            ],
        )?;

        Ok(record.clone())
    }

    fn list_audit(&self, limit: usize) -> Result<Vec<AuditRecord>, LedgerError> {
        let conn = self.lock()?;
        let sql = format!(
            "SELECT {} FROM audit_logs ORDER BY timestamp DESC, seq DESC LIMIT ?1",
            AUDIT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let records = stmt
            .query_map(params![limit as i64], Self::row_to_audit)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }

    fn count_documents(&self) -> Result<usize, LedgerError> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))?;

        Ok(count as usize)
    }
}

/// Only the `content_hash` unique index means "same content"; any other
/// constraint (such as a primary key collision) is a plain database error.
fn is_hash_conflict(err: &rusqlite::ffi::Error, msg: Option<&str>) -> bool {
    err.code == rusqlite::ErrorCode::ConstraintViolation
        && msg.map_or(false, |m| m.contains("documents.content_hash"))
}

fn from_micros(idx: usize, micros: i64) -> Result<DateTime<Utc>, rusqlite::Error> {
    DateTime::<Utc>::from_timestamp_micros(micros)
        .ok_or_else(|| conversion_error(idx, format!("timestamp out of range: {}", micros)))
}

fn conversion_error(idx: usize, msg: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, msg.into())
}
