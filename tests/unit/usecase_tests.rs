use chrono::{DateTime, Utc};
use docverify::application::{IntegrityError, IntegrityService, UploadPolicy, MAX_FILE_SIZE};
use docverify::domain::hash::fingerprint;
use docverify::domain::{
    AuditAction, AuditRecord, AuditResult, Document, IncomingFile, VerificationStatus,
};
use docverify::infrastructure::{
    BlobKey, ContentStore, ContentStoreError, LedgerError, LedgerStore, MemoryContentStore,
    SqliteLedger,
};
use std::sync::Arc;

struct Fixture {
    service: IntegrityService,
    ledger: Arc<SqliteLedger>,
    content: Arc<MemoryContentStore>,
}

fn fixture() -> Fixture {
    let ledger = Arc::new(SqliteLedger::new_in_memory().unwrap());
    let content = Arc::new(MemoryContentStore::new());
    let service = IntegrityService::new(ledger.clone(), content.clone(), UploadPolicy::default());
    Fixture {
        service,
        ledger,
        content,
    }
}

fn pdf(content: &[u8], name: &str) -> IncomingFile {
    IncomingFile::new(content.to_vec(), name, "application/pdf")
}

#[cfg(test)]
mod upload_tests {
    use super::*;

    #[test]
    fn test_upload_new_document_succeeds() {
        let f = fixture();

        let receipt = f.service.upload(&pdf(b"test content", "document.pdf"), "user1").unwrap();

        assert!(!receipt.document_id.is_empty());
        assert_eq!(receipt.hash, fingerprint(b"test content"));
        assert_eq!(receipt.file_name, "document.pdf");
        assert_eq!(receipt.file_size, 12);

        let stored = f.ledger.find_document_by_id(&receipt.document_id).unwrap().unwrap();
        assert_eq!(stored.hash, receipt.hash);
        assert_eq!(stored.blob_locator, format!("memory://{}/document.pdf", receipt.document_id));
        assert_eq!(f.content.len(), 1);

        let audit = f.service.audit_logs(10).unwrap();
        assert_eq!(audit.len(), 1);
        assert_eq!(audit[0].action, AuditAction::Upload);
        assert_eq!(audit[0].result, AuditResult::Success);
        assert_eq!(audit[0].actor, "user1");
        assert_eq!(audit[0].document_id.as_deref(), Some(receipt.document_id.as_str()));
    }

    #[test]
    fn test_upload_duplicate_returns_existing_id() {
        let f = fixture();

        let first = f.service.upload(&pdf(b"same content", "file1.pdf"), "user1").unwrap();
        let second = f.service.upload(&pdf(b"same content", "file2.pdf"), "user2");

        match second {
            Err(IntegrityError::Duplicate {
                existing_document_id,
                hash,
            }) => {
                assert_eq!(existing_document_id, first.document_id);
                assert_eq!(hash, first.hash);
            }
            other => panic!("Expected Duplicate, got {:?}", other),
        }

        // Bytes and metadata are stored once; the attempt is still audited.
        assert_eq!(f.ledger.count_documents().unwrap(), 1);
        assert_eq!(f.content.len(), 1);

        let audit = f.service.audit_logs(10).unwrap();
        assert_eq!(audit.len(), 2);
        assert_eq!(audit[0].result, AuditResult::Duplicate);
        assert_eq!(audit[0].subject_name, "file2.pdf");
    }

    #[test]
    fn test_upload_oversized_rejected_before_any_write() {
        let f = fixture();
        let big = vec![0u8; (MAX_FILE_SIZE + 1024 * 1024) as usize];

        let result = f.service.upload(&pdf(&big, "big.pdf"), "user1");

        assert!(matches!(result, Err(IntegrityError::FileTooLarge { .. })));
        assert!(f.content.is_empty());
        assert_eq!(f.ledger.count_documents().unwrap(), 0);
        assert!(f.service.audit_logs(10).unwrap().is_empty());
    }

    #[test]
    fn test_upload_exactly_at_limit_accepted() {
        let f = fixture();
        let max = vec![1u8; MAX_FILE_SIZE as usize];

        assert!(f.service.upload(&pdf(&max, "max.pdf"), "user1").is_ok());
    }

    #[test]
    fn test_upload_text_plain_rejected_naming_allowed_types() {
        let f = fixture();
        let file = IncomingFile::new(b"hello".to_vec(), "notes.txt", "text/plain");

        let err = f.service.upload(&file, "user1").unwrap_err();
        let msg = err.to_string();

        assert!(matches!(err, IntegrityError::UnsupportedType { .. }));
        assert!(msg.contains("application/pdf"));
        assert!(msg.contains("image/png"));
        assert!(f.service.audit_logs(10).unwrap().is_empty());
    }

    #[test]
    fn test_upload_each_allowed_type() {
        let f = fixture();
        for (i, ct) in docverify::application::ALLOWED_CONTENT_TYPES.iter().enumerate() {
            let file = IncomingFile::new(format!("content {}", i).into_bytes(), "f", ct);
            assert!(f.service.upload(&file, "user1").is_ok(), "{} rejected", ct);
        }
    }
}

#[cfg(test)]
mod verify_tests {
    use super::*;

    #[test]
    fn test_verify_uploaded_document() {
        let f = fixture();
        let receipt = f.service.upload(&pdf(b"content to verify", "test.pdf"), "user1").unwrap();

        let report = f
            .service
            .verify(&pdf(b"content to verify", "copy.pdf"), None, "user2")
            .unwrap();

        assert!(report.verified);
        assert_eq!(report.status, VerificationStatus::Verified);
        assert_eq!(report.hash, report.original_hash);
        assert_eq!(report.document_id, receipt.document_id);
        assert_eq!(report.original_timestamp, receipt.timestamp);
        assert_eq!(report.file_name, "test.pdf");

        let stored = f.ledger.find_document_by_id(&receipt.document_id).unwrap().unwrap();
        assert_eq!(stored.verification_count, 1);
        assert_eq!(stored.last_verification_result, Some(VerificationStatus::Verified));
        assert!(stored.last_verified.is_some());

        let audit = f.service.audit_logs(1).unwrap();
        assert_eq!(audit[0].action, AuditAction::Verify);
        assert_eq!(audit[0].result, AuditResult::Verified);
        assert_eq!(audit[0].subject_name, "copy.pdf");
    }

    #[test]
    fn test_verify_nonexistent_document_not_found() {
        let f = fixture();

        let err = f
            .service
            .verify(&pdf(b"never uploaded", "x.pdf"), None, "user1")
            .unwrap_err();

        match err {
            IntegrityError::NotFound { current_hash } => {
                assert_eq!(current_hash, fingerprint(b"never uploaded"));
            }
            other => panic!("Expected NotFound, got {:?}", other),
        }

        let audit = f.service.audit_logs(10).unwrap();
        assert_eq!(audit.len(), 1);
        assert_eq!(audit[0].result, AuditResult::NotFound);
    }

    #[test]
    fn test_verify_modified_content_without_claim_is_not_found() {
        let f = fixture();
        f.service.upload(&pdf(b"original", "o.pdf"), "user1").unwrap();

        let result = f.service.verify(&pdf(b"original!", "o.pdf"), None, "user1");
        assert!(matches!(result, Err(IntegrityError::NotFound { .. })));
    }

    #[test]
    fn test_verify_claimed_id_detects_tampering() {
        let f = fixture();
        let receipt = f.service.upload(&pdf(b"original", "o.pdf"), "user1").unwrap();

        let report = f
            .service
            .verify(&pdf(b"original!", "o.pdf"), Some(&receipt.document_id), "user1")
            .unwrap();

        assert!(!report.verified);
        assert_eq!(report.status, VerificationStatus::Tampered);
        assert_eq!(report.original_hash, receipt.hash);
        assert_ne!(report.hash, report.original_hash);

        let stored = f.ledger.find_document_by_id(&receipt.document_id).unwrap().unwrap();
        assert_eq!(stored.last_verification_result, Some(VerificationStatus::Tampered));
        assert_eq!(f.service.audit_logs(1).unwrap()[0].result, AuditResult::Tampered);
    }

    #[test]
    fn test_verify_claimed_id_with_matching_content() {
        let f = fixture();
        let receipt = f.service.upload(&pdf(b"original", "o.pdf"), "user1").unwrap();

        let report = f
            .service
            .verify(&pdf(b"original", "o.pdf"), Some(&receipt.document_id), "user1")
            .unwrap();

        assert!(report.verified);
        assert_eq!(report.status, VerificationStatus::Verified);
    }

    #[test]
    fn test_verify_oversized_rejected() {
        let f = fixture();
        let big = vec![0u8; (MAX_FILE_SIZE + 1) as usize];

        let result = f.service.verify(&pdf(&big, "big.pdf"), None, "user1");
        assert!(matches!(result, Err(IntegrityError::FileTooLarge { .. })));
        assert!(f.service.audit_logs(10).unwrap().is_empty());
    }

    #[test]
    fn test_verify_ignores_content_type() {
        let f = fixture();
        let file = IncomingFile::new(b"plain".to_vec(), "a.txt", "text/plain");

        let result = f.service.verify(&file, None, "user1");
        assert!(matches!(result, Err(IntegrityError::NotFound { .. })));
    }
}

/// Ledger whose audit writes always fail; everything else delegates.
struct FailingAuditLedger {
    inner: SqliteLedger,
}

impl LedgerStore for FailingAuditLedger {
    fn put_document(&self, doc: &Document) -> Result<Document, LedgerError> {
        self.inner.put_document(doc)
    }
    fn find_document_by_hash(&self, hash: &str) -> Result<Option<Document>, LedgerError> {
        self.inner.find_document_by_hash(hash)
    }
    fn find_document_by_id(&self, id: &str) -> Result<Option<Document>, LedgerError> {
        self.inner.find_document_by_id(id)
    }
    fn update_verification(
        &self,
        document_id: &str,
        result: VerificationStatus,
        at: DateTime<Utc>,
    ) -> Result<Document, LedgerError> {
        self.inner.update_verification(document_id, result, at)
    }
    fn append_audit(&self, _record: &AuditRecord) -> Result<AuditRecord, LedgerError> {
        Err(LedgerError::LockPoisoned)
    }
    fn list_audit(&self, limit: usize) -> Result<Vec<AuditRecord>, LedgerError> {
        self.inner.list_audit(limit)
    }
    fn count_documents(&self) -> Result<usize, LedgerError> {
        self.inner.count_documents()
    }
}

/// Ledger that hides existing documents from hash lookups, the way a
/// concurrent upload does between its duplicate check and its insert.
struct RacingLedger {
    inner: SqliteLedger,
    hide_lookups: std::sync::atomic::AtomicBool,
}

impl LedgerStore for RacingLedger {
    fn put_document(&self, doc: &Document) -> Result<Document, LedgerError> {
        let result = self.inner.put_document(doc);
        self.hide_lookups
            .store(false, std::sync::atomic::Ordering::SeqCst);
        result
    }
    fn find_document_by_hash(&self, hash: &str) -> Result<Option<Document>, LedgerError> {
        if self.hide_lookups.load(std::sync::atomic::Ordering::SeqCst) {
            return Ok(None);
        }
        self.inner.find_document_by_hash(hash)
    }
    fn find_document_by_id(&self, id: &str) -> Result<Option<Document>, LedgerError> {
        self.inner.find_document_by_id(id)
    }
    fn update_verification(
        &self,
        document_id: &str,
        result: VerificationStatus,
        at: DateTime<Utc>,
    ) -> Result<Document, LedgerError> {
        self.inner.update_verification(document_id, result, at)
    }
    fn append_audit(&self, record: &AuditRecord) -> Result<AuditRecord, LedgerError> {
        self.inner.append_audit(record)
    }
    fn list_audit(&self, limit: usize) -> Result<Vec<AuditRecord>, LedgerError> {
        self.inner.list_audit(limit)
    }
    fn count_documents(&self) -> Result<usize, LedgerError> {
        self.inner.count_documents()
    }
}

/// Content store that refuses every write.
struct BrokenContentStore;

impl ContentStore for BrokenContentStore {
    fn put(
        &self,
        _key: &BlobKey,
        _content: &[u8],
        _content_type: &str,
    ) -> Result<String, ContentStoreError> {
        Err(ContentStoreError::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            "disk full",
        )))
    }
    fn get(&self, key: &BlobKey) -> Result<Vec<u8>, ContentStoreError> {
        Err(ContentStoreError::NotFound(key.to_string()))
    }
    fn content_type(&self, _key: &BlobKey) -> Result<Option<String>, ContentStoreError> {
        Ok(None)
    }
    fn exists(&self, _key: &BlobKey) -> Result<bool, ContentStoreError> {
        Ok(false)
    }
    fn remove(&self, _key: &BlobKey) -> Result<(), ContentStoreError> {
        Ok(())
    }
}

/// Ledger whose document inserts always fail; everything else delegates.
struct FailingInsertLedger {
    inner: SqliteLedger,
}

impl LedgerStore for FailingInsertLedger {
    fn put_document(&self, _doc: &Document) -> Result<Document, LedgerError> {
        Err(LedgerError::LockPoisoned)
    }
    fn find_document_by_hash(&self, hash: &str) -> Result<Option<Document>, LedgerError> {
        self.inner.find_document_by_hash(hash)
    }
    fn find_document_by_id(&self, id: &str) -> Result<Option<Document>, LedgerError> {
        self.inner.find_document_by_id(id)
    }
    fn update_verification(
        &self,
        document_id: &str,
        result: VerificationStatus,
        at: DateTime<Utc>,
    ) -> Result<Document, LedgerError> {
        self.inner.update_verification(document_id, result, at)
    }
    fn append_audit(&self, record: &AuditRecord) -> Result<AuditRecord, LedgerError> {
        self.inner.append_audit(record)
    }
    fn list_audit(&self, limit: usize) -> Result<Vec<AuditRecord>, LedgerError> {
        self.inner.list_audit(limit)
    }
    fn count_documents(&self) -> Result<usize, LedgerError> {
        self.inner.count_documents()
    }
}

#[cfg(test)]
mod failure_tests {
    use super::*;
    use hyper::StatusCode;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn test_content_store_failure_aborts_upload() {
        let ledger = Arc::new(SqliteLedger::new_in_memory().unwrap());
        let service = IntegrityService::new(
            ledger.clone(),
            Arc::new(BrokenContentStore),
            UploadPolicy::default(),
        );

        let err = service.upload(&pdf(b"unstorable", "a.pdf"), "user1").unwrap_err();

        assert!(matches!(err, IntegrityError::StorageUnavailable(_)));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(ledger.count_documents().unwrap(), 0);
        assert!(ledger.list_audit(10).unwrap().is_empty());
    }

    #[test]
    fn test_ledger_failure_after_blob_write_aborts_upload() {
        let ledger = Arc::new(FailingInsertLedger {
            inner: SqliteLedger::new_in_memory().unwrap(),
        });
        let content = Arc::new(MemoryContentStore::new());
        let service = IntegrityService::new(ledger.clone(), content.clone(), UploadPolicy::default());

        let err = service.upload(&pdf(b"orphaned", "a.pdf"), "user1").unwrap_err();

        assert!(matches!(err, IntegrityError::StorageUnavailable(_)));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(ledger.count_documents().unwrap(), 0);
        assert!(ledger
            .list_audit(10)
            .unwrap()
            .iter()
            .all(|r| r.result != AuditResult::Success));
        // The blob written before the failed insert is left in place.
        assert_eq!(content.len(), 1);
    }

    #[test]
    fn test_audit_failure_does_not_fail_upload_or_verify() {
        let ledger = Arc::new(FailingAuditLedger {
            inner: SqliteLedger::new_in_memory().unwrap(),
        });
        let content = Arc::new(MemoryContentStore::new());
        let service = IntegrityService::new(ledger.clone(), content, UploadPolicy::default());

        let receipt = service.upload(&pdf(b"audited", "a.pdf"), "user1").unwrap();
        let report = service.verify(&pdf(b"audited", "a.pdf"), None, "user1").unwrap();

        assert!(report.verified);
        assert_eq!(report.document_id, receipt.document_id);
        assert!(service.audit_logs(10).unwrap().is_empty());
    }

    #[test]
    fn test_lost_insert_race_becomes_duplicate() {
        let ledger = Arc::new(RacingLedger {
            inner: SqliteLedger::new_in_memory().unwrap(),
            hide_lookups: AtomicBool::new(false),
        });
        let content = Arc::new(MemoryContentStore::new());
        let service = IntegrityService::new(ledger.clone(), content.clone(), UploadPolicy::default());

        let first = service.upload(&pdf(b"racy", "a.pdf"), "user1").unwrap();

        // Second upload's duplicate check misses the first document.
        ledger.hide_lookups.store(true, Ordering::SeqCst);
        let second = service.upload(&pdf(b"racy", "b.pdf"), "user2");

        match second {
            Err(IntegrityError::Duplicate {
                existing_document_id,
                ..
            }) => assert_eq!(existing_document_id, first.document_id),
            other => panic!("Expected Duplicate, got {:?}", other),
        }

        // The losing upload's blob is cleaned up and only one document exists.
        assert_eq!(ledger.count_documents().unwrap(), 1);
        assert_eq!(content.len(), 1);
        assert!(content
            .exists(&BlobKey::new(&first.document_id, "a.pdf"))
            .unwrap());

        let audit = service.audit_logs(1).unwrap();
        assert_eq!(audit[0].result, AuditResult::Duplicate);
    }
}

#[cfg(test)]
mod audit_listing_tests {
    use super::*;

    #[test]
    fn test_audit_limit_returns_most_recent_first() {
        let f = fixture();
        for i in 0..5 {
            let name = format!("file{}.pdf", i);
            f.service
                .upload(&pdf(name.as_bytes(), &name), "user1")
                .unwrap();
        }

        let records = f.service.audit_logs(2).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].subject_name, "file4.pdf");
        assert_eq!(records[1].subject_name, "file3.pdf");
    }
}
