use super::{AuditTrail, IntegrityError, UploadPolicy};
use crate::domain::hash::fingerprint;
use crate::domain::{AuditAction, AuditRecord, AuditResult, Document, IncomingFile, UploadReceipt};
use crate::infrastructure::{BlobKey, ContentStore, LedgerError, LedgerStore};
use std::sync::Arc;

pub struct UploadUseCase {
    ledger: Arc<dyn LedgerStore>,
    content: Arc<dyn ContentStore>,
    audit: AuditTrail,
    policy: UploadPolicy,
}

impl UploadUseCase {
    pub fn new(
        ledger: Arc<dyn LedgerStore>,
        content: Arc<dyn ContentStore>,
        audit: AuditTrail,
        policy: UploadPolicy,
    ) -> Self {
        Self {
            ledger,
            content,
            audit,
            policy,
        }
    }

    pub fn execute(&self, file: &IncomingFile, actor: &str) -> Result<UploadReceipt, IntegrityError> {
        self.policy.check_size(file.size())?;
        self.policy.check_content_type(&file.content_type)?;

        let document_id = uuid::Uuid::new_v4().to_string();
        let hash = fingerprint(&file.content);

        // Fast path: known content never reaches the content store.
        if let Some(existing) = self.ledger.find_document_by_hash(&hash)? {
            return Err(self.duplicate(file, actor, existing));
        }

        let key = BlobKey::new(&document_id, &file.file_name);
        let locator = self
            .content
            .put(&key, &file.content, &file.content_type)
            .map_err(|e| {
                tracing::error!(%key, error = %e, "content store write failed");
                IntegrityError::from(e)
            })?;

        let document = Document::new(document_id, file, hash, locator);
        let stored = match self.ledger.put_document(&document) {
            Ok(stored) => stored,
            Err(LedgerError::DuplicateHash) => {
                // A concurrent upload of the same bytes won the insert.
                if let Err(e) = self.content.remove(&key) {
                    tracing::warn!(%key, error = %e, "failed to remove orphaned blob");
                }
                let existing = self
                    .ledger
                    .find_document_by_hash(&document.hash)?
                    .ok_or_else(|| {
                        IntegrityError::StorageUnavailable(
                            "duplicate reported but no document holds the hash".to_string(),
                        )
                    })?;
                return Err(self.duplicate(file, actor, existing));
            }
            Err(e) => {
                tracing::error!(document_id = %document.document_id, error = %e, "document write failed");
                return Err(e.into());
            }
        };

        self.audit.record(
            AuditRecord::new(actor, &file.file_name, AuditAction::Upload, AuditResult::Success)
                .with_document(&stored.document_id)
                .with_hash(&stored.hash),
        );

        tracing::info!(
            document_id = %stored.document_id,
            hash = %stored.hash,
            size = stored.file_size,
            "document uploaded"
        );

        Ok(UploadReceipt::from(&stored))
    }

    fn duplicate(&self, file: &IncomingFile, actor: &str, existing: Document) -> IntegrityError {
        tracing::warn!(
            existing_document_id = %existing.document_id,
            file_name = %file.file_name,
            "document already exists"
        );

        self.audit.record(
            AuditRecord::new(actor, &file.file_name, AuditAction::Upload, AuditResult::Duplicate)
                .with_document(&existing.document_id)
                .with_hash(&existing.hash),
        );

        IntegrityError::Duplicate {
            existing_document_id: existing.document_id,
            hash: existing.hash,
        }
    }
}
