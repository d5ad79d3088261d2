use super::{AuditTrail, IntegrityError, UploadPolicy, VerificationReport};
use crate::domain::hash::{fingerprint, hashes_match};
use crate::domain::{AuditAction, AuditRecord, AuditResult, IncomingFile, VerificationStatus};
use crate::infrastructure::LedgerStore;
use chrono::Utc;
use std::sync::Arc;

pub struct VerifyUseCase {
    ledger: Arc<dyn LedgerStore>,
    audit: AuditTrail,
    policy: UploadPolicy,
}

impl VerifyUseCase {
    pub fn new(ledger: Arc<dyn LedgerStore>, audit: AuditTrail, policy: UploadPolicy) -> Self {
        Self {
            ledger,
            audit,
            policy,
        }
    }

    /// Check `file` against the ledger.
    ///
    /// Without `claimed_document_id` the lookup is by content hash, so a hit
    /// is always VERIFIED and modified content surfaces as `NotFound`. With a
    /// claimed id the stored hash for that document is compared, which is the
    /// only way to report TAMPERED.
    pub fn execute(
        &self,
        file: &IncomingFile,
        claimed_document_id: Option<&str>,
        actor: &str,
    ) -> Result<VerificationReport, IntegrityError> {
        self.policy.check_size(file.size())?;

        let current_hash = fingerprint(&file.content);

        let original = match claimed_document_id {
            Some(id) => self.ledger.find_document_by_id(id)?,
            None => self.ledger.find_document_by_hash(&current_hash)?,
        };

        let Some(original) = original else {
            tracing::warn!(
                hash = %current_hash,
                claimed_document_id = claimed_document_id.unwrap_or("-"),
                "document not found in system"
            );
            self.audit.record(
                AuditRecord::new(actor, &file.file_name, AuditAction::Verify, AuditResult::NotFound)
                    .with_hash(&current_hash),
            );
            return Err(IntegrityError::NotFound { current_hash });
        };

        let status = if hashes_match(&original.hash, &current_hash) {
            VerificationStatus::Verified
        } else {
            VerificationStatus::Tampered
        };

        let verified_at = Utc::now();
        let updated = self
            .ledger
            .update_verification(&original.document_id, status, verified_at)
            .map_err(|e| {
                tracing::error!(document_id = %original.document_id, error = %e, "verification update failed");
                IntegrityError::from(e)
            })?;

        self.audit.record(
            AuditRecord::new(actor, &file.file_name, AuditAction::Verify, status.into())
                .with_document(&updated.document_id)
                .with_hash(&current_hash),
        );

        tracing::info!(
            document_id = %updated.document_id,
            status = %status,
            verification_count = updated.verification_count,
            "verification completed"
        );

        Ok(VerificationReport {
            verified: status == VerificationStatus::Verified,
            status,
            hash: current_hash,
            original_hash: updated.hash,
            document_id: updated.document_id,
            original_timestamp: updated.upload_timestamp,
            verification_timestamp: verified_at,
            file_name: updated.file_name,
        })
    }
}
