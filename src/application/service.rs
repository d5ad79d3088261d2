use super::{
    AuditTrail, IntegrityError, UploadPolicy, UploadUseCase, VerificationReport, VerifyUseCase,
};
use crate::domain::{AuditRecord, IncomingFile, UploadReceipt};
use crate::infrastructure::{ContentStore, LedgerStore};
use std::sync::Arc;

/// Upload, verification and audit access over one set of stores.
///
/// Built once at startup and shared by every request.
pub struct IntegrityService {
    upload: UploadUseCase,
    verify: VerifyUseCase,
    ledger: Arc<dyn LedgerStore>,
    policy: UploadPolicy,
}

impl IntegrityService {
    pub fn new(
        ledger: Arc<dyn LedgerStore>,
        content: Arc<dyn ContentStore>,
        policy: UploadPolicy,
    ) -> Self {
        let audit = AuditTrail::new(ledger.clone());

        Self {
            upload: UploadUseCase::new(ledger.clone(), content, audit.clone(), policy.clone()),
            verify: VerifyUseCase::new(ledger.clone(), audit, policy.clone()),
            ledger,
            policy,
        }
    }

    pub fn policy(&self) -> &UploadPolicy {
        &self.policy
    }

    pub fn upload(&self, file: &IncomingFile, actor: &str) -> Result<UploadReceipt, IntegrityError> {
        self.upload.execute(file, actor)
    }

    pub fn verify(
        &self,
        file: &IncomingFile,
        claimed_document_id: Option<&str>,
        actor: &str,
    ) -> Result<VerificationReport, IntegrityError> {
        self.verify.execute(file, claimed_document_id, actor)
    }

    pub fn audit_logs(&self, limit: usize) -> Result<Vec<AuditRecord>, IntegrityError> {
        Ok(self.ledger.list_audit(limit)?)
    }

    pub fn document_count(&self) -> Result<usize, IntegrityError> {
        Ok(self.ledger.count_documents()?)
    }
}
