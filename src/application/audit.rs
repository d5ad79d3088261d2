use crate::domain::AuditRecord;
use crate::infrastructure::LedgerStore;
use std::sync::Arc;

/// Best-effort writer for the audit trail.
///
/// The write happens inline, on the blocking worker thread already serving
/// the request, right after the operation it describes. A failed write is
/// logged and swallowed; it never fails the upload or verification that
/// triggered it.
#[derive(Clone)]
pub struct AuditTrail {
    ledger: Arc<dyn LedgerStore>,
}

impl AuditTrail {
    pub fn new(ledger: Arc<dyn LedgerStore>) -> Self {
        Self { ledger }
    }

    pub fn record(&self, record: AuditRecord) -> Option<AuditRecord> {
        match self.ledger.append_audit(&record) {
            Ok(stored) => {
                tracing::debug!(
                    action = %stored.action,
                    result = %stored.result,
                    subject = %stored.subject_name,
                    "audit record saved"
                );
                Some(stored)
            }
            Err(e) => {
                tracing::warn!(
                    action = %record.action,
                    result = %record.result,
                    error = %e,
                    "failed to save audit record"
                );
                None
            }
        }
    }
}
