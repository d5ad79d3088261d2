mod audit;
mod document;
pub mod hash;
mod receipt;

pub use audit::{AuditAction, AuditRecord, AuditResult, ANONYMOUS_ACTOR};
pub use document::{Document, IncomingFile, VerificationStatus};
pub use receipt::UploadReceipt;
