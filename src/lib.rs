pub mod application;
pub mod config;
pub mod domain;
pub mod handlers;
pub mod infrastructure;
pub mod server;

// Re-export commonly used types
pub use application::{IntegrityError, IntegrityService, UploadPolicy, VerificationReport};
pub use config::Config;
pub use domain::{AuditRecord, Document, IncomingFile, UploadReceipt};
pub use handlers::AppState;
pub use infrastructure::{ContentStore, FsContentStore, LedgerStore, SqliteLedger};
