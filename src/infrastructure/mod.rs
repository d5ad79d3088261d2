pub mod content_store;
pub mod database;
pub mod multipart;

pub use content_store::{BlobKey, ContentStore, ContentStoreError, FsContentStore, MemoryContentStore};
pub use database::{LedgerError, LedgerStore, SqliteLedger};
