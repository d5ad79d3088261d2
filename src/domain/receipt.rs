use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Document;

/// What a successful upload hands back to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadReceipt {
    pub document_id: String,
    pub hash: String,
    pub file_name: String,
    pub file_size: u64,
    pub timestamp: DateTime<Utc>,
}

impl From<&Document> for UploadReceipt {
    fn from(doc: &Document) -> Self {
        Self {
            document_id: doc.document_id.clone(),
            hash: doc.hash.clone(),
            file_name: doc.file_name.clone(),
            file_size: doc.file_size,
            timestamp: doc.upload_timestamp,
        }
    }
}
