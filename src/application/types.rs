use crate::domain::{UploadReceipt, VerificationStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of a successful upload (201).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub message: String,
    #[serde(flatten)]
    pub receipt: UploadReceipt,
}

impl UploadResponse {
    pub fn uploaded(receipt: UploadReceipt) -> Self {
        Self {
            message: "Document uploaded successfully".to_string(),
            receipt,
        }
    }
}

/// Result of checking a presented file against a stored document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationReport {
    pub verified: bool,
    pub status: VerificationStatus,
    /// Fingerprint of the presented bytes.
    pub hash: String,
    /// Fingerprint on file for the matched document.
    pub original_hash: String,
    pub document_id: String,
    pub original_timestamp: DateTime<Utc>,
    pub verification_timestamp: DateTime<Utc>,
    pub file_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub service: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "OK".to_string(),
            timestamp: Utc::now(),
            service: "Document Verification API".to_string(),
        }
    }
}

/// Error body shared by every failing endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub existing_document_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            ..Self::default()
        }
    }
}
