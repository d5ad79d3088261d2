use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A file presented for upload or verification, as received from the client.
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub content: Vec<u8>,
    pub file_name: String,
    pub content_type: String,
}

impl IncomingFile {
    pub fn new(content: Vec<u8>, file_name: &str, content_type: &str) -> Self {
        Self {
            content,
            file_name: file_name.to_string(),
            content_type: content_type.to_string(),
        }
    }

    pub fn size(&self) -> u64 {
        self.content.len() as u64
    }
}

/// Outcome of comparing a presented file against a stored document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationStatus {
    Verified,
    Tampered,
}

impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Verified => "VERIFIED",
            Self::Tampered => "TAMPERED",
        }
    }
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VerificationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "VERIFIED" => Ok(Self::Verified),
            "TAMPERED" => Ok(Self::Tampered),
            other => Err(format!("unknown verification status: {}", other)),
        }
    }
}

/// Canonical record of one uploaded file.
///
/// Everything except the three verification fields is fixed at upload time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub document_id: String,
    pub file_name: String,
    pub file_size: u64,
    pub content_type: String,
    pub hash: String,
    pub blob_locator: String,
    pub upload_timestamp: DateTime<Utc>,
    pub last_verified: Option<DateTime<Utc>>,
    pub verification_count: u64,
    pub last_verification_result: Option<VerificationStatus>,
}

impl Document {
    pub fn new(document_id: String, file: &IncomingFile, hash: String, blob_locator: String) -> Self {
        Self {
            document_id,
            file_name: file.file_name.clone(),
            file_size: file.size(),
            content_type: file.content_type.clone(),
            hash,
            blob_locator,
            upload_timestamp: Utc::now(),
            last_verified: None,
            verification_count: 0,
            last_verification_result: None,
        }
    }
}
