use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::VerificationStatus;

pub const ANONYMOUS_ACTOR: &str = "anonymous";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    Upload,
    Verify,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upload => "UPLOAD",
            Self::Verify => "VERIFY",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuditAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "UPLOAD" => Ok(Self::Upload),
            "VERIFY" => Ok(Self::Verify),
            other => Err(format!("unknown audit action: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditResult {
    Success,
    Duplicate,
    Verified,
    Tampered,
    NotFound,
}

impl AuditResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::Duplicate => "DUPLICATE",
            Self::Verified => "VERIFIED",
            Self::Tampered => "TAMPERED",
            Self::NotFound => "NOT_FOUND",
        }
    }
}

impl From<VerificationStatus> for AuditResult {
    fn from(status: VerificationStatus) -> Self {
        match status {
            VerificationStatus::Verified => Self::Verified,
            VerificationStatus::Tampered => Self::Tampered,
        }
    }
}

impl fmt::Display for AuditResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuditResult {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SUCCESS" => Ok(Self::Success),
            "DUPLICATE" => Ok(Self::Duplicate),
            "VERIFIED" => Ok(Self::Verified),
            "TAMPERED" => Ok(Self::Tampered),
            "NOT_FOUND" => Ok(Self::NotFound),
            other => Err(format!("unknown audit result: {}", other)),
        }
    }
}

/// One immutable entry of the audit trail.
///
/// The wire names `userId` / `fileName` are what existing clients read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    pub id: String,
    #[serde(rename = "userId")]
    pub actor: String,
    #[serde(rename = "fileName")]
    pub subject_name: String,
    pub action: AuditAction,
    pub result: AuditResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl AuditRecord {
    pub fn new(actor: &str, subject_name: &str, action: AuditAction, result: AuditResult) -> Self {
        let actor = if actor.trim().is_empty() {
            ANONYMOUS_ACTOR
        } else {
            actor
        };

        Self {
            id: uuid::Uuid::new_v4().to_string(),
            actor: actor.to_string(),
            subject_name: subject_name.to_string(),
            action,
            result,
            document_id: None,
            hash: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_document(mut self, document_id: &str) -> Self {
        self.document_id = Some(document_id.to_string());
        self
    }

    pub fn with_hash(mut self, hash: &str) -> Self {
        self.hash = Some(hash.to_string());
        self
    }
}
