use super::policy::size_label;
use crate::infrastructure::{ContentStoreError, LedgerError};
use hyper::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IntegrityError {
    #[error("File size exceeds {} limit ({size} bytes)", limit_label(.limit))]
    FileTooLarge { size: u64, limit: u64 },

    #[error("Invalid file type '{content_type}'. Allowed types: {allowed}")]
    UnsupportedType {
        content_type: String,
        allowed: String,
    },

    #[error("Document already exists")]
    Duplicate {
        existing_document_id: String,
        hash: String,
    },

    #[error("Document not found in system")]
    NotFound { current_hash: String },

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),
}

impl IntegrityError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::FileTooLarge { .. } | Self::UnsupportedType { .. } => StatusCode::BAD_REQUEST,
            Self::Duplicate { .. } => StatusCode::CONFLICT,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::StorageUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn limit_label(limit: &u64) -> String {
    size_label(*limit)
}

impl From<LedgerError> for IntegrityError {
    fn from(err: LedgerError) -> Self {
        Self::StorageUnavailable(err.to_string())
    }
}

impl From<ContentStoreError> for IntegrityError {
    fn from(err: ContentStoreError) -> Self {
        Self::StorageUnavailable(err.to_string())
    }
}
