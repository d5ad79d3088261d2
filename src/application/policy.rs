use super::IntegrityError;

/// Largest file accepted for upload or verification: 10 MiB.
pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

pub const ALLOWED_CONTENT_TYPES: &[&str] = &[
    "application/pdf",
    "image/jpeg",
    "image/jpg",
    "image/png",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
];

/// Human-readable form of a byte limit: `10MB`, `512KB`, or plain bytes.
pub fn size_label(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = 1024 * 1024;

    if bytes >= MIB && bytes % MIB == 0 {
        format!("{}MB", bytes / MIB)
    } else if bytes >= KIB && bytes % KIB == 0 {
        format!("{}KB", bytes / KIB)
    } else {
        format!("{} bytes", bytes)
    }
}

/// Limits applied to every presented file before anything is stored.
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    pub max_file_size: u64,
    pub allowed_content_types: Vec<String>,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_file_size: MAX_FILE_SIZE,
            allowed_content_types: ALLOWED_CONTENT_TYPES.iter().map(|t| t.to_string()).collect(),
        }
    }
}

impl UploadPolicy {
    pub fn check_size(&self, size: u64) -> Result<(), IntegrityError> {
        if size > self.max_file_size {
            return Err(IntegrityError::FileTooLarge {
                size,
                limit: self.max_file_size,
            });
        }
        Ok(())
    }

    pub fn check_content_type(&self, content_type: &str) -> Result<(), IntegrityError> {
        if self.allowed_content_types.iter().any(|t| t == content_type) {
            return Ok(());
        }
        Err(IntegrityError::UnsupportedType {
            content_type: content_type.to_string(),
            allowed: self.allowed_content_types.join(", "),
        })
    }
}
