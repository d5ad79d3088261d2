mod audit;
mod error;
mod policy;
mod service;
mod types;
mod upload;
mod verify;

pub use audit::AuditTrail;
pub use error::IntegrityError;
pub use policy::{size_label, UploadPolicy, ALLOWED_CONTENT_TYPES, MAX_FILE_SIZE};
pub use service::IntegrityService;
pub use types::{ErrorResponse, HealthResponse, UploadResponse, VerificationReport};
pub use upload::UploadUseCase;
pub use verify::VerifyUseCase;
