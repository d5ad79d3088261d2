use crate::domain::IncomingFile;
use hyper::{header, Body, Request};
use multer::{Constraints, Multipart, SizeLimit};
use thiserror::Error;

pub const FILE_FIELD: &str = "document";
pub const CLAIMED_ID_FIELD: &str = "documentId";

const DEFAULT_FILE_NAME: &str = "document";
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";
/// Headroom on top of the file limit for boundaries, headers and text fields.
const FORM_OVERHEAD: u64 = 64 * 1024;

#[derive(Error, Debug)]
pub enum FormError {
    #[error("Expected a multipart/form-data request body")]
    NotMultipart,

    #[error("File too large. Maximum size is {limit} bytes.")]
    FileTooLarge { limit: u64 },

    #[error("Unexpected file field. Use \"document\" as field name.")]
    UnexpectedField,

    #[error("Malformed multipart body: {0}")]
    Malformed(String),
}

impl FormError {
    fn from_multer(err: multer::Error, limit: u64) -> Self {
        match err {
            multer::Error::FieldSizeExceeded { .. } | multer::Error::StreamSizeExceeded { .. } => {
                FormError::FileTooLarge { limit }
            }
            multer::Error::UnknownField { .. } => FormError::UnexpectedField,
            other => FormError::Malformed(other.to_string()),
        }
    }
}

/// Fields of an upload or verify form.
#[derive(Debug, Default)]
pub struct DocumentForm {
    pub file: Option<IncomingFile>,
    pub claimed_document_id: Option<String>,
}

/// Read the `document` file field (and an optional `documentId` text field)
/// from a multipart request, refusing any file larger than `max_file_size`.
pub async fn read_document_form(
    req: Request<Body>,
    max_file_size: u64,
) -> Result<DocumentForm, FormError> {
    let boundary = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|ct| ct.to_str().ok())
        .and_then(|ct| multer::parse_boundary(ct).ok())
        .ok_or(FormError::NotMultipart)?;

    let constraints = Constraints::new()
        .allowed_fields(vec![FILE_FIELD, CLAIMED_ID_FIELD])
        .size_limit(
            SizeLimit::new()
                .whole_stream(max_file_size + FORM_OVERHEAD)
                .for_field(FILE_FIELD, max_file_size)
                .for_field(CLAIMED_ID_FIELD, 256),
        );

    let mut multipart = Multipart::with_constraints(req.into_body(), boundary, constraints);
    let mut form = DocumentForm::default();
    let form_error = |e: multer::Error| FormError::from_multer(e, max_file_size);

    while let Some(field) = multipart.next_field().await.map_err(form_error)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some(FILE_FIELD) => {
                let file_name = field
                    .file_name()
                    .filter(|n| !n.trim().is_empty())
                    .unwrap_or(DEFAULT_FILE_NAME)
                    .to_string();
                let content_type = field
                    .content_type()
                    .map(|m| m.essence_str().to_string())
                    .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());
                let content = field.bytes().await.map_err(form_error)?;

                if form.file.is_some() {
                    return Err(FormError::UnexpectedField);
                }
                form.file = Some(IncomingFile::new(content.to_vec(), &file_name, &content_type));
            }
            Some(CLAIMED_ID_FIELD) => {
                let text = field.text().await.map_err(form_error)?;
                let text = text.trim();
                if !text.is_empty() {
                    form.claimed_document_id = Some(text.to_string());
                }
            }
            _ => return Err(FormError::UnexpectedField),
        }
    }

    Ok(form)
}
