// HTTP boundary: routing, form parsing and response shaping. Business rules
// live in `IntegrityService`; everything here is translation.

use crate::application::{
    size_label, ErrorResponse, HealthResponse, IntegrityError, IntegrityService, UploadResponse,
};
use crate::config::Environment;
use crate::domain::ANONYMOUS_ACTOR;
use crate::infrastructure::multipart::{read_document_form, DocumentForm, FormError};
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{Body, Method, Request, Response, StatusCode};
use serde::Serialize;
use std::convert::Infallible;
use std::sync::Arc;
use tracing::Instrument;

pub const ACTOR_HEADER: &str = "x-user-id";
pub const DEFAULT_AUDIT_LIMIT: usize = 50;
pub const MAX_AUDIT_LIMIT: usize = 500;

/// Shared, read-only state handed to every request.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<IntegrityService>,
    pub environment: Environment,
}

impl AppState {
    pub fn new(service: Arc<IntegrityService>, environment: Environment) -> Self {
        Self {
            service,
            environment,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Operation {
    Upload,
    Verify,
    AuditLogs,
}

impl Operation {
    fn failure_message(&self) -> &'static str {
        match self {
            Self::Upload => "Failed to upload document",
            Self::Verify => "Failed to verify document",
            Self::AuditLogs => "Failed to fetch audit logs",
        }
    }
}

/// Entry point for every request.
pub async fn route(req: Request<Body>, state: AppState) -> Result<Response<Body>, Infallible> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let span = tracing::info_span!("request", %method, %path);

    async move {
        // Clients may address the API under `/api`.
        let local = path.strip_prefix("/api").unwrap_or(&path);

        let response = match (&method, local) {
            (&Method::GET, "/") => handle_index(),
            (&Method::POST, "/documents/upload") => handle_upload(req, &state).await,
            (&Method::POST, "/documents/verify") => handle_verify(req, &state).await,
            (&Method::GET, "/documents/audit-logs") => handle_audit_logs(req, &state).await,
            (&Method::GET, "/documents/health") => json_response(StatusCode::OK, &HealthResponse::ok()),
            _ => json_response(StatusCode::NOT_FOUND, &ErrorResponse::new("Route not found")),
        };

        tracing::info!(status = response.status().as_u16(), "request completed");
        Ok(response)
    }
    .instrument(span)
    .await
}

pub async fn handle_upload(req: Request<Body>, state: &AppState) -> Response<Body> {
    let actor = actor_of(&req);
    let form = match read_form(req, state).await {
        Ok(form) => form,
        Err(response) => return response,
    };
    let Some(file) = form.file else {
        return json_response(StatusCode::BAD_REQUEST, &ErrorResponse::new("No file uploaded"));
    };

    tracing::info!(
        file_name = %file.file_name,
        size = file.size(),
        content_type = %file.content_type,
        "upload request received"
    );

    let service = state.service.clone();
    let outcome = tokio::task::spawn_blocking(move || service.upload(&file, &actor)).await;

    match outcome {
        Ok(Ok(receipt)) => json_response(StatusCode::CREATED, &UploadResponse::uploaded(receipt)),
        Ok(Err(e)) => error_response(e, Operation::Upload, state.environment),
        Err(join_error) => internal_error(Operation::Upload, &join_error, state.environment),
    }
}

pub async fn handle_verify(req: Request<Body>, state: &AppState) -> Response<Body> {
    let actor = actor_of(&req);
    let form = match read_form(req, state).await {
        Ok(form) => form,
        Err(response) => return response,
    };
    let Some(file) = form.file else {
        return json_response(
            StatusCode::BAD_REQUEST,
            &ErrorResponse::new("No file uploaded for verification"),
        );
    };
    let claimed = form.claimed_document_id;

    tracing::info!(
        file_name = %file.file_name,
        size = file.size(),
        claimed_document_id = claimed.as_deref().unwrap_or("-"),
        "verify request received"
    );

    let service = state.service.clone();
    let outcome =
        tokio::task::spawn_blocking(move || service.verify(&file, claimed.as_deref(), &actor)).await;

    match outcome {
        Ok(Ok(report)) => json_response(StatusCode::OK, &report),
        Ok(Err(e)) => error_response(e, Operation::Verify, state.environment),
        Err(join_error) => internal_error(Operation::Verify, &join_error, state.environment),
    }
}

pub async fn handle_audit_logs(req: Request<Body>, state: &AppState) -> Response<Body> {
    let limit = audit_limit(req.uri().query());

    let service = state.service.clone();
    let outcome = tokio::task::spawn_blocking(move || service.audit_logs(limit)).await;

    match outcome {
        Ok(Ok(records)) => json_response(StatusCode::OK, &records),
        Ok(Err(e)) => error_response(e, Operation::AuditLogs, state.environment),
        Err(join_error) => internal_error(Operation::AuditLogs, &join_error, state.environment),
    }
}

fn handle_index() -> Response<Body> {
    let body = serde_json::json!({
        "message": "Document Verification & Audit System API",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "Running",
        "endpoints": {
            "upload": "POST /documents/upload",
            "verify": "POST /documents/verify",
            "auditLogs": "GET /documents/audit-logs",
            "health": "GET /documents/health"
        }
    });
    json_response(StatusCode::OK, &body)
}

async fn read_form(req: Request<Body>, state: &AppState) -> Result<DocumentForm, Response<Body>> {
    let max = state.service.policy().max_file_size;
    read_document_form(req, max).await.map_err(|e| {
        tracing::warn!(error = %e, "rejected form");
        let message = match e {
            FormError::NotMultipart => "No file uploaded".to_string(),
            FormError::FileTooLarge { limit } => {
                format!("File too large. Maximum size is {}.", size_label(limit))
            }
            other => other.to_string(),
        };
        json_response(StatusCode::BAD_REQUEST, &ErrorResponse::new(message))
    })
}

fn actor_of(req: &Request<Body>) -> String {
    req.headers()
        .get(ACTOR_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(ANONYMOUS_ACTOR)
        .to_string()
}

/// `limit` query parameter: missing, unparsable or zero means the default.
pub fn audit_limit(query: Option<&str>) -> usize {
    query
        .and_then(|q| {
            url::form_urlencoded::parse(q.as_bytes())
                .find(|(k, _)| k == "limit")
                .and_then(|(_, v)| v.trim().parse::<usize>().ok())
        })
        .filter(|&n| n > 0)
        .unwrap_or(DEFAULT_AUDIT_LIMIT)
        .min(MAX_AUDIT_LIMIT)
}

fn error_response(err: IntegrityError, op: Operation, env: Environment) -> Response<Body> {
    let status = err.status_code();
    let body = match err {
        IntegrityError::Duplicate {
            existing_document_id,
            hash,
        } => ErrorResponse {
            existing_document_id: Some(existing_document_id),
            hash: Some(hash),
            ..ErrorResponse::new("Document already exists")
        },
        IntegrityError::NotFound { current_hash } => ErrorResponse {
            current_hash: Some(current_hash),
            ..ErrorResponse::new("Document not found in system")
        },
        IntegrityError::StorageUnavailable(detail) => {
            tracing::error!(operation = ?op, error = %detail, "operation failed");
            ErrorResponse {
                details: env.exposes_details().then_some(detail),
                ..ErrorResponse::new(op.failure_message())
            }
        }
        validation => ErrorResponse::new(validation.to_string()),
    };

    json_response(status, &body)
}

fn internal_error(op: Operation, err: &dyn std::error::Error, env: Environment) -> Response<Body> {
    tracing::error!(operation = ?op, error = %err, "worker task failed");
    let body = ErrorResponse {
        details: env.exposes_details().then(|| err.to_string()),
        ..ErrorResponse::new(op.failure_message())
    };
    json_response(StatusCode::INTERNAL_SERVER_ERROR, &body)
}

fn json_response<T: Serialize + ?Sized>(status: StatusCode, body: &T) -> Response<Body> {
    let (status, payload) = match serde_json::to_vec(body) {
        Ok(bytes) => (status, bytes),
        Err(e) => {
            tracing::error!(error = %e, "failed to serialize response");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                br#"{"error":"Internal server error"}"#.to_vec(),
            )
        }
    };

    let mut response = Response::new(Body::from(payload));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}
