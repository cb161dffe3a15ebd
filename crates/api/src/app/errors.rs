use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use gatekeep_auth::{ErrorClass, ErrorKind};
use gatekeep_core::DomainError;
use gatekeep_directory::StoreError;

/// HTTP status for an identity failure: authentication 401, authorization
/// 403, infrastructure 500.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind.class() {
        ErrorClass::Authentication => StatusCode::UNAUTHORIZED,
        ErrorClass::Authorization => StatusCode::FORBIDDEN,
        ErrorClass::Infrastructure => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn error_kind_to_response(kind: ErrorKind) -> axum::response::Response {
    json_error(status_for(kind), kind.code(), kind.to_string())
}

pub fn store_error_to_response(err: StoreError) -> axum::response::Response {
    tracing::warn!(error = %err, "directory store call failed");
    error_kind_to_response(ErrorKind::from(err))
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
        DomainError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
