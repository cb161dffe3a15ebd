//! Token verification endpoints for downstream services.
//!
//! These report failures in the body rather than rejecting the request, so a
//! caller can tell an expired token from an unknown user.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::get,
};
use serde_json::json;

use gatekeep_auth::{IdentityKind, Session};
use gatekeep_core::Role;

use crate::app::dto::{self, RecruiterVerifyResponse, StudentVerifyResponse};
use crate::app::errors;
use crate::app::services::AppServices;
use crate::middleware::{no_cache_requested, token};

pub fn router() -> Router {
    Router::new()
        .route("/verify", get(verify_recruiter))
        .route("/student/verify", get(verify_student))
        .route("/invalidate_cache", get(invalidate_cache))
}

/// Always 200; `error` carries the failure code.
pub async fn verify_student(
    Extension(services): Extension<Arc<AppServices>>,
    headers: HeaderMap,
) -> axum::response::Response {
    let session = Session::establish(
        &services.verifier,
        &services.resolver,
        token(&headers),
        IdentityKind::Student,
        &Role::STUDENT,
        no_cache_requested(&headers),
    )
    .await;

    let (student, error) = match session.require(&Role::STUDENT) {
        Ok(identity) => (dto::student_view(identity), None),
        Err(kind) => (None, Some(kind)),
    };

    Json(StudentVerifyResponse {
        student,
        expire: session.expiry(),
        error,
    })
    .into_response()
}

/// 401 for token failures, 500 when the issuer is unreachable. Directory
/// failures keep HTTP 200 and report their status in the body.
pub async fn verify_recruiter(
    Extension(services): Extension<Arc<AppServices>>,
    headers: HeaderMap,
) -> axum::response::Response {
    let no_cache = no_cache_requested(&headers);

    let claims = match services
        .verifier
        .verify(token(&headers).unwrap_or_default(), no_cache)
        .await
    {
        Ok(claims) => claims,
        Err(rejection) => {
            let status = errors::status_for(rejection.kind);
            let body = RecruiterVerifyResponse {
                data: None,
                expire: rejection.claimed_expiry,
                error: Some(rejection.kind),
                email: None,
                status: status.as_u16(),
            };
            return (status, Json(body)).into_response();
        }
    };

    let resolved = services
        .resolver
        .resolve(claims.subject(), IdentityKind::Recruiter, &Role::RECRUITER, no_cache)
        .await;

    let body = match &resolved {
        Ok(identity) => RecruiterVerifyResponse {
            data: dto::recruiter_view(identity),
            expire: Some(claims.expiry()),
            error: None,
            email: Some(claims.subject()),
            status: StatusCode::OK.as_u16(),
        },
        Err(kind) => RecruiterVerifyResponse {
            data: None,
            expire: Some(claims.expiry()),
            error: Some(*kind),
            email: Some(claims.subject()),
            status: errors::status_for(*kind).as_u16(),
        },
    };

    Json(body).into_response()
}

pub async fn invalidate_cache(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    services.keys.invalidate();
    Json(json!({ "message": "Successfully invalidated cache" })).into_response()
}
