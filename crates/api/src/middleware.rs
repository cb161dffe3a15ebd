use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode, header::CACHE_CONTROL},
    middleware::Next,
    response::Response,
};

use gatekeep_auth::{ErrorKind, IdentityKind, Session};
use gatekeep_core::Role;

use crate::app::errors;
use crate::app::services::AppServices;
use crate::context::SessionContext;

/// Header carrying the raw ID token.
pub const TOKEN_HEADER: &str = "token";

#[derive(Clone)]
pub struct SessionState {
    pub services: Arc<AppServices>,
}

/// Establish a student session and attach it to the request.
///
/// Requests without a resolvable student never reach the handler.
pub async fn session_middleware(
    State(state): State<SessionState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let no_cache = no_cache_requested(req.headers());
    let token = token(req.headers()).map(str::to_owned);

    let session = Session::establish(
        &state.services.verifier,
        &state.services.resolver,
        token.as_deref(),
        IdentityKind::Student,
        &Role::STUDENT,
        no_cache,
    )
    .await;

    if let Some(kind) = session.error() {
        return errors::error_kind_to_response(kind);
    }
    if session.identity().is_none() {
        return errors::json_error(
            StatusCode::UNAUTHORIZED,
            ErrorKind::MalformedToken.code(),
            "missing token header",
        );
    }

    req.extensions_mut().insert(SessionContext::new(session));
    next.run(req).await
}

pub fn token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// `cache-control: no-cache` asks every cache on the path to be bypassed.
pub fn no_cache_requested(headers: &HeaderMap) -> bool {
    headers
        .get_all(CACHE_CONTROL)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .any(|directive| directive.trim().eq_ignore_ascii_case("no-cache"))
}
