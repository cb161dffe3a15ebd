use std::str::FromStr;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Query},
    response::{IntoResponse, Response},
    routing::{get, put},
};
use chrono::Utc;

use gatekeep_auth::{ErrorKind, Identity};
use gatekeep_core::{DomainError, RecordId, Role};
use gatekeep_directory::{StudentProfileView, StudentQuery, StudentRecord};

use crate::app::dto::{
    self, DataResponse, PopulatedRecord, StudentIdQuery, StudentListQuery, StudentListResponse,
    StudentUpdateResponse,
};
use crate::app::errors;
use crate::app::services::AppServices;
use crate::context::SessionContext;

type HandlerResult = Result<Response, Response>;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_students))
        .route("/id", get(get_student_by_id))
        .route("/profile", get(get_profile))
        .route("/tpr/all", get(list_tprs))
        .route("/tprLogin", get(tpr_login))
        .route("/update", put(update_student))
}

fn require<'a>(ctx: &'a SessionContext, role: &Role) -> Result<&'a Identity, Response> {
    ctx.require(role).map_err(errors::error_kind_to_response)
}

fn session_student(identity: &Identity) -> Result<&StudentRecord, Response> {
    identity
        .student()
        .ok_or_else(|| errors::error_kind_to_response(ErrorKind::RoleMismatch))
}

pub async fn list_students(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<SessionContext>,
    Query(params): Query<StudentListQuery>,
) -> HandlerResult {
    require(&ctx, &Role::ADMIN)?;

    let query = StudentQuery::parse(&params.search, params.page, params.per_page)
        .map_err(errors::domain_error_to_response)?;
    let page = services
        .store
        .search_students(&query, ctx.no_cache())
        .await
        .map_err(errors::store_error_to_response)?;

    Ok(Json(StudentListResponse {
        data: page.students.iter().map(PopulatedRecord::from_entry).collect(),
        total: page.total,
    })
    .into_response())
}

pub async fn get_student_by_id(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<SessionContext>,
    Query(params): Query<StudentIdQuery>,
) -> HandlerResult {
    let id = RecordId::from_str(&params.id).map_err(errors::domain_error_to_response)?;

    let entry = services
        .store
        .find_student_by_id(id, ctx.no_cache())
        .await
        .map_err(errors::store_error_to_response)?
        .ok_or_else(|| errors::domain_error_to_response(DomainError::not_found()))?;

    Ok(Json(DataResponse {
        data: PopulatedRecord::from_entry(&entry),
    })
    .into_response())
}

pub async fn get_profile(Extension(ctx): Extension<SessionContext>) -> HandlerResult {
    let identity = require(&ctx, &Role::STUDENT)?;
    let student = session_student(identity)?;

    Ok(Json(StudentProfileView::from_record(student)).into_response())
}

pub async fn list_tprs(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<SessionContext>,
) -> HandlerResult {
    require(&ctx, &Role::ADMIN)?;

    let tprs = services
        .store
        .find_students_by_role(&Role::TPR, ctx.no_cache())
        .await
        .map_err(errors::store_error_to_response)?;

    Ok(Json(DataResponse {
        data: tprs.iter().map(PopulatedRecord::from_entry).collect::<Vec<_>>(),
    })
    .into_response())
}

pub async fn tpr_login(Extension(ctx): Extension<SessionContext>) -> HandlerResult {
    let identity = require(&ctx, &Role::TPR)?;

    Ok(Json(DataResponse {
        data: dto::student_view(identity),
    })
    .into_response())
}

/// Apply a student's own edit.
///
/// The edit is merged into the stored record read fresh from the store, so
/// attestations granted since the session was cached are not lost.
pub async fn update_student(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<SessionContext>,
    Json(incoming): Json<StudentRecord>,
) -> HandlerResult {
    let identity = require(&ctx, &Role::STUDENT)?;

    let current = services
        .store
        .find_student_by_id(identity.id, true)
        .await
        .map_err(errors::store_error_to_response)?
        .ok_or_else(|| errors::domain_error_to_response(DomainError::not_found()))?;

    let outcome = services.trust.merge(&incoming, &current.record, Utc::now());

    if !outcome.revoked.is_empty() {
        tracing::info!(
            student = %identity.id,
            revoked = ?outcome.revoked,
            "edit revoked verified blocks"
        );
    }

    if outcome.changed {
        services
            .store
            .persist_student(outcome.record.clone())
            .await
            .map_err(errors::store_error_to_response)?;
    }

    Ok(Json(StudentUpdateResponse {
        data: &outcome.record,
        revoked: &outcome.revoked,
        changed: outcome.changed,
    })
    .into_response())
}
