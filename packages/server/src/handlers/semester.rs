use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use sea_orm::*;
use tracing::instrument;

use crate::entity::semester;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::request::AppJson;
use crate::models::semester::*;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/",
    tag = "Semesters",
    operation_id = "listSemesters",
    summary = "List semesters",
    description = "Returns every semester, newest year first.",
    responses(
        (status = 200, description = "List of semesters", body = Vec<SemesterResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user))]
pub async fn list_semesters(
    _auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<SemesterResponse>>, AppError> {
    let items = semester::Entity::find()
        .order_by_desc(semester::Column::Year)
        .order_by_asc(semester::Column::Term)
        .all(&state.db)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(Json(items))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Semesters",
    operation_id = "createSemester",
    summary = "Create a semester",
    description = "Creates a (year, term) pair. Requires `semester:manage` permission.",
    request_body = CreateSemesterRequest,
    responses(
        (status = 201, description = "Semester created", body = SemesterResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 409, description = "Semester already exists (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(year = payload.year))]
pub async fn create_semester(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateSemesterRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission("semester:manage")?;
    validate_create_semester(&payload)?;

    let model = semester::ActiveModel {
        year: Set(payload.year),
        term: Set(payload.term),
        ..Default::default()
    }
    .insert(&state.db)
    .await
    .map_err(|e| AppError::conflict_on_unique(e, "Semester already exists"))?;

    Ok((StatusCode::CREATED, Json(SemesterResponse::from(model))))
}
