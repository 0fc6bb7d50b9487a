use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use common::{QuestionStatus, RejectionReason};
use sea_orm::prelude::Expr;
use sea_orm::sea_query::LockType;
use sea_orm::*;
use tracing::instrument;

use crate::entity::question::status_condition;
use crate::entity::{question, queue};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::request::{AppJson, AppQuery};
use crate::models::queue::*;
use crate::models::shared::{ensure_tag_subset, normalize_tags, tags_from_json, tags_to_json};
use crate::state::AppState;
use crate::utils::course::{
    find_course_for_share, find_queue_in_course, require_leadership, require_member,
    require_staff,
};

async fn count_in_status<C: ConnectionTrait>(
    db: &C,
    queue_id: i32,
    status: QuestionStatus,
) -> Result<u64, AppError> {
    Ok(question::Entity::find()
        .filter(question::Column::QueueId.eq(queue_id))
        .filter(status_condition(status))
        .count(db)
        .await?)
}

async fn queue_response<C: ConnectionTrait>(
    db: &C,
    model: queue::Model,
) -> Result<QueueResponse, AppError> {
    let asked = count_in_status(db, model.id, QuestionStatus::Asked).await?;
    let active = count_in_status(db, model.id, QuestionStatus::Active).await?;
    Ok(QueueResponse::new(model, asked, active))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Queues",
    operation_id = "listQueues",
    summary = "List the queues of a course",
    description = "Returns the course's queues with live waiting/active counts. Visible to all members.",
    params(("id" = i32, Path, description = "Course ID"), QueueListQuery),
    responses(
        (status = 200, description = "List of queues", body = Vec<QueueResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Course not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(course_id))]
pub async fn list_queues(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(course_id): Path<i32>,
    AppQuery(query): AppQuery<QueueListQuery>,
) -> Result<Json<Vec<QueueResponse>>, AppError> {
    require_member(&state.db, course_id, &auth_user).await?;

    let mut select = queue::Entity::find()
        .filter(queue::Column::CourseId.eq(course_id))
        .order_by_asc(queue::Column::Id);
    if !query.include_archived.unwrap_or(false) {
        select = select.filter(queue::Column::Archived.eq(false));
    }

    let mut items = Vec::new();
    for model in select.all(&state.db).await? {
        items.push(queue_response(&state.db, model).await?);
    }

    Ok(Json(items))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Queues",
    operation_id = "createQueue",
    summary = "Create a queue",
    description = "Creates a queue in the course. Tags must be a subset of the course tags. Requires a leadership role.",
    params(("id" = i32, Path, description = "Course ID")),
    request_body = CreateQueueRequest,
    responses(
        (status = 201, description = "Queue created", body = QueueResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Course not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Queue name taken (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(course_id, name = %payload.name))]
pub async fn create_queue(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(course_id): Path<i32>,
    AppJson(payload): AppJson<CreateQueueRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_create_queue(&payload)?;
    require_leadership(&state.db, course_id, &auth_user).await?;

    let txn = state.db.begin().await?;
    let course = find_course_for_share(&txn, course_id).await?;

    let tags = normalize_tags(&payload.tags);
    ensure_tag_subset(&tags, &tags_from_json(&course.tags))?;

    let now = chrono::Utc::now();
    let model = queue::ActiveModel {
        course_id: Set(course_id),
        name: Set(payload.name.trim().to_string()),
        description: Set(payload.description),
        estimated_wait_time: Set(payload.estimated_wait_time),
        active: Set(payload.active.unwrap_or(true)),
        archived: Set(false),
        start_end_times: Set(windows_to_json(&payload.start_end_times)),
        tags: Set(tags_to_json(&tags)),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(|e| AppError::conflict_on_unique(e, "A queue with this name already exists"))?;
    txn.commit().await?;

    Ok((
        StatusCode::CREATED,
        Json(QueueResponse::new(model, 0, 0)),
    ))
}

#[utoipa::path(
    get,
    path = "/{queue_id}",
    tag = "Queues",
    operation_id = "getQueue",
    summary = "Get a queue",
    params(
        ("id" = i32, Path, description = "Course ID"),
        ("queue_id" = i32, Path, description = "Queue ID"),
    ),
    responses(
        (status = 200, description = "Queue details", body = QueueResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Course or queue not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(course_id, queue_id))]
pub async fn get_queue(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((course_id, queue_id)): Path<(i32, i32)>,
) -> Result<Json<QueueResponse>, AppError> {
    require_member(&state.db, course_id, &auth_user).await?;
    let model = find_queue_in_course(&state.db, course_id, queue_id).await?;
    Ok(Json(queue_response(&state.db, model).await?))
}

#[utoipa::path(
    patch,
    path = "/{queue_id}",
    tag = "Queues",
    operation_id = "updateQueue",
    summary = "Update a queue",
    description = "Partially updates queue settings, including opening/closing it. Requires a leadership role.",
    params(
        ("id" = i32, Path, description = "Course ID"),
        ("queue_id" = i32, Path, description = "Queue ID"),
    ),
    request_body = UpdateQueueRequest,
    responses(
        (status = 200, description = "Queue updated", body = QueueResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Course or queue not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Queue name taken (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(course_id, queue_id))]
pub async fn update_queue(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((course_id, queue_id)): Path<(i32, i32)>,
    AppJson(payload): AppJson<UpdateQueueRequest>,
) -> Result<Json<QueueResponse>, AppError> {
    validate_update_queue(&payload)?;
    require_leadership(&state.db, course_id, &auth_user).await?;

    let txn = state.db.begin().await?;
    let course = find_course_for_share(&txn, course_id).await?;
    let existing = queue::Entity::find_by_id(queue_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .filter(|q| q.course_id == course_id)
        .ok_or_else(|| AppError::NotFound("Queue not found".into()))?;

    if payload == UpdateQueueRequest::default() {
        return Ok(Json(queue_response(&txn, existing).await?));
    }

    let mut active: queue::ActiveModel = existing.into();
    if let Some(ref tags) = payload.tags {
        let tags = normalize_tags(tags);
        ensure_tag_subset(&tags, &tags_from_json(&course.tags))?;
        active.tags = Set(tags_to_json(&tags));
    }
    if let Some(ref name) = payload.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(description) = payload.description {
        active.description = Set(description);
    }
    if let Some(minutes) = payload.estimated_wait_time {
        active.estimated_wait_time = Set(minutes);
    }
    if let Some(is_active) = payload.active {
        active.active = Set(is_active);
    }
    if let Some(archived) = payload.archived {
        active.archived = Set(archived);
        if archived {
            active.active = Set(false);
        }
    }
    if let Some(ref windows) = payload.start_end_times {
        active.start_end_times = Set(windows_to_json(windows));
    }
    active.updated_at = Set(chrono::Utc::now());

    let model = active
        .update(&txn)
        .await
        .map_err(|e| AppError::conflict_on_unique(e, "A queue with this name already exists"))?;
    let response = queue_response(&txn, model).await?;
    txn.commit().await?;

    Ok(Json(response))
}

#[utoipa::path(
    post,
    path = "/{queue_id}/clear",
    tag = "Queues",
    operation_id = "clearQueue",
    summary = "Reject every waiting question",
    description = "Rejects all asked-but-not-started questions with reason `OH_ENDED` in one transaction. Requires a staff role.",
    params(
        ("id" = i32, Path, description = "Course ID"),
        ("queue_id" = i32, Path, description = "Queue ID"),
    ),
    responses(
        (status = 200, description = "Queue cleared", body = ClearQueueResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Course or queue not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(course_id, queue_id))]
pub async fn clear_queue(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((course_id, queue_id)): Path<(i32, i32)>,
) -> Result<Json<ClearQueueResponse>, AppError> {
    require_staff(&state.db, course_id, &auth_user).await?;

    let txn = state.db.begin().await?;
    queue::Entity::find_by_id(queue_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .filter(|q| q.course_id == course_id)
        .ok_or_else(|| AppError::NotFound("Queue not found".into()))?;

    let now = chrono::Utc::now();
    let result = question::Entity::update_many()
        .col_expr(question::Column::TimeRejected, Expr::value(now))
        .col_expr(question::Column::RejectedById, Expr::value(auth_user.user_id))
        .col_expr(
            question::Column::RejectedReason,
            Expr::value(RejectionReason::OhEnded),
        )
        .col_expr(question::Column::TimeLastUpdated, Expr::value(now))
        .filter(question::Column::QueueId.eq(queue_id))
        .filter(status_condition(QuestionStatus::Asked))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    tracing::info!(queue_id, rejected = result.rows_affected, "Queue cleared");
    Ok(Json(ClearQueueResponse {
        rejected: result.rows_affected,
    }))
}
