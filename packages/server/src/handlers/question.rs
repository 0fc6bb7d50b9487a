use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use common::{CourseUserKind, QuestionStatus};
use sea_orm::sea_query::{LockType, Query as SeaQuery};
use sea_orm::*;
use tracing::instrument;

use crate::entity::question::status_condition;
use crate::entity::{course_user, question, queue};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::request::{AppJson, AppQuery};
use crate::models::question::*;
use crate::models::shared::{ensure_tag_subset, normalize_tags, tags_from_json, tags_to_json};
use crate::state::AppState;
use crate::utils::course::{
    find_course_for_share, find_queue_in_course, require_member, require_staff,
};

/// Load and row-lock a question that must belong to the queue in the path.
async fn lock_question(
    txn: &DatabaseTransaction,
    course_id: i32,
    queue_id: i32,
    question_id: i32,
) -> Result<question::Model, AppError> {
    find_queue_in_course(txn, course_id, queue_id).await?;
    question::Entity::find_by_id(question_id)
        .lock(LockType::Update)
        .one(txn)
        .await?
        .filter(|q| q.queue_id == queue_id)
        .ok_or_else(|| AppError::NotFound("Question not found".into()))
}

async fn find_question<C: ConnectionTrait>(
    db: &C,
    course_id: i32,
    queue_id: i32,
    question_id: i32,
) -> Result<question::Model, AppError> {
    find_queue_in_course(db, course_id, queue_id).await?;
    question::Entity::find_by_id(question_id)
        .one(db)
        .await?
        .filter(|q| q.queue_id == queue_id)
        .ok_or_else(|| AppError::NotFound("Question not found".into()))
}

/// Staff see every question; students only their own. Others get 404.
fn ensure_visible(q: &question::Model, kind: CourseUserKind, caller: i32) -> Result<(), AppError> {
    if kind.is_staff() || q.asked_by_id == caller {
        Ok(())
    } else {
        Err(AppError::NotFound("Question not found".into()))
    }
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Questions",
    operation_id = "listQuestions",
    summary = "List questions in a queue",
    description = "Staff see every question in the queue, students only their own. Ordered by ask time.",
    params(
        ("id" = i32, Path, description = "Course ID"),
        ("queue_id" = i32, Path, description = "Queue ID"),
        QuestionListQuery,
    ),
    responses(
        (status = 200, description = "List of questions", body = Vec<QuestionResponse>),
        (status = 400, description = "Invalid status filter (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Course or queue not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(course_id, queue_id))]
pub async fn list_questions(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((course_id, queue_id)): Path<(i32, i32)>,
    AppQuery(query): AppQuery<QuestionListQuery>,
) -> Result<Json<Vec<QuestionResponse>>, AppError> {
    let kind = require_member(&state.db, course_id, &auth_user).await?;
    find_queue_in_course(&state.db, course_id, queue_id).await?;

    let mut select = question::Entity::find()
        .filter(question::Column::QueueId.eq(queue_id))
        .order_by_asc(question::Column::TimeAsked)
        .order_by_asc(question::Column::Id);
    if !kind.is_staff() {
        select = select.filter(question::Column::AskedById.eq(auth_user.user_id));
    }
    if let Some(status) = query.status {
        select = select.filter(status_condition(status));
    }

    let items = select
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
    tag = "Questions",
    operation_id = "createQuestion",
    summary = "Ask a question",
    description = "Adds the caller's question to the queue. The caller must be an active student in the course with no other open question in any of its queues, the queue must be open, and every tag must belong to the course vocabulary.",
    params(
        ("id" = i32, Path, description = "Course ID"),
        ("queue_id" = i32, Path, description = "Queue ID"),
    ),
    request_body = CreateQuestionRequest,
    responses(
        (status = 201, description = "Question created", body = QuestionResponse),
        (status = 400, description = "Validation error, closed queue or open question exists (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Caller is not a student (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Course or queue not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(course_id, queue_id))]
pub async fn create_question(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((course_id, queue_id)): Path<(i32, i32)>,
    AppJson(payload): AppJson<CreateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_create_question(&payload)?;

    let txn = state.db.begin().await?;
    // Holds the tag vocabulary steady until the question is inserted.
    let course = find_course_for_share(&txn, course_id).await?;

    // Serializes concurrent asks by the same student.
    let membership = course_user::Entity::find_by_id((course_id, auth_user.user_id))
        .lock(LockType::Update)
        .one(&txn)
        .await?;
    match membership {
        Some(m) if !m.is_deactivated && m.kind == CourseUserKind::Student => {}
        Some(m) if !m.is_deactivated => return Err(AppError::PermissionDenied),
        _ => return Err(AppError::NotFound("Course not found".into())),
    }

    let target_queue = find_queue_in_course(&txn, course_id, queue_id).await?;
    if target_queue.archived || !target_queue.active {
        return Err(AppError::Validation("Queue is not open".into()));
    }

    let tags = normalize_tags(&payload.tags);
    ensure_tag_subset(&tags, &tags_from_json(&course.tags))?;

    let outstanding = question::Entity::find()
        .filter(question::Column::AskedById.eq(auth_user.user_id))
        .filter(question::Column::TimeAnswered.is_null())
        .filter(question::Column::TimeWithdrawn.is_null())
        .filter(question::Column::TimeRejected.is_null())
        .filter(
            question::Column::QueueId.in_subquery(
                SeaQuery::select()
                    .column(queue::Column::Id)
                    .from(queue::Entity)
                    .and_where(queue::Column::CourseId.eq(course_id))
                    .to_owned(),
            ),
        )
        .count(&txn)
        .await?;
    if outstanding > 0 {
        return Err(AppError::Validation(
            "You already have an open question in this course".into(),
        ));
    }

    let now = chrono::Utc::now();
    let model = question::ActiveModel {
        queue_id: Set(queue_id),
        asked_by_id: Set(auth_user.user_id),
        answered_by_id: Set(None),
        rejected_by_id: Set(None),
        text: Set(payload.text.trim().to_string()),
        tags: Set(tags_to_json(&tags)),
        time_asked: Set(now),
        time_started: Set(None),
        time_answered: Set(None),
        time_withdrawn: Set(None),
        time_rejected: Set(None),
        time_last_updated: Set(now),
        rejected_reason: Set(None),
        rejected_reason_other: Set(None),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    tracing::info!(question_id = model.id, "Question asked");
    Ok((StatusCode::CREATED, Json(QuestionResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/{question_id}",
    tag = "Questions",
    operation_id = "getQuestion",
    summary = "Get a question",
    description = "Visible to staff and to the asker.",
    params(
        ("id" = i32, Path, description = "Course ID"),
        ("queue_id" = i32, Path, description = "Queue ID"),
        ("question_id" = i32, Path, description = "Question ID"),
    ),
    responses(
        (status = 200, description = "Question details", body = QuestionResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Question not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(course_id, queue_id, question_id))]
pub async fn get_question(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((course_id, queue_id, question_id)): Path<(i32, i32, i32)>,
) -> Result<Json<QuestionResponse>, AppError> {
    let kind = require_member(&state.db, course_id, &auth_user).await?;
    let q = find_question(&state.db, course_id, queue_id, question_id).await?;
    ensure_visible(&q, kind, auth_user.user_id)?;
    Ok(Json(q.into()))
}

#[utoipa::path(
    post,
    path = "/{question_id}/withdraw",
    tag = "Questions",
    operation_id = "withdrawQuestion",
    summary = "Withdraw a waiting question",
    description = "Only the asker may withdraw, and only before the question is started or rejected.",
    params(
        ("id" = i32, Path, description = "Course ID"),
        ("queue_id" = i32, Path, description = "Queue ID"),
        ("question_id" = i32, Path, description = "Question ID"),
    ),
    responses(
        (status = 200, description = "Question withdrawn", body = QuestionResponse),
        (status = 400, description = "Question already started or resolved (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Caller is not the asker (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Question not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(course_id, queue_id, question_id))]
pub async fn withdraw_question(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((course_id, queue_id, question_id)): Path<(i32, i32, i32)>,
) -> Result<Json<QuestionResponse>, AppError> {
    require_member(&state.db, course_id, &auth_user).await?;

    let txn = state.db.begin().await?;
    let q = lock_question(&txn, course_id, queue_id, question_id).await?;
    ensure_withdrawable(&q, auth_user.user_id)?;

    let now = chrono::Utc::now();
    let mut active: question::ActiveModel = q.into();
    active.time_withdrawn = Set(Some(now));
    active.time_last_updated = Set(now);
    let model = active.update(&txn).await?;
    txn.commit().await?;

    Ok(Json(model.into()))
}

#[utoipa::path(
    post,
    path = "/{question_id}/reject",
    tag = "Questions",
    operation_id = "rejectQuestion",
    summary = "Reject a question",
    description = "Staff only. `reason_other` is required for reason `OTHER` and forbidden for every other reason.",
    params(
        ("id" = i32, Path, description = "Course ID"),
        ("queue_id" = i32, Path, description = "Queue ID"),
        ("question_id" = i32, Path, description = "Question ID"),
    ),
    request_body = RejectQuestionRequest,
    responses(
        (status = 200, description = "Question rejected", body = QuestionResponse),
        (status = 400, description = "Invalid reason or question already resolved (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Caller is not staff (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Question not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(course_id, queue_id, question_id))]
pub async fn reject_question(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((course_id, queue_id, question_id)): Path<(i32, i32, i32)>,
    AppJson(payload): AppJson<RejectQuestionRequest>,
) -> Result<Json<QuestionResponse>, AppError> {
    require_staff(&state.db, course_id, &auth_user).await?;
    let other = validate_rejection(payload.reason, payload.reason_other.as_deref())?;

    let txn = state.db.begin().await?;
    let q = lock_question(&txn, course_id, queue_id, question_id).await?;
    ensure_rejectable(&q)?;

    let now = chrono::Utc::now();
    let mut active: question::ActiveModel = q.into();
    active.rejected_by_id = Set(Some(auth_user.user_id));
    active.rejected_reason = Set(Some(payload.reason));
    active.rejected_reason_other = Set(other);
    active.time_rejected = Set(Some(now));
    active.time_last_updated = Set(now);
    let model = active.update(&txn).await?;
    txn.commit().await?;

    Ok(Json(model.into()))
}

#[utoipa::path(
    post,
    path = "/{question_id}/start",
    tag = "Questions",
    operation_id = "startQuestion",
    summary = "Start answering a question",
    description = "Staff only. Records the caller as the answerer. A withdrawn question cannot be started.",
    params(
        ("id" = i32, Path, description = "Course ID"),
        ("queue_id" = i32, Path, description = "Queue ID"),
        ("question_id" = i32, Path, description = "Question ID"),
    ),
    responses(
        (status = 200, description = "Question started", body = QuestionResponse),
        (status = 400, description = "Question withdrawn or resolved (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Caller is not staff (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Question not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(course_id, queue_id, question_id))]
pub async fn start_question(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((course_id, queue_id, question_id)): Path<(i32, i32, i32)>,
) -> Result<Json<QuestionResponse>, AppError> {
    require_staff(&state.db, course_id, &auth_user).await?;

    let txn = state.db.begin().await?;
    let q = lock_question(&txn, course_id, queue_id, question_id).await?;
    ensure_startable(&q)?;

    let now = chrono::Utc::now();
    let mut active: question::ActiveModel = q.into();
    active.time_started = Set(Some(now));
    active.answered_by_id = Set(Some(auth_user.user_id));
    active.time_last_updated = Set(now);
    let model = active.update(&txn).await?;
    txn.commit().await?;

    Ok(Json(model.into()))
}

#[utoipa::path(
    post,
    path = "/{question_id}/undo-start",
    tag = "Questions",
    operation_id = "undoStartQuestion",
    summary = "Return an active question to the queue",
    description = "Staff only. Clears the start time and answerer.",
    params(
        ("id" = i32, Path, description = "Course ID"),
        ("queue_id" = i32, Path, description = "Queue ID"),
        ("question_id" = i32, Path, description = "Question ID"),
    ),
    responses(
        (status = 200, description = "Question returned to the queue", body = QuestionResponse),
        (status = 400, description = "Question not active (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Caller is not staff (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Question not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(course_id, queue_id, question_id))]
pub async fn undo_start_question(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((course_id, queue_id, question_id)): Path<(i32, i32, i32)>,
) -> Result<Json<QuestionResponse>, AppError> {
    require_staff(&state.db, course_id, &auth_user).await?;

    let txn = state.db.begin().await?;
    let q = lock_question(&txn, course_id, queue_id, question_id).await?;
    ensure_unstartable(&q)?;

    let mut active: question::ActiveModel = q.into();
    active.time_started = Set(None);
    active.answered_by_id = Set(None);
    active.time_last_updated = Set(chrono::Utc::now());
    let model = active.update(&txn).await?;
    txn.commit().await?;

    Ok(Json(model.into()))
}

#[utoipa::path(
    post,
    path = "/{question_id}/finish",
    tag = "Questions",
    operation_id = "finishQuestion",
    summary = "Mark a question as answered",
    description = "Only the staff member recorded as the answerer may finish the question.",
    params(
        ("id" = i32, Path, description = "Course ID"),
        ("queue_id" = i32, Path, description = "Queue ID"),
        ("question_id" = i32, Path, description = "Question ID"),
    ),
    responses(
        (status = 200, description = "Question answered", body = QuestionResponse),
        (status = 400, description = "Question not active (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Caller is not the answerer (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Question not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(course_id, queue_id, question_id))]
pub async fn finish_question(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((course_id, queue_id, question_id)): Path<(i32, i32, i32)>,
) -> Result<Json<QuestionResponse>, AppError> {
    require_member(&state.db, course_id, &auth_user).await?;

    let txn = state.db.begin().await?;
    let q = lock_question(&txn, course_id, queue_id, question_id).await?;
    ensure_finisher(&q, auth_user.user_id)?;

    let now = chrono::Utc::now();
    let mut active: question::ActiveModel = q.into();
    active.time_answered = Set(Some(now));
    active.time_last_updated = Set(now);
    let model = active.update(&txn).await?;
    txn.commit().await?;

    Ok(Json(model.into()))
}

#[utoipa::path(
    get,
    path = "/{question_id}/position",
    tag = "Questions",
    operation_id = "getQuestionPosition",
    summary = "Get a question's place in line",
    description = "1-based position among waiting questions ordered by ask time, or -1 once the question is no longer waiting. Visible to staff and to the asker.",
    params(
        ("id" = i32, Path, description = "Course ID"),
        ("queue_id" = i32, Path, description = "Queue ID"),
        ("question_id" = i32, Path, description = "Question ID"),
    ),
    responses(
        (status = 200, description = "Queue position", body = QuestionPositionResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Question not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(course_id, queue_id, question_id))]
pub async fn question_position(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((course_id, queue_id, question_id)): Path<(i32, i32, i32)>,
) -> Result<Json<QuestionPositionResponse>, AppError> {
    let kind = require_member(&state.db, course_id, &auth_user).await?;
    let q = find_question(&state.db, course_id, queue_id, question_id).await?;
    ensure_visible(&q, kind, auth_user.user_id)?;

    if q.status() != QuestionStatus::Asked {
        return Ok(Json(QuestionPositionResponse { position: -1 }));
    }

    let ahead = question::Entity::find()
        .filter(question::Column::QueueId.eq(queue_id))
        .filter(status_condition(QuestionStatus::Asked))
        .filter(
            Condition::any()
                .add(question::Column::TimeAsked.lt(q.time_asked))
                .add(
                    Condition::all()
                        .add(question::Column::TimeAsked.eq(q.time_asked))
                        .add(question::Column::Id.lt(q.id)),
                ),
        )
        .count(&state.db)
        .await?;

    Ok(Json(QuestionPositionResponse {
        position: ahead as i64 + 1,
    }))
}

#[utoipa::path(
    get,
    path = "/last",
    tag = "Questions",
    operation_id = "listLastQuestions",
    summary = "List the caller's recently resolved questions",
    description = "Answered, withdrawn or rejected questions the caller asked in this queue, newest first, at most 10.",
    params(
        ("id" = i32, Path, description = "Course ID"),
        ("queue_id" = i32, Path, description = "Queue ID"),
    ),
    responses(
        (status = 200, description = "Recent questions", body = Vec<QuestionResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Course or queue not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(course_id, queue_id))]
pub async fn last_questions(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((course_id, queue_id)): Path<(i32, i32)>,
) -> Result<Json<Vec<QuestionResponse>>, AppError> {
    require_member(&state.db, course_id, &auth_user).await?;
    find_queue_in_course(&state.db, course_id, queue_id).await?;

    let items = question::Entity::find()
        .filter(question::Column::QueueId.eq(queue_id))
        .filter(question::Column::AskedById.eq(auth_user.user_id))
        .filter(
            Condition::any()
                .add(question::Column::TimeAnswered.is_not_null())
                .add(question::Column::TimeWithdrawn.is_not_null())
                .add(question::Column::TimeRejected.is_not_null()),
        )
        .order_by_desc(question::Column::TimeAsked)
        .order_by_desc(question::Column::Id)
        .limit(LAST_QUESTIONS_LIMIT)
        .all(&state.db)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    Ok(Json(items))
}
