use std::collections::{HashMap, HashSet};

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use common::QuestionStatus;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{feedback_answer, feedback_question, question, queue};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::request::AppJson;
use crate::models::feedback::*;
use crate::models::shared::tags_to_json;
use crate::state::AppState;
use crate::utils::course::{find_course, require_leadership, require_member};

#[utoipa::path(
    get,
    path = "/",
    tag = "Feedback",
    operation_id = "listFeedbackQuestions",
    summary = "List a course's feedback questions",
    description = "Students only see active questions; staff see all of them.",
    params(("id" = i32, Path, description = "Course ID")),
    responses(
        (status = 200, description = "List of feedback questions", body = Vec<FeedbackQuestionResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Course not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(course_id))]
pub async fn list_feedback_questions(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(course_id): Path<i32>,
) -> Result<Json<Vec<FeedbackQuestionResponse>>, AppError> {
    let kind = require_member(&state.db, course_id, &auth_user).await?;

    let mut query = feedback_question::Entity::find()
        .filter(feedback_question::Column::CourseId.eq(course_id));
    if !kind.is_staff() {
        query = query.filter(feedback_question::Column::Active.eq(true));
    }

    let items = query
        .order_by_asc(feedback_question::Column::Id)
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
    tag = "Feedback",
    operation_id = "createFeedbackQuestion",
    summary = "Create a feedback question",
    description = "Radio button questions need at least two choices; slider questions need bounds. Requires a leadership role.",
    params(("id" = i32, Path, description = "Course ID")),
    request_body = CreateFeedbackQuestionRequest,
    responses(
        (status = 201, description = "Feedback question created", body = FeedbackQuestionResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Course not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(course_id))]
pub async fn create_feedback_question(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(course_id): Path<i32>,
    AppJson(payload): AppJson<CreateFeedbackQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_create_feedback_question(&payload)?;
    find_course(&state.db, course_id).await?;
    require_leadership(&state.db, course_id, &auth_user).await?;

    let choices: Vec<String> = payload
        .answer_choices
        .iter()
        .map(|c| c.trim().to_string())
        .collect();

    let model = feedback_question::ActiveModel {
        course_id: Set(course_id),
        question_text: Set(payload.question_text.trim().to_string()),
        kind: Set(payload.kind),
        answer_choices: Set(tags_to_json(&choices)),
        slider_min: Set(payload.slider_min),
        slider_max: Set(payload.slider_max),
        required: Set(payload.required),
        active: Set(true),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(FeedbackQuestionResponse::from(model))))
}

#[utoipa::path(
    post,
    path = "/answers",
    tag = "Feedback",
    operation_id = "submitFeedbackAnswers",
    summary = "Answer feedback questions about a finished question",
    description = "Only the asker of an answered question may submit feedback, once per feedback question. \
        Every required active feedback question must be answered.",
    params(("id" = i32, Path, description = "Course ID")),
    request_body = SubmitFeedbackRequest,
    responses(
        (status = 201, description = "Answers recorded", body = Vec<FeedbackAnswerResponse>),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the asker (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Course or question not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Feedback already given (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(course_id, question_id = payload.question_id))]
pub async fn submit_feedback_answers(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(course_id): Path<i32>,
    AppJson(payload): AppJson<SubmitFeedbackRequest>,
) -> Result<impl IntoResponse, AppError> {
    require_member(&state.db, course_id, &auth_user).await?;
    if payload.answers.is_empty() {
        return Err(AppError::Validation("At least one answer is required".into()));
    }

    let (asked, _) = question::Entity::find_by_id(payload.question_id)
        .find_also_related(queue::Entity)
        .one(&state.db)
        .await?
        .filter(|(_, q)| q.as_ref().is_some_and(|q| q.course_id == course_id))
        .ok_or_else(|| AppError::NotFound("Question not found".into()))?;
    if asked.asked_by_id != auth_user.user_id {
        return Err(AppError::PermissionDenied);
    }
    if asked.status() != QuestionStatus::Answered {
        return Err(AppError::Validation(
            "Feedback can only be given on answered questions".into(),
        ));
    }

    let prompts: HashMap<i32, feedback_question::Model> = feedback_question::Entity::find()
        .filter(feedback_question::Column::CourseId.eq(course_id))
        .filter(feedback_question::Column::Active.eq(true))
        .all(&state.db)
        .await?
        .into_iter()
        .map(|f| (f.id, f))
        .collect();

    let mut seen = HashSet::new();
    let mut rows = Vec::with_capacity(payload.answers.len());
    for input in &payload.answers {
        let prompt = prompts.get(&input.feedback_question_id).ok_or_else(|| {
            AppError::NotFound(format!(
                "Feedback question {} not found",
                input.feedback_question_id
            ))
        })?;
        if !seen.insert(prompt.id) {
            return Err(AppError::Validation(format!(
                "Feedback question {} answered twice",
                prompt.id
            )));
        }
        rows.push((prompt.id, validate_feedback_answer(prompt, &input.answer_text)?));
    }
    if let Some(missing) = prompts.values().find(|p| p.required && !seen.contains(&p.id)) {
        return Err(AppError::Validation(format!(
            "Feedback question {} is required",
            missing.id
        )));
    }

    let now = chrono::Utc::now();
    let txn = state.db.begin().await?;
    let mut saved = Vec::with_capacity(rows.len());
    for (feedback_question_id, answer_text) in rows {
        let model = feedback_answer::ActiveModel {
            feedback_question_id: Set(feedback_question_id),
            question_id: Set(asked.id),
            answer_text: Set(answer_text),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| AppError::conflict_on_unique(e, "Feedback was already submitted"))?;
        saved.push(FeedbackAnswerResponse::from(model));
    }
    txn.commit().await?;

    tracing::info!(count = saved.len(), "Feedback recorded");
    Ok((StatusCode::CREATED, Json(saved)))
}
