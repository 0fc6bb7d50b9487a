use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use common::CourseUserKind;
use sea_orm::sea_query::Query as SeaQuery;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{course, course_user, question, queue, semester};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::request::{AppJson, AppQuery};
use crate::models::course::*;
use crate::models::shared::{ensure_tag_subset, normalize_tags, tags_from_json, tags_to_json};
use crate::state::AppState;
use crate::utils::course::{find_course, find_course_for_update, require_leadership, require_member};

async fn ensure_semester_exists<C: ConnectionTrait>(db: &C, id: i32) -> Result<(), AppError> {
    if semester::Entity::find_by_id(id).one(db).await?.is_none() {
        return Err(AppError::Validation(format!("Semester {id} does not exist")));
    }
    Ok(())
}

/// Reject a vocabulary change that drops a tag still used by a queue or by
/// any question asked in the course.
async fn ensure_tags_unused(
    txn: &DatabaseTransaction,
    course_id: i32,
    current: &[String],
    vocabulary: &[String],
) -> Result<(), AppError> {
    let removed: Vec<&String> = current.iter().filter(|t| !vocabulary.contains(t)).collect();
    if removed.is_empty() {
        return Ok(());
    }

    let queues = queue::Entity::find()
        .filter(queue::Column::CourseId.eq(course_id))
        .all(txn)
        .await?;
    for q in &queues {
        ensure_tag_subset(&tags_from_json(&q.tags), vocabulary).map_err(|_| {
            AppError::Validation(format!(
                "Queue '{}' still uses a tag that would be removed",
                q.name
            ))
        })?;
    }

    let question_tags: Vec<serde_json::Value> = question::Entity::find()
        .select_only()
        .column(question::Column::Tags)
        .filter(
            question::Column::QueueId.in_subquery(
                SeaQuery::select()
                    .column(queue::Column::Id)
                    .from(queue::Entity)
                    .and_where(queue::Column::CourseId.eq(course_id))
                    .to_owned(),
            ),
        )
        .into_tuple()
        .all(txn)
        .await?;
    for tags in &question_tags {
        let used = tags_from_json(tags);
        if let Some(tag) = removed.iter().copied().find(|t| used.contains(t)) {
            return Err(AppError::Validation(format!(
                "Tag '{tag}' is still used by questions in this course"
            )));
        }
    }

    Ok(())
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Courses",
    operation_id = "createCourse",
    summary = "Create a course",
    description = "Creates a course and enrolls the caller as its professor. Requires `course:create` permission.",
    request_body = CreateCourseRequest,
    responses(
        (status = 201, description = "Course created", body = CourseResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(course_code = %payload.course_code))]
pub async fn create_course(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateCourseRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission("course:create")?;
    validate_create_course(&payload)?;

    let txn = state.db.begin().await?;
    ensure_semester_exists(&txn, payload.semester_id).await?;

    let now = chrono::Utc::now();
    let model = course::ActiveModel {
        course_code: Set(payload.course_code.trim().to_string()),
        department: Set(payload.department.trim().to_string()),
        course_title: Set(payload.course_title.trim().to_string()),
        description: Set(payload.description),
        semester_id: Set(payload.semester_id),
        archived: Set(false),
        invite_only: Set(payload.invite_only),
        tags: Set(tags_to_json(&normalize_tags(&payload.tags))),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    course_user::ActiveModel {
        course_id: Set(model.id),
        user_id: Set(auth_user.user_id),
        kind: Set(CourseUserKind::Professor),
        is_deactivated: Set(false),
        joined_at: Set(now),
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    tracing::info!(course_id = model.id, "Course created");
    Ok((
        StatusCode::CREATED,
        Json(CourseResponse::new(model, Some(CourseUserKind::Professor))),
    ))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Courses",
    operation_id = "listCourses",
    summary = "List the caller's courses",
    description = "Returns every course the caller is an active member of, with the caller's role.",
    params(CourseListQuery),
    responses(
        (status = 200, description = "List of courses", body = Vec<CourseResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query))]
pub async fn list_courses(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<CourseListQuery>,
) -> Result<Json<Vec<CourseResponse>>, AppError> {
    let mut select = course_user::Entity::find()
        .filter(course_user::Column::UserId.eq(auth_user.user_id))
        .filter(course_user::Column::IsDeactivated.eq(false))
        .find_also_related(course::Entity)
        .order_by_asc(course_user::Column::CourseId);
    if !query.include_archived.unwrap_or(false) {
        select = select.filter(course::Column::Archived.eq(false));
    }

    let items = select
        .all(&state.db)
        .await?
        .into_iter()
        .filter_map(|(cu, c)| c.map(|c| CourseResponse::new(c, Some(cu.kind))))
        .collect();

    Ok(Json(items))
}

#[utoipa::path(
    get,
    path = "/joinable",
    tag = "Courses",
    operation_id = "listJoinableCourses",
    summary = "List courses open for self-enrollment",
    description = "Returns non-archived, non invite-only courses the caller is not a member of.",
    responses(
        (status = 200, description = "List of courses", body = Vec<CourseResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn list_joinable_courses(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<CourseResponse>>, AppError> {
    let items = course::Entity::find()
        .filter(course::Column::Archived.eq(false))
        .filter(course::Column::InviteOnly.eq(false))
        .filter(
            course::Column::Id.not_in_subquery(
                SeaQuery::select()
                    .column(course_user::Column::CourseId)
                    .from(course_user::Entity)
                    .and_where(course_user::Column::UserId.eq(auth_user.user_id))
                    .to_owned(),
            ),
        )
        .order_by_asc(course::Column::Department)
        .order_by_asc(course::Column::CourseCode)
        .all(&state.db)
        .await?
        .into_iter()
        .map(|c| CourseResponse::new(c, None))
        .collect();

    Ok(Json(items))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Courses",
    operation_id = "getCourse",
    summary = "Get a course",
    description = "Returns a course the caller belongs to. Non-members get 404.",
    params(("id" = i32, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Course details", body = CourseResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Course not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn get_course(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<CourseResponse>, AppError> {
    let model = find_course(&state.db, id).await?;
    let kind = require_member(&state.db, id, &auth_user).await?;
    Ok(Json(CourseResponse::new(model, Some(kind))))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Courses",
    operation_id = "updateCourse",
    summary = "Update a course",
    description = "Partially updates course settings. Requires a leadership role. Tags still used by a queue cannot be removed from the vocabulary.",
    params(("id" = i32, Path, description = "Course ID")),
    request_body = UpdateCourseRequest,
    responses(
        (status = 200, description = "Course updated", body = CourseResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Course not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id))]
pub async fn update_course(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateCourseRequest>,
) -> Result<Json<CourseResponse>, AppError> {
    validate_update_course(&payload)?;

    let txn = state.db.begin().await?;
    let existing = find_course_for_update(&txn, id).await?;
    let kind = require_leadership(&txn, id, &auth_user).await?;

    if payload == UpdateCourseRequest::default() {
        return Ok(Json(CourseResponse::new(existing, Some(kind))));
    }

    if let Some(semester_id) = payload.semester_id {
        ensure_semester_exists(&txn, semester_id).await?;
    }

    let vocabulary = match payload.tags {
        Some(ref tags) => {
            let vocabulary = normalize_tags(tags);
            ensure_tags_unused(&txn, id, &tags_from_json(&existing.tags), &vocabulary).await?;
            Some(vocabulary)
        }
        None => None,
    };

    let mut active: course::ActiveModel = existing.into();

    if let Some(vocabulary) = vocabulary {
        active.tags = Set(tags_to_json(&vocabulary));
    }
    if let Some(ref code) = payload.course_code {
        active.course_code = Set(code.trim().to_string());
    }
    if let Some(ref department) = payload.department {
        active.department = Set(department.trim().to_string());
    }
    if let Some(ref title) = payload.course_title {
        active.course_title = Set(title.trim().to_string());
    }
    if let Some(description) = payload.description {
        active.description = Set(description);
    }
    if let Some(semester_id) = payload.semester_id {
        active.semester_id = Set(semester_id);
    }
    if let Some(invite_only) = payload.invite_only {
        active.invite_only = Set(invite_only);
    }
    if let Some(archived) = payload.archived {
        active.archived = Set(archived);
    }
    active.updated_at = Set(chrono::Utc::now());

    let model = active.update(&txn).await?;
    txn.commit().await?;

    Ok(Json(CourseResponse::new(model, Some(kind))))
}

#[utoipa::path(
    post,
    path = "/{id}/join",
    tag = "Courses",
    operation_id = "joinCourse",
    summary = "Join a course as a student",
    description = "Self-enrolls the caller as a student. Invite-only and archived courses return 404 to prevent enumeration. Returns 409 if already a member.",
    params(("id" = i32, Path, description = "Course ID")),
    responses(
        (status = 201, description = "Joined course", body = CourseResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Course not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Already a member (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn join_course(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let txn = state.db.begin().await?;
    let model = find_course_for_update(&txn, id).await?;
    if model.invite_only || model.archived {
        return Err(AppError::NotFound("Course not found".into()));
    }

    course_user::ActiveModel {
        course_id: Set(id),
        user_id: Set(auth_user.user_id),
        kind: Set(CourseUserKind::Student),
        is_deactivated: Set(false),
        joined_at: Set(chrono::Utc::now()),
    }
    .insert(&txn)
    .await
    .map_err(|e| AppError::conflict_on_unique(e, "Already a member of this course"))?;

    txn.commit().await?;

    Ok((
        StatusCode::CREATED,
        Json(CourseResponse::new(model, Some(CourseUserKind::Student))),
    ))
}
