use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use common::CourseUserKind;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{course_user, membership_invite, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::request::AppJson;
use crate::models::member::*;
use crate::state::AppState;
use crate::utils::course::{find_course_for_update, require_leadership, require_member};

fn member_response(cu: course_user::Model, u: &user::Model) -> MemberResponse {
    MemberResponse {
        course_id: cu.course_id,
        user_id: cu.user_id,
        username: u.username.clone(),
        full_name: u.full_name.clone(),
        kind: cu.kind,
        is_deactivated: cu.is_deactivated,
        joined_at: cu.joined_at,
    }
}

/// Active leadership members of a course other than `user_id`.
async fn other_leaders<C: ConnectionTrait>(
    db: &C,
    course_id: i32,
    user_id: i32,
) -> Result<u64, AppError> {
    Ok(course_user::Entity::find()
        .filter(course_user::Column::CourseId.eq(course_id))
        .filter(course_user::Column::UserId.ne(user_id))
        .filter(course_user::Column::IsDeactivated.eq(false))
        .filter(course_user::Column::Kind.is_in(CourseUserKind::LEADERSHIP.iter().copied()))
        .count(db)
        .await?)
}

async fn find_membership<C: ConnectionTrait>(
    db: &C,
    course_id: i32,
    user_id: i32,
) -> Result<course_user::Model, AppError> {
    course_user::Entity::find_by_id((course_id, user_id))
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Member not found".into()))
}

async fn find_user<C: ConnectionTrait>(db: &C, user_id: i32) -> Result<user::Model, AppError> {
    user::Entity::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))
}

/// Head TAs may not grant, change or revoke the professor role.
fn ensure_may_touch_professor(
    caller: CourseUserKind,
    current: CourseUserKind,
    requested: Option<CourseUserKind>,
) -> Result<(), AppError> {
    let touches = current == CourseUserKind::Professor
        || requested == Some(CourseUserKind::Professor);
    if touches && caller != CourseUserKind::Professor {
        return Err(AppError::PermissionDenied);
    }
    Ok(())
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Members",
    operation_id = "listMembers",
    summary = "List course members",
    description = "Returns every membership of the course, ordered by role then join time. Visible to all members.",
    params(("id" = i32, Path, description = "Course ID")),
    responses(
        (status = 200, description = "List of members", body = Vec<MemberResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Course not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(course_id))]
pub async fn list_members(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(course_id): Path<i32>,
) -> Result<Json<Vec<MemberResponse>>, AppError> {
    require_member(&state.db, course_id, &auth_user).await?;

    let rows = course_user::Entity::find()
        .filter(course_user::Column::CourseId.eq(course_id))
        .find_also_related(user::Entity)
        .order_by_asc(course_user::Column::JoinedAt)
        .all(&state.db)
        .await?;

    let mut items: Vec<MemberResponse> = rows
        .into_iter()
        .filter_map(|(cu, u)| u.map(|u| member_response(cu, &u)))
        .collect();
    items.sort_by_key(|m| std::cmp::Reverse(m.kind.is_leadership() as u8 + m.kind.is_staff() as u8));

    Ok(Json(items))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Members",
    operation_id = "addMember",
    summary = "Add a registered user to the course",
    description = "Creates a membership with the given role. Requires a leadership role; only professors may add professors.",
    params(("id" = i32, Path, description = "Course ID")),
    request_body = AddMemberRequest,
    responses(
        (status = 201, description = "Member added", body = MemberResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Course or user not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Already a member (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(course_id, user_id = payload.user_id))]
pub async fn add_member(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(course_id): Path<i32>,
    AppJson(payload): AppJson<AddMemberRequest>,
) -> Result<impl IntoResponse, AppError> {
    let txn = state.db.begin().await?;
    find_course_for_update(&txn, course_id).await?;
    let caller = require_leadership(&txn, course_id, &auth_user).await?;
    ensure_may_touch_professor(caller, CourseUserKind::Student, Some(payload.kind))?;

    let target = find_user(&txn, payload.user_id).await?;
    let membership = course_user::ActiveModel {
        course_id: Set(course_id),
        user_id: Set(target.id),
        kind: Set(payload.kind),
        is_deactivated: Set(false),
        joined_at: Set(chrono::Utc::now()),
    }
    .insert(&txn)
    .await
    .map_err(|e| AppError::conflict_on_unique(e, "User is already a member of this course"))?;

    txn.commit().await?;

    Ok((StatusCode::CREATED, Json(member_response(membership, &target))))
}

#[utoipa::path(
    patch,
    path = "/{user_id}",
    tag = "Members",
    operation_id = "updateMember",
    summary = "Change a member's role or deactivation flag",
    description = "Requires a leadership role. Demoting or deactivating the last active leadership member is rejected with 409.",
    params(
        ("id" = i32, Path, description = "Course ID"),
        ("user_id" = i32, Path, description = "User ID"),
    ),
    request_body = UpdateMemberRequest,
    responses(
        (status = 200, description = "Member updated", body = MemberResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Member not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Last leadership member (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(course_id, user_id))]
pub async fn update_member(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((course_id, user_id)): Path<(i32, i32)>,
    AppJson(payload): AppJson<UpdateMemberRequest>,
) -> Result<Json<MemberResponse>, AppError> {
    let txn = state.db.begin().await?;
    find_course_for_update(&txn, course_id).await?;
    let caller = require_leadership(&txn, course_id, &auth_user).await?;
    let existing = find_membership(&txn, course_id, user_id).await?;
    let target = find_user(&txn, user_id).await?;

    if payload == UpdateMemberRequest::default() {
        return Ok(Json(member_response(existing, &target)));
    }
    ensure_may_touch_professor(caller, existing.kind, payload.kind)?;

    let new_kind = payload.kind.unwrap_or(existing.kind);
    let new_deactivated = payload.is_deactivated.unwrap_or(existing.is_deactivated);
    let loses_leadership = existing.kind.is_leadership()
        && !existing.is_deactivated
        && (!new_kind.is_leadership() || new_deactivated);
    if loses_leadership && other_leaders(&txn, course_id, user_id).await? == 0 {
        return Err(AppError::Conflict(
            "A course must keep at least one active head TA or professor".into(),
        ));
    }

    let mut active: course_user::ActiveModel = existing.into();
    active.kind = Set(new_kind);
    active.is_deactivated = Set(new_deactivated);
    let model = active.update(&txn).await?;
    txn.commit().await?;

    Ok(Json(member_response(model, &target)))
}

#[utoipa::path(
    delete,
    path = "/{user_id}",
    tag = "Members",
    operation_id = "removeMember",
    summary = "Remove a member from the course",
    description = "Leadership may remove anyone they could demote; any member may remove themselves. Removing the last active leadership member is rejected with 409.",
    params(
        ("id" = i32, Path, description = "Course ID"),
        ("user_id" = i32, Path, description = "User ID"),
    ),
    responses(
        (status = 204, description = "Member removed"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Member not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Last leadership member (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(course_id, user_id))]
pub async fn remove_member(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((course_id, user_id)): Path<(i32, i32)>,
) -> Result<impl IntoResponse, AppError> {
    let txn = state.db.begin().await?;
    find_course_for_update(&txn, course_id).await?;
    let existing = if user_id == auth_user.user_id {
        find_membership(&txn, course_id, user_id).await?
    } else {
        let caller = require_leadership(&txn, course_id, &auth_user).await?;
        let existing = find_membership(&txn, course_id, user_id).await?;
        ensure_may_touch_professor(caller, existing.kind, None)?;
        existing
    };

    if existing.kind.is_leadership()
        && !existing.is_deactivated
        && other_leaders(&txn, course_id, user_id).await? == 0
    {
        return Err(AppError::Conflict(
            "A course must keep at least one active head TA or professor".into(),
        ));
    }

    let active: course_user::ActiveModel = existing.into();
    active.delete(&txn).await?;
    txn.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Invites",
    operation_id = "listInvites",
    summary = "List pending invites",
    description = "Returns invites for addresses that have not registered yet. Requires a leadership role.",
    params(("id" = i32, Path, description = "Course ID")),
    responses(
        (status = 200, description = "List of invites", body = Vec<InviteResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Course not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(course_id))]
pub async fn list_invites(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(course_id): Path<i32>,
) -> Result<Json<Vec<InviteResponse>>, AppError> {
    require_leadership(&state.db, course_id, &auth_user).await?;

    let items = membership_invite::Entity::find()
        .filter(membership_invite::Column::CourseId.eq(course_id))
        .order_by_asc(membership_invite::Column::CreatedAt)
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
    tag = "Invites",
    operation_id = "createInvite",
    summary = "Invite an email address to the course",
    description = "If the address belongs to a registered user they are added immediately (`outcome = added`); otherwise an invite is stored and accepted when the address registers (`outcome = invited`). Requires a leadership role.",
    params(("id" = i32, Path, description = "Course ID")),
    request_body = CreateInviteRequest,
    responses(
        (status = 201, description = "Invite stored or member added", body = InviteOutcome),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Course not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Already invited or already a member (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(course_id))]
pub async fn create_invite(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(course_id): Path<i32>,
    AppJson(payload): AppJson<CreateInviteRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_create_invite(&payload)?;
    let email = normalize_email(&payload.email);

    let txn = state.db.begin().await?;
    find_course_for_update(&txn, course_id).await?;
    let caller = require_leadership(&txn, course_id, &auth_user).await?;
    ensure_may_touch_professor(caller, CourseUserKind::Student, Some(payload.kind))?;

    let registered = user::Entity::find()
        .filter(user::Column::Email.eq(&email))
        .one(&txn)
        .await?;

    let outcome = match registered {
        Some(target) => {
            let membership = course_user::ActiveModel {
                course_id: Set(course_id),
                user_id: Set(target.id),
                kind: Set(payload.kind),
                is_deactivated: Set(false),
                joined_at: Set(chrono::Utc::now()),
            }
            .insert(&txn)
            .await
            .map_err(|e| {
                AppError::conflict_on_unique(e, "User is already a member of this course")
            })?;
            InviteOutcome::Added(member_response(membership, &target))
        }
        None => {
            let invite = membership_invite::ActiveModel {
                course_id: Set(course_id),
                email: Set(email),
                kind: Set(payload.kind),
                created_at: Set(chrono::Utc::now()),
                ..Default::default()
            }
            .insert(&txn)
            .await
            .map_err(|e| AppError::conflict_on_unique(e, "Email has already been invited"))?;
            InviteOutcome::Invited(invite.into())
        }
    };

    txn.commit().await?;

    Ok((StatusCode::CREATED, Json(outcome)))
}

#[utoipa::path(
    delete,
    path = "/{invite_id}",
    tag = "Invites",
    operation_id = "deleteInvite",
    summary = "Revoke a pending invite",
    description = "Requires a leadership role.",
    params(
        ("id" = i32, Path, description = "Course ID"),
        ("invite_id" = i32, Path, description = "Invite ID"),
    ),
    responses(
        (status = 204, description = "Invite deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Invite not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(course_id, invite_id))]
pub async fn delete_invite(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((course_id, invite_id)): Path<(i32, i32)>,
) -> Result<impl IntoResponse, AppError> {
    require_leadership(&state.db, course_id, &auth_user).await?;

    let result = membership_invite::Entity::delete_many()
        .filter(membership_invite::Column::Id.eq(invite_id))
        .filter(membership_invite::Column::CourseId.eq(course_id))
        .exec(&state.db)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Invite not found".into()));
    }

    Ok(StatusCode::NO_CONTENT)
}
