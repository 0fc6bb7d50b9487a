use common::CourseUserKind;
use sea_orm::sea_query::{LockType, OnConflict};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseTransaction, DbErr, EntityTrait, QueryFilter,
    QuerySelect, Set,
};

use crate::entity::{course, course_user, membership_invite, queue};
use crate::error::AppError;
use crate::extractors::auth::AuthUser;

/// Global permission that grants leadership rights in every course.
pub const MANAGE_ANY_COURSE: &str = "course:manage_any";

/// Look up a course by ID, returning 404 if not found.
pub async fn find_course<C: ConnectionTrait>(db: &C, id: i32) -> Result<course::Model, AppError> {
    course::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Course not found".into()))
}

/// Look up and row-lock a course inside a transaction.
pub async fn find_course_for_update(
    txn: &DatabaseTransaction,
    id: i32,
) -> Result<course::Model, AppError> {
    course::Entity::find_by_id(id)
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Course not found".into()))
}

/// Look up a course under a shared row lock, blocking concurrent updates of
/// its settings until the transaction ends.
pub async fn find_course_for_share(
    txn: &DatabaseTransaction,
    id: i32,
) -> Result<course::Model, AppError> {
    course::Entity::find_by_id(id)
        .lock(LockType::Share)
        .one(txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Course not found".into()))
}

/// Effective role of the caller in a course.
///
/// Deactivated memberships count as no membership. Holders of
/// `course:manage_any` act as professors in courses they do not belong to.
pub async fn course_role<C: ConnectionTrait>(
    db: &C,
    course_id: i32,
    auth_user: &AuthUser,
) -> Result<Option<CourseUserKind>, AppError> {
    let membership = course_user::Entity::find_by_id((course_id, auth_user.user_id))
        .one(db)
        .await?;
    Ok(match membership {
        Some(m) if !m.is_deactivated => Some(m.kind),
        _ if auth_user.has_permission(MANAGE_ANY_COURSE) => Some(CourseUserKind::Professor),
        _ => None,
    })
}

/// Require any active membership. Non-members get 404 to prevent enumeration.
pub async fn require_member<C: ConnectionTrait>(
    db: &C,
    course_id: i32,
    auth_user: &AuthUser,
) -> Result<CourseUserKind, AppError> {
    course_role(db, course_id, auth_user)
        .await?
        .ok_or_else(|| AppError::NotFound("Course not found".into()))
}

/// Require a staff role (TA or above).
pub async fn require_staff<C: ConnectionTrait>(
    db: &C,
    course_id: i32,
    auth_user: &AuthUser,
) -> Result<CourseUserKind, AppError> {
    let kind = require_member(db, course_id, auth_user).await?;
    if !kind.is_staff() {
        return Err(AppError::PermissionDenied);
    }
    Ok(kind)
}

/// Require a leadership role (head TA or professor).
pub async fn require_leadership<C: ConnectionTrait>(
    db: &C,
    course_id: i32,
    auth_user: &AuthUser,
) -> Result<CourseUserKind, AppError> {
    let kind = require_member(db, course_id, auth_user).await?;
    if !kind.is_leadership() {
        return Err(AppError::PermissionDenied);
    }
    Ok(kind)
}

/// Look up a queue that must belong to the given course.
pub async fn find_queue_in_course<C: ConnectionTrait>(
    db: &C,
    course_id: i32,
    queue_id: i32,
) -> Result<queue::Model, AppError> {
    queue::Entity::find_by_id(queue_id)
        .one(db)
        .await?
        .filter(|q| q.course_id == course_id)
        .ok_or_else(|| AppError::NotFound("Queue not found".into()))
}

/// Turn every pending invite for `email` into a membership of `user_id`.
///
/// Existing memberships are left untouched. Returns the affected course IDs.
pub async fn accept_invites<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    email: &str,
) -> Result<Vec<i32>, AppError> {
    let invites = membership_invite::Entity::find()
        .filter(membership_invite::Column::Email.eq(email))
        .all(db)
        .await?;
    if invites.is_empty() {
        return Ok(Vec::new());
    }

    let now = chrono::Utc::now();
    let mut course_ids = Vec::with_capacity(invites.len());
    for invite in &invites {
        let membership = course_user::ActiveModel {
            course_id: Set(invite.course_id),
            user_id: Set(user_id),
            kind: Set(invite.kind),
            is_deactivated: Set(false),
            joined_at: Set(now),
        };
        let result = course_user::Entity::insert(membership)
            .on_conflict(
                OnConflict::columns([course_user::Column::CourseId, course_user::Column::UserId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(db)
            .await;
        match result {
            Ok(_) | Err(DbErr::RecordNotInserted) => course_ids.push(invite.course_id),
            Err(e) => return Err(e.into()),
        }
    }

    membership_invite::Entity::delete_many()
        .filter(membership_invite::Column::Id.is_in(invites.iter().map(|i| i.id)))
        .exec(db)
        .await?;

    tracing::info!(user_id, accepted = course_ids.len(), "Accepted course invites");
    Ok(course_ids)
}
