use chrono::{DateTime, Utc};
use common::CourseUserKind;
use serde::{Deserialize, Serialize};

use super::shared::validate_email;
use crate::error::AppError;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct AddMemberRequest {
    pub user_id: i32,
    pub kind: CourseUserKind,
}

#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateMemberRequest {
    pub kind: Option<CourseUserKind>,
    pub is_deactivated: Option<bool>,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateInviteRequest {
    #[schema(example = "bob@school.edu")]
    pub email: String,
    pub kind: CourseUserKind,
}

pub fn validate_create_invite(req: &CreateInviteRequest) -> Result<(), AppError> {
    validate_email(&req.email)
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct MemberResponse {
    pub course_id: i32,
    pub user_id: i32,
    pub username: String,
    pub full_name: String,
    pub kind: CourseUserKind,
    pub is_deactivated: bool,
    pub joined_at: DateTime<Utc>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct InviteResponse {
    pub id: i32,
    pub course_id: i32,
    pub email: String,
    pub kind: CourseUserKind,
    pub created_at: DateTime<Utc>,
}

impl From<crate::entity::membership_invite::Model> for InviteResponse {
    fn from(m: crate::entity::membership_invite::Model) -> Self {
        Self {
            id: m.id,
            course_id: m.course_id,
            email: m.email,
            kind: m.kind,
            created_at: m.created_at,
        }
    }
}

/// Result of inviting an email address.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum InviteOutcome {
    /// The address had no account; an invite was stored.
    Invited(InviteResponse),
    /// The address belongs to a registered user, who was added directly.
    Added(MemberResponse),
}

/// Lowercased, trimmed email used for invite matching.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
