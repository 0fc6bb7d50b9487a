use common::CourseUserKind;
use serde::{Deserialize, Serialize};

use super::shared::{double_option, validate_email, validate_text_field};
use crate::error::AppError;

/// Request body for user registration.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct RegisterRequest {
    /// Unique username (1-32 chars, alphanumeric and underscores).
    #[schema(example = "alice_wonder")]
    pub username: String,
    /// Password (8-128 characters).
    #[schema(example = "s3cure_P@ss!")]
    pub password: String,
    #[schema(example = "Alice Wonderland")]
    pub full_name: Option<String>,
    #[schema(example = "Alice")]
    pub preferred_name: Option<String>,
    /// Pending course invites for this address are accepted on registration.
    #[schema(example = "alice@school.edu")]
    pub email: Option<String>,
}

pub fn validate_register_request(payload: &RegisterRequest) -> Result<(), AppError> {
    let username = payload.username.trim();
    if username.is_empty() || username.chars().count() > 32 {
        return Err(AppError::Validation(
            "Username must be 1-32 characters".into(),
        ));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(AppError::Validation(
            "Username must contain only letters, digits, and underscores".into(),
        ));
    }
    if payload.password.len() < 8 || payload.password.len() > 128 {
        return Err(AppError::Validation(
            "Password must be 8-128 characters".into(),
        ));
    }
    if let Some(ref name) = payload.full_name {
        validate_text_field("Full name", name, 128)?;
    }
    if let Some(ref name) = payload.preferred_name {
        validate_text_field("Preferred name", name, 64)?;
    }
    if let Some(ref email) = payload.email {
        validate_email(email)?;
    }
    Ok(())
}

/// Request body for user login.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    #[schema(example = "alice_wonder")]
    pub username: String,
    #[schema(example = "s3cure_P@ss!")]
    pub password: String,
}

pub fn validate_login_request(payload: &LoginRequest) -> Result<(), AppError> {
    if payload.username.trim().is_empty() {
        return Err(AppError::Validation("Username must not be empty".into()));
    }
    if payload.password.is_empty() {
        return Err(AppError::Validation("Password must not be empty".into()));
    }
    Ok(())
}

/// Profile update for the current user. Absent fields are left unchanged.
#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateMeRequest {
    pub full_name: Option<String>,
    pub preferred_name: Option<String>,
    /// `null` clears the address.
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub email: Option<Option<String>>,
}

pub fn validate_update_me(payload: &UpdateMeRequest) -> Result<(), AppError> {
    if let Some(ref name) = payload.full_name {
        validate_text_field("Full name", name, 128)?;
    }
    if let Some(ref name) = payload.preferred_name {
        validate_text_field("Preferred name", name, 64)?;
    }
    if let Some(Some(ref email)) = payload.email {
        validate_email(email)?;
    }
    Ok(())
}

/// Successful registration response.
#[derive(Serialize, utoipa::ToSchema)]
pub struct RegisterResponse {
    #[schema(example = 42)]
    pub id: i32,
    #[schema(example = "alice_wonder")]
    pub username: String,
    /// Courses joined through pending invites.
    pub accepted_invites: Vec<i32>,
}

/// Successful login response.
#[derive(Serialize, utoipa::ToSchema)]
pub struct LoginResponse {
    /// JWT bearer token.
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub token: String,
    #[schema(example = "alice_wonder")]
    pub username: String,
    #[schema(example = "user")]
    pub role: String,
    #[schema(example = json!(["course:create"]))]
    pub permissions: Vec<String>,
}

/// One course membership of the current user.
#[derive(Serialize, utoipa::ToSchema)]
pub struct MembershipSummary {
    pub course_id: i32,
    pub course_code: String,
    pub department: String,
    pub kind: CourseUserKind,
    pub is_deactivated: bool,
}

/// Current authenticated user's profile.
#[derive(Serialize, utoipa::ToSchema)]
pub struct MeResponse {
    #[schema(example = 42)]
    pub id: i32,
    #[schema(example = "alice_wonder")]
    pub username: String,
    pub full_name: String,
    pub preferred_name: String,
    pub email: Option<String>,
    #[schema(example = "user")]
    pub role: String,
    pub permissions: Vec<String>,
    pub memberships: Vec<MembershipSummary>,
}
