use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use sea_orm::*;
use tracing::instrument;

use crate::entity::{course, course_user, role, role_permission, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::request::AppJson;
use crate::models::auth::*;
use crate::models::member::normalize_email;
use crate::state::AppState;
use crate::utils::course::accept_invites;
use crate::utils::{hash, jwt};

async fn email_in_use<C: ConnectionTrait>(
    db: &C,
    email: &str,
    except_user: Option<i32>,
) -> Result<bool, AppError> {
    let mut select = user::Entity::find().filter(user::Column::Email.eq(email));
    if let Some(id) = except_user {
        select = select.filter(user::Column::Id.ne(id));
    }
    Ok(select.count(db).await? > 0)
}

#[utoipa::path(
    post,
    path = "/register",
    tag = "Auth",
    operation_id = "register",
    summary = "Register a new user account",
    description = "Creates a new account with the default `user` role. When an email is given, pending course invites for that address are converted into memberships in the same transaction.",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = RegisterResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 409, description = "Username taken (USERNAME_TAKEN) or email in use (CONFLICT)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(username = %payload.username))]
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_register_request(&payload)?;

    let username = payload.username.trim().to_string();
    let email = payload.email.as_deref().map(normalize_email);

    let hash = hash::hash_password(&payload.password)
        .map_err(|e| AppError::Internal(format!("Password hash error: {}", e)))?;

    let txn = state.db.begin().await?;

    if let Some(ref email) = email
        && email_in_use(&txn, email, None).await?
    {
        return Err(AppError::Conflict("Email is already in use".into()));
    }

    let new_user = user::ActiveModel {
        username: Set(username.clone()),
        password: Set(hash),
        role: Set(role::DEFAULT_ROLE.to_string()),
        full_name: Set(payload
            .full_name
            .as_deref()
            .map(str::trim)
            .unwrap_or(&username)
            .to_string()),
        preferred_name: Set(payload
            .preferred_name
            .as_deref()
            .map(str::trim)
            .unwrap_or(&username)
            .to_string()),
        email: Set(email.clone()),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };

    let user = new_user.insert(&txn).await.map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) if detail.contains("email") => {
            AppError::Conflict("Email is already in use".into())
        }
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            tracing::debug!("Registration race condition: unique constraint caught on insert");
            AppError::UsernameTaken
        }
        _ => AppError::from(e),
    })?;

    let accepted_invites = match email {
        Some(ref email) => accept_invites(&txn, user.id, email).await?,
        None => Vec::new(),
    };

    txn.commit().await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            id: user.id,
            username: user.username,
            accepted_invites,
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/login",
    tag = "Auth",
    operation_id = "login",
    summary = "Log in and obtain a JWT",
    description = "Verifies the password and returns a bearer token carrying the user's global role and permissions.",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Invalid credentials (INVALID_CREDENTIALS)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(username = %payload.username))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    validate_login_request(&payload)?;

    let username = payload.username.trim();

    let user = user::Entity::find()
        .filter(user::Column::Username.eq(username))
        .one(&state.db)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    let is_valid = hash::verify_password(&payload.password, &user.password)
        .map_err(|e| AppError::Internal(format!("Password verify error: {}", e)))?;

    if !is_valid {
        return Err(AppError::InvalidCredentials);
    }

    let permissions: Vec<String> = role_permission::Entity::find()
        .filter(role_permission::Column::Role.eq(&user.role))
        .all(&state.db)
        .await?
        .into_iter()
        .map(|rp| rp.permission)
        .collect();

    let token = jwt::sign(
        user.id,
        &user.username,
        &user.role,
        permissions.clone(),
        &state.config.auth.jwt_secret,
        state.config.auth.token_ttl_days,
    )
    .map_err(|e| AppError::Internal(format!("JWT sign error: {}", e)))?;

    Ok(Json(LoginResponse {
        token,
        username: user.username,
        role: user.role,
        permissions,
    }))
}

async fn build_me<C: ConnectionTrait>(
    db: &C,
    auth_user: &AuthUser,
    user: user::Model,
) -> Result<MeResponse, AppError> {
    let memberships = course_user::Entity::find()
        .filter(course_user::Column::UserId.eq(user.id))
        .find_also_related(course::Entity)
        .order_by_asc(course_user::Column::CourseId)
        .all(db)
        .await?
        .into_iter()
        .filter_map(|(cu, c)| {
            c.map(|c| MembershipSummary {
                course_id: cu.course_id,
                course_code: c.course_code,
                department: c.department,
                kind: cu.kind,
                is_deactivated: cu.is_deactivated,
            })
        })
        .collect();

    Ok(MeResponse {
        id: user.id,
        username: user.username,
        full_name: user.full_name,
        preferred_name: user.preferred_name,
        email: user.email,
        role: user.role,
        permissions: auth_user.permissions.clone(),
        memberships,
    })
}

async fn find_user<C: ConnectionTrait>(db: &C, id: i32) -> Result<user::Model, AppError> {
    user::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))
}

#[utoipa::path(
    get,
    path = "/me",
    tag = "Auth",
    operation_id = "getMe",
    summary = "Get the current user",
    description = "Returns the authenticated user's profile together with every course membership.",
    responses(
        (status = 200, description = "Current user", body = MeResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn me(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<MeResponse>, AppError> {
    let user = find_user(&state.db, auth_user.user_id).await?;
    Ok(Json(build_me(&state.db, &auth_user, user).await?))
}

#[utoipa::path(
    patch,
    path = "/me",
    tag = "Auth",
    operation_id = "updateMe",
    summary = "Update the current user's profile",
    description = "Partially updates names and email. Setting an email accepts any pending course invites addressed to it.",
    request_body = UpdateMeRequest,
    responses(
        (status = 200, description = "Profile updated", body = MeResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 409, description = "Email in use (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn update_me(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<UpdateMeRequest>,
) -> Result<Json<MeResponse>, AppError> {
    validate_update_me(&payload)?;

    if payload == UpdateMeRequest::default() {
        let user = find_user(&state.db, auth_user.user_id).await?;
        return Ok(Json(build_me(&state.db, &auth_user, user).await?));
    }

    let txn = state.db.begin().await?;
    let existing = user::Entity::find_by_id(auth_user.user_id)
        .lock(sea_orm::sea_query::LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    let new_email = payload
        .email
        .as_ref()
        .map(|e| e.as_deref().map(normalize_email));

    let mut active: user::ActiveModel = existing.into();
    if let Some(ref name) = payload.full_name {
        active.full_name = Set(name.trim().to_string());
    }
    if let Some(ref name) = payload.preferred_name {
        active.preferred_name = Set(name.trim().to_string());
    }
    if let Some(ref email) = new_email {
        if let Some(address) = email
            && email_in_use(&txn, address, Some(auth_user.user_id)).await?
        {
            return Err(AppError::Conflict("Email is already in use".into()));
        }
        active.email = Set(email.clone());
    }

    let user = active
        .update(&txn)
        .await
        .map_err(|e| AppError::conflict_on_unique(e, "Email is already in use"))?;

    if let Some(Some(ref address)) = new_email {
        accept_invites(&txn, user.id, address).await?;
    }

    let response = build_me(&txn, &auth_user, user).await?;
    txn.commit().await?;

    Ok(Json(response))
}
