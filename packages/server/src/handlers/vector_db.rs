use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sea_orm::*;
use tracing::instrument;

use crate::entity::{document, vector_db};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::request::AppJson;
use crate::models::vector_db::*;
use crate::state::AppState;
use crate::utils::course::{find_course, require_leadership, require_staff};

async fn find_vector_db<C: ConnectionTrait>(
    db: &C,
    course_id: i32,
    vdb_id: i32,
) -> Result<vector_db::Model, AppError> {
    vector_db::Entity::find_by_id(vdb_id)
        .one(db)
        .await?
        .filter(|v| v.course_id == course_id)
        .ok_or_else(|| AppError::NotFound("Vector database not found".into()))
}

async fn touch_vector_db<C: ConnectionTrait>(db: &C, model: vector_db::Model) -> Result<(), AppError> {
    let mut active: vector_db::ActiveModel = model.into();
    active.time_updated = Set(chrono::Utc::now());
    active.update(db).await?;
    Ok(())
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Vector Databases",
    operation_id = "listVectorDbs",
    summary = "List a course's vector databases",
    description = "Requires a staff role.",
    params(("id" = i32, Path, description = "Course ID")),
    responses(
        (status = 200, description = "List of vector databases", body = Vec<VectorDbResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Course not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(course_id))]
pub async fn list_vector_dbs(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(course_id): Path<i32>,
) -> Result<Json<Vec<VectorDbResponse>>, AppError> {
    require_staff(&state.db, course_id, &auth_user).await?;

    let items = vector_db::Entity::find()
        .filter(vector_db::Column::CourseId.eq(course_id))
        .order_by_asc(vector_db::Column::Name)
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
    tag = "Vector Databases",
    operation_id = "createVectorDb",
    summary = "Create a vector database",
    description = "Names are unique per course. Requires a leadership role.",
    params(("id" = i32, Path, description = "Course ID")),
    request_body = CreateVectorDbRequest,
    responses(
        (status = 201, description = "Vector database created", body = VectorDbResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Course not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Name taken (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(course_id))]
pub async fn create_vector_db(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(course_id): Path<i32>,
    AppJson(payload): AppJson<CreateVectorDbRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_create_vector_db(&payload)?;
    find_course(&state.db, course_id).await?;
    require_leadership(&state.db, course_id, &auth_user).await?;

    let model = vector_db::ActiveModel {
        course_id: Set(course_id),
        name: Set(payload.name.trim().to_string()),
        top_k: Set(payload.top_k),
        time_updated: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(&state.db)
    .await
    .map_err(|e| {
        AppError::conflict_on_unique(e, "A vector database with this name already exists")
    })?;

    Ok((StatusCode::CREATED, Json(VectorDbResponse::from(model))))
}

#[utoipa::path(
    delete,
    path = "/{vdb_id}",
    tag = "Vector Databases",
    operation_id = "deleteVectorDb",
    summary = "Delete a vector database and its documents",
    description = "Requires a leadership role.",
    params(
        ("id" = i32, Path, description = "Course ID"),
        ("vdb_id" = i32, Path, description = "Vector database ID"),
    ),
    responses(
        (status = 204, description = "Vector database deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Vector database not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(course_id, vdb_id))]
pub async fn delete_vector_db(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((course_id, vdb_id)): Path<(i32, i32)>,
) -> Result<impl IntoResponse, AppError> {
    require_leadership(&state.db, course_id, &auth_user).await?;

    let txn = state.db.begin().await?;
    find_vector_db(&txn, course_id, vdb_id).await?;
    document::Entity::delete_many()
        .filter(document::Column::VectorDbId.eq(vdb_id))
        .exec(&txn)
        .await?;
    vector_db::Entity::delete_by_id(vdb_id).exec(&txn).await?;
    txn.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Vector Databases",
    operation_id = "listDocuments",
    summary = "List documents in a vector database",
    description = "Requires a staff role.",
    params(
        ("id" = i32, Path, description = "Course ID"),
        ("vdb_id" = i32, Path, description = "Vector database ID"),
    ),
    responses(
        (status = 200, description = "List of documents", body = Vec<DocumentResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Vector database not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(course_id, vdb_id))]
pub async fn list_documents(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((course_id, vdb_id)): Path<(i32, i32)>,
) -> Result<Json<Vec<DocumentResponse>>, AppError> {
    require_staff(&state.db, course_id, &auth_user).await?;
    find_vector_db(&state.db, course_id, vdb_id).await?;

    let items = document::Entity::find()
        .filter(document::Column::VectorDbId.eq(vdb_id))
        .order_by_asc(document::Column::Name)
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
    tag = "Vector Databases",
    operation_id = "createDocument",
    summary = "Register a document in a vector database",
    description = "Document names are unique across all vector databases. Requires a leadership role.",
    params(
        ("id" = i32, Path, description = "Course ID"),
        ("vdb_id" = i32, Path, description = "Vector database ID"),
    ),
    request_body = CreateDocumentRequest,
    responses(
        (status = 201, description = "Document created", body = DocumentResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Vector database not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Name taken (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(course_id, vdb_id))]
pub async fn create_document(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((course_id, vdb_id)): Path<(i32, i32)>,
    AppJson(payload): AppJson<CreateDocumentRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_create_document(&payload)?;
    require_leadership(&state.db, course_id, &auth_user).await?;

    let txn = state.db.begin().await?;
    let parent = find_vector_db(&txn, course_id, vdb_id).await?;
    let model = document::ActiveModel {
        vector_db_id: Set(vdb_id),
        name: Set(payload.name.trim().to_string()),
        ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(|e| AppError::conflict_on_unique(e, "A document with this name already exists"))?;
    touch_vector_db(&txn, parent).await?;
    txn.commit().await?;

    Ok((StatusCode::CREATED, Json(DocumentResponse::from(model))))
}

#[utoipa::path(
    delete,
    path = "/{doc_id}",
    tag = "Vector Databases",
    operation_id = "deleteDocument",
    summary = "Remove a document from a vector database",
    description = "Requires a leadership role.",
    params(
        ("id" = i32, Path, description = "Course ID"),
        ("vdb_id" = i32, Path, description = "Vector database ID"),
        ("doc_id" = i32, Path, description = "Document ID"),
    ),
    responses(
        (status = 204, description = "Document deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Document not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(course_id, vdb_id, doc_id))]
pub async fn delete_document(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((course_id, vdb_id, doc_id)): Path<(i32, i32, i32)>,
) -> Result<impl IntoResponse, AppError> {
    require_leadership(&state.db, course_id, &auth_user).await?;

    let txn = state.db.begin().await?;
    let parent = find_vector_db(&txn, course_id, vdb_id).await?;
    let result = document::Entity::delete_many()
        .filter(document::Column::Id.eq(doc_id))
        .filter(document::Column::VectorDbId.eq(vdb_id))
        .exec(&txn)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Document not found".into()));
    }
    touch_vector_db(&txn, parent).await?;
    txn.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}
