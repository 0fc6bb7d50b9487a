use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::shared::validate_text_field;
use crate::error::AppError;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateVectorDbRequest {
    #[schema(example = "lecture-notes")]
    pub name: String,
    pub top_k: Option<i32>,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateDocumentRequest {
    #[schema(example = "week-03-recursion.pdf")]
    pub name: String,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct VectorDbResponse {
    pub id: i32,
    pub course_id: i32,
    pub name: String,
    pub top_k: Option<i32>,
    pub time_updated: DateTime<Utc>,
}

impl From<crate::entity::vector_db::Model> for VectorDbResponse {
    fn from(m: crate::entity::vector_db::Model) -> Self {
        Self {
            id: m.id,
            course_id: m.course_id,
            name: m.name,
            top_k: m.top_k,
            time_updated: m.time_updated,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct DocumentResponse {
    pub id: i32,
    pub vector_db_id: i32,
    pub name: String,
}

impl From<crate::entity::document::Model> for DocumentResponse {
    fn from(m: crate::entity::document::Model) -> Self {
        Self {
            id: m.id,
            vector_db_id: m.vector_db_id,
            name: m.name,
        }
    }
}

pub fn validate_create_vector_db(req: &CreateVectorDbRequest) -> Result<(), AppError> {
    validate_text_field("Name", &req.name, 255)?;
    if let Some(top_k) = req.top_k
        && !(1..=100).contains(&top_k)
    {
        return Err(AppError::Validation("top_k must be between 1 and 100".into()));
    }
    Ok(())
}

pub fn validate_create_document(req: &CreateDocumentRequest) -> Result<(), AppError> {
    validate_text_field("Name", &req.name, 255)
}
