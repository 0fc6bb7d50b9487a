use chrono::{DateTime, Utc};
use common::CourseUserKind;
use serde::{Deserialize, Serialize};

use super::shared::{tags_from_json, validate_tags, validate_text_field};
use crate::error::AppError;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateCourseRequest {
    #[schema(example = "120")]
    pub course_code: String,
    #[schema(example = "CIS")]
    pub department: String,
    #[schema(example = "Programming Languages and Techniques I")]
    pub course_title: String,
    #[serde(default)]
    pub description: String,
    pub semester_id: i32,
    #[serde(default)]
    pub invite_only: bool,
    /// Initial tag vocabulary.
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateCourseRequest {
    pub course_code: Option<String>,
    pub department: Option<String>,
    pub course_title: Option<String>,
    pub description: Option<String>,
    pub semester_id: Option<i32>,
    pub invite_only: Option<bool>,
    pub archived: Option<bool>,
    /// Replaces the tag vocabulary. Tags still used by a queue cannot be removed.
    pub tags: Option<Vec<String>>,
}

#[derive(Deserialize, utoipa::IntoParams)]
pub struct CourseListQuery {
    /// Include archived courses. Default: false.
    pub include_archived: Option<bool>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct CourseResponse {
    pub id: i32,
    pub course_code: String,
    pub department: String,
    pub course_title: String,
    pub description: String,
    pub semester_id: i32,
    pub archived: bool,
    pub invite_only: bool,
    pub tags: Vec<String>,
    /// Caller's role in the course, if any.
    pub kind: Option<CourseUserKind>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CourseResponse {
    pub fn new(m: crate::entity::course::Model, kind: Option<CourseUserKind>) -> Self {
        Self {
            id: m.id,
            tags: tags_from_json(&m.tags),
            course_code: m.course_code,
            department: m.department,
            course_title: m.course_title,
            description: m.description,
            semester_id: m.semester_id,
            archived: m.archived,
            invite_only: m.invite_only,
            kind,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

pub fn validate_create_course(req: &CreateCourseRequest) -> Result<(), AppError> {
    validate_text_field("Course code", &req.course_code, 16)?;
    validate_text_field("Department", &req.department, 16)?;
    validate_text_field("Course title", &req.course_title, 256)?;
    if req.description.len() > 100_000 {
        return Err(AppError::Validation(
            "Description must be at most 100KB".into(),
        ));
    }
    validate_tags(&req.tags)
}

pub fn validate_update_course(req: &UpdateCourseRequest) -> Result<(), AppError> {
    if let Some(ref code) = req.course_code {
        validate_text_field("Course code", code, 16)?;
    }
    if let Some(ref department) = req.department {
        validate_text_field("Department", department, 16)?;
    }
    if let Some(ref title) = req.course_title {
        validate_text_field("Course title", title, 256)?;
    }
    if let Some(ref description) = req.description
        && description.len() > 100_000
    {
        return Err(AppError::Validation(
            "Description must be at most 100KB".into(),
        ));
    }
    if let Some(ref tags) = req.tags {
        validate_tags(tags)?;
    }
    Ok(())
}
