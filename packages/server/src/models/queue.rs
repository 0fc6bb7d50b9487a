use chrono::{DateTime, NaiveTime, Utc};
use sea_orm::prelude::Json;
use serde::{Deserialize, Serialize};

use super::shared::{tags_from_json, validate_tags, validate_text_field};
use crate::error::AppError;

/// One weekly opening window of a queue, in course-local time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct TimeWindow {
    /// 1 = Sunday .. 7 = Saturday.
    #[schema(example = 2)]
    pub weekday: u8,
    /// `HH:MM`, 24-hour clock.
    #[schema(example = "14:00")]
    pub start: String,
    #[schema(example = "16:30")]
    pub end: String,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateQueueRequest {
    #[schema(example = "Main Queue")]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub estimated_wait_time: i32,
    /// Defaults to true.
    pub active: Option<bool>,
    #[serde(default)]
    pub start_end_times: Vec<TimeWindow>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateQueueRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub estimated_wait_time: Option<i32>,
    pub active: Option<bool>,
    pub archived: Option<bool>,
    pub start_end_times: Option<Vec<TimeWindow>>,
    pub tags: Option<Vec<String>>,
}

#[derive(Deserialize, utoipa::IntoParams)]
pub struct QueueListQuery {
    /// Include archived queues. Default: false.
    pub include_archived: Option<bool>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct QueueResponse {
    pub id: i32,
    pub course_id: i32,
    pub name: String,
    pub description: String,
    pub estimated_wait_time: i32,
    pub active: bool,
    pub archived: bool,
    pub start_end_times: Vec<TimeWindow>,
    pub tags: Vec<String>,
    /// Questions currently waiting (asked, not started).
    pub questions_asked: u64,
    /// Questions currently being answered.
    pub questions_active: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl QueueResponse {
    pub fn new(m: crate::entity::queue::Model, questions_asked: u64, questions_active: u64) -> Self {
        Self {
            id: m.id,
            course_id: m.course_id,
            tags: tags_from_json(&m.tags),
            start_end_times: windows_from_json(&m.start_end_times),
            name: m.name,
            description: m.description,
            estimated_wait_time: m.estimated_wait_time,
            active: m.active,
            archived: m.archived,
            questions_asked,
            questions_active,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ClearQueueResponse {
    /// Number of waiting questions that were rejected.
    pub rejected: u64,
}

fn parse_clock(value: &str) -> Result<NaiveTime, AppError> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .map_err(|_| AppError::Validation(format!("Invalid time '{value}', expected HH:MM")))
}

pub fn validate_time_windows(windows: &[TimeWindow]) -> Result<(), AppError> {
    for window in windows {
        if !(1..=7).contains(&window.weekday) {
            return Err(AppError::Validation(
                "weekday must be between 1 (Sunday) and 7 (Saturday)".into(),
            ));
        }
        if parse_clock(&window.end)? <= parse_clock(&window.start)? {
            return Err(AppError::Validation(
                "Window end must be after its start".into(),
            ));
        }
    }
    Ok(())
}

pub fn windows_to_json(windows: &[TimeWindow]) -> Json {
    serde_json::to_value(windows).unwrap_or_else(|_| Json::Array(Vec::new()))
}

/// Decode stored windows, skipping malformed entries.
pub fn windows_from_json(value: &Json) -> Vec<TimeWindow> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|v| serde_json::from_value(v.clone()).ok())
                .collect()
        })
        .unwrap_or_default()
}

fn validate_wait_time(minutes: i32) -> Result<(), AppError> {
    if !(0..=24 * 60).contains(&minutes) {
        return Err(AppError::Validation(
            "estimated_wait_time must be between 0 and 1440 minutes".into(),
        ));
    }
    Ok(())
}

pub fn validate_create_queue(req: &CreateQueueRequest) -> Result<(), AppError> {
    validate_text_field("Queue name", &req.name, 100)?;
    if req.description.len() > 10_000 {
        return Err(AppError::Validation(
            "Description must be at most 10KB".into(),
        ));
    }
    validate_wait_time(req.estimated_wait_time)?;
    validate_time_windows(&req.start_end_times)?;
    validate_tags(&req.tags)
}

pub fn validate_update_queue(req: &UpdateQueueRequest) -> Result<(), AppError> {
    if let Some(ref name) = req.name {
        validate_text_field("Queue name", name, 100)?;
    }
    if let Some(ref description) = req.description
        && description.len() > 10_000
    {
        return Err(AppError::Validation(
            "Description must be at most 10KB".into(),
        ));
    }
    if let Some(minutes) = req.estimated_wait_time {
        validate_wait_time(minutes)?;
    }
    if let Some(ref windows) = req.start_end_times {
        validate_time_windows(windows)?;
    }
    if let Some(ref tags) = req.tags {
        validate_tags(tags)?;
    }
    Ok(())
}
