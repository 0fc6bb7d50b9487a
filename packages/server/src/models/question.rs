use chrono::{DateTime, Utc};
use common::{QuestionStatus, RejectionReason};
use serde::{Deserialize, Serialize};

use super::shared::{tags_from_json, validate_tags};
use crate::entity::question;
use crate::error::AppError;

/// Most recent resolved questions returned by the "last questions" view.
pub const LAST_QUESTIONS_LIMIT: u64 = 10;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateQuestionRequest {
    #[schema(example = "My recursive solution overflows the stack")]
    pub text: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct RejectQuestionRequest {
    pub reason: RejectionReason,
    /// Required when `reason` is `OTHER`, forbidden otherwise.
    pub reason_other: Option<String>,
}

#[derive(Deserialize, utoipa::IntoParams)]
pub struct QuestionListQuery {
    /// Only return questions in this state.
    pub status: Option<QuestionStatus>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct QuestionResponse {
    pub id: i32,
    pub queue_id: i32,
    pub asked_by_id: i32,
    pub answered_by_id: Option<i32>,
    pub rejected_by_id: Option<i32>,
    pub text: String,
    pub tags: Vec<String>,
    pub status: QuestionStatus,
    pub time_asked: DateTime<Utc>,
    pub time_started: Option<DateTime<Utc>>,
    pub time_answered: Option<DateTime<Utc>>,
    pub time_withdrawn: Option<DateTime<Utc>>,
    pub time_rejected: Option<DateTime<Utc>>,
    pub time_last_updated: DateTime<Utc>,
    pub rejected_reason: Option<RejectionReason>,
    pub rejected_reason_other: Option<String>,
}

impl From<question::Model> for QuestionResponse {
    fn from(m: question::Model) -> Self {
        Self {
            status: m.status(),
            tags: tags_from_json(&m.tags),
            id: m.id,
            queue_id: m.queue_id,
            asked_by_id: m.asked_by_id,
            answered_by_id: m.answered_by_id,
            rejected_by_id: m.rejected_by_id,
            text: m.text,
            time_asked: m.time_asked,
            time_started: m.time_started,
            time_answered: m.time_answered,
            time_withdrawn: m.time_withdrawn,
            time_rejected: m.time_rejected,
            time_last_updated: m.time_last_updated,
            rejected_reason: m.rejected_reason,
            rejected_reason_other: m.rejected_reason_other,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct QuestionPositionResponse {
    /// 1-based place among waiting questions, or -1 once the question left the line.
    #[schema(example = 3)]
    pub position: i64,
}

pub fn validate_create_question(req: &CreateQuestionRequest) -> Result<(), AppError> {
    let text = req.text.trim();
    if text.is_empty() || text.len() > 10_000 {
        return Err(AppError::Validation(
            "Question text must be non-empty and at most 10KB".into(),
        ));
    }
    validate_tags(&req.tags)
}

/// Check the rejection reason pair and return the free text to store.
pub fn validate_rejection(
    reason: RejectionReason,
    other: Option<&str>,
) -> Result<Option<String>, AppError> {
    if !reason.requires_text() {
        // Any value, even blank, is a mismatch for a fixed reason.
        return match other {
            Some(_) => Err(AppError::Validation(
                "reason_other is only allowed when reason is OTHER".into(),
            )),
            None => Ok(None),
        };
    }

    match other.map(str::trim).filter(|s| !s.is_empty()) {
        Some(text) if text.len() <= 1_000 => Ok(Some(text.to_string())),
        Some(_) => Err(AppError::Validation(
            "reason_other must be at most 1000 characters".into(),
        )),
        None => Err(AppError::Validation(
            "reason_other is required when reason is OTHER".into(),
        )),
    }
}

/// Only the asker may withdraw, and only while the question is still waiting.
pub fn ensure_withdrawable(q: &question::Model, caller: i32) -> Result<(), AppError> {
    if q.asked_by_id != caller {
        return Err(AppError::PermissionDenied);
    }
    if q.status() != QuestionStatus::Asked {
        return Err(AppError::Validation(
            "Only a question that has not been started or rejected can be withdrawn".into(),
        ));
    }
    Ok(())
}

pub fn ensure_rejectable(q: &question::Model) -> Result<(), AppError> {
    if q.status().is_final() {
        return Err(AppError::Validation(format!(
            "Question is already {}",
            q.status()
        )));
    }
    Ok(())
}

/// A question can be picked up while waiting, or taken over while active.
pub fn ensure_startable(q: &question::Model) -> Result<(), AppError> {
    if q.time_withdrawn.is_some() {
        return Err(AppError::Validation(
            "A withdrawn question cannot be started".into(),
        ));
    }
    if q.status().is_final() {
        return Err(AppError::Validation(format!(
            "Question is already {}",
            q.status()
        )));
    }
    Ok(())
}

pub fn ensure_unstartable(q: &question::Model) -> Result<(), AppError> {
    if q.time_withdrawn.is_some() {
        return Err(AppError::Validation(
            "A withdrawn question cannot be returned to the queue".into(),
        ));
    }
    if q.status() != QuestionStatus::Active {
        return Err(AppError::Validation(
            "Only an active question can be returned to the queue".into(),
        ));
    }
    Ok(())
}

/// Only the staff member currently answering may finish.
pub fn ensure_finisher(q: &question::Model, caller: i32) -> Result<(), AppError> {
    if q.answered_by_id != Some(caller) {
        return Err(AppError::PermissionDenied);
    }
    if q.status() != QuestionStatus::Active {
        return Err(AppError::Validation(
            "Only an active question can be finished".into(),
        ));
    }
    Ok(())
}
