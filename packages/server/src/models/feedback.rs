use chrono::{DateTime, Utc};
use common::FeedbackQuestionKind;
use serde::{Deserialize, Serialize};

use super::shared::{tags_from_json, validate_text_field};
use crate::entity::feedback_question;
use crate::error::AppError;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateFeedbackQuestionRequest {
    #[schema(example = "How helpful was this session?")]
    pub question_text: String,
    pub kind: FeedbackQuestionKind,
    /// Choices for `RADIO_BUTTON` questions.
    #[serde(default)]
    pub answer_choices: Vec<String>,
    pub slider_min: Option<i32>,
    pub slider_max: Option<i32>,
    #[serde(default)]
    pub required: bool,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct FeedbackAnswerInput {
    pub feedback_question_id: i32,
    pub answer_text: String,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct SubmitFeedbackRequest {
    /// The answered question the feedback is about.
    pub question_id: i32,
    pub answers: Vec<FeedbackAnswerInput>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct FeedbackQuestionResponse {
    pub id: i32,
    pub course_id: i32,
    pub question_text: String,
    pub kind: FeedbackQuestionKind,
    pub answer_choices: Vec<String>,
    pub slider_min: Option<i32>,
    pub slider_max: Option<i32>,
    pub required: bool,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<feedback_question::Model> for FeedbackQuestionResponse {
    fn from(m: feedback_question::Model) -> Self {
        Self {
            id: m.id,
            course_id: m.course_id,
            answer_choices: tags_from_json(&m.answer_choices),
            question_text: m.question_text,
            kind: m.kind,
            slider_min: m.slider_min,
            slider_max: m.slider_max,
            required: m.required,
            active: m.active,
            created_at: m.created_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct FeedbackAnswerResponse {
    pub id: i32,
    pub feedback_question_id: i32,
    pub question_id: i32,
    pub answer_text: String,
    pub created_at: DateTime<Utc>,
}

impl From<crate::entity::feedback_answer::Model> for FeedbackAnswerResponse {
    fn from(m: crate::entity::feedback_answer::Model) -> Self {
        Self {
            id: m.id,
            feedback_question_id: m.feedback_question_id,
            question_id: m.question_id,
            answer_text: m.answer_text,
            created_at: m.created_at,
        }
    }
}

pub fn validate_create_feedback_question(
    req: &CreateFeedbackQuestionRequest,
) -> Result<(), AppError> {
    validate_text_field("Question text", &req.question_text, 1_000)?;
    let has_slider = req.slider_min.is_some() || req.slider_max.is_some();
    match req.kind {
        FeedbackQuestionKind::ShortAnswer => {
            if !req.answer_choices.is_empty() || has_slider {
                return Err(AppError::Validation(
                    "Short answer questions take no choices or slider bounds".into(),
                ));
            }
        }
        FeedbackQuestionKind::RadioButton => {
            if req.answer_choices.len() < 2 || has_slider {
                return Err(AppError::Validation(
                    "Radio button questions need at least two choices and no slider bounds"
                        .into(),
                ));
            }
            for choice in &req.answer_choices {
                validate_text_field("Choice", choice, 200)?;
            }
        }
        FeedbackQuestionKind::Slider => match (req.slider_min, req.slider_max) {
            (Some(min), Some(max)) if min < max && req.answer_choices.is_empty() => {}
            _ => {
                return Err(AppError::Validation(
                    "Slider questions need slider_min < slider_max and no choices".into(),
                ));
            }
        },
    }
    Ok(())
}

/// Check one answer against its prompt and return the text to store.
pub fn validate_feedback_answer(
    question: &feedback_question::Model,
    answer: &str,
) -> Result<String, AppError> {
    let answer = answer.trim();
    match question.kind {
        FeedbackQuestionKind::ShortAnswer => {
            if answer.is_empty() || answer.len() > 10_000 {
                return Err(AppError::Validation(
                    "Answer must be non-empty and at most 10KB".into(),
                ));
            }
        }
        FeedbackQuestionKind::RadioButton => {
            if !tags_from_json(&question.answer_choices)
                .iter()
                .any(|c| c == answer)
            {
                return Err(AppError::Validation(format!(
                    "'{answer}' is not one of the choices"
                )));
            }
        }
        FeedbackQuestionKind::Slider => {
            let value: i32 = answer
                .parse()
                .map_err(|_| AppError::Validation("Slider answer must be an integer".into()))?;
            let min = question.slider_min.unwrap_or(i32::MIN);
            let max = question.slider_max.unwrap_or(i32::MAX);
            if !(min..=max).contains(&value) {
                return Err(AppError::Validation(format!(
                    "Slider answer must be between {min} and {max}"
                )));
            }
        }
    }
    Ok(answer.to_string())
}
