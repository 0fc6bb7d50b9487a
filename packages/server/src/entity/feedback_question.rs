use common::FeedbackQuestionKind;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "feedback_question")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub course_id: i32,
    #[sea_orm(belongs_to, from = "course_id", to = "id")]
    pub course: HasOne<super::course::Entity>,

    #[sea_orm(column_type = "Text")]
    pub question_text: String,
    pub kind: FeedbackQuestionKind,

    /// JSON array of choices; empty unless `kind` is RadioButton.
    #[sea_orm(column_type = "JsonBinary")]
    pub answer_choices: Json,
    pub slider_min: Option<i32>,
    pub slider_max: Option<i32>,

    pub required: bool,
    #[sea_orm(default_value = true)]
    pub active: bool,

    #[sea_orm(has_many)]
    pub answers: HasMany<super::feedback_answer::Entity>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
