use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "feedback_answer")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique_key = "feedback_question_answer")]
    pub feedback_question_id: i32,
    #[sea_orm(belongs_to, from = "feedback_question_id", to = "id")]
    pub feedback_question: HasOne<super::feedback_question::Entity>,

    #[sea_orm(unique_key = "feedback_question_answer")]
    pub question_id: i32,
    #[sea_orm(belongs_to, from = "question_id", to = "id")]
    pub question: HasOne<super::question::Entity>,

    #[sea_orm(column_type = "Text")]
    pub answer_text: String,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
