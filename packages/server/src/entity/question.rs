use common::{QuestionStatus, RejectionReason};
use sea_orm::Condition;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "question")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub queue_id: i32,
    #[sea_orm(belongs_to, from = "queue_id", to = "id")]
    pub queue: HasOne<super::queue::Entity>,

    #[sea_orm(indexed)]
    pub asked_by_id: i32,
    pub answered_by_id: Option<i32>,
    pub rejected_by_id: Option<i32>,

    #[sea_orm(column_type = "Text")]
    pub text: String,
    /// JSON array of tag names, a subset of the course vocabulary.
    #[sea_orm(column_type = "JsonBinary")]
    pub tags: Json,

    pub time_asked: DateTimeUtc,
    pub time_started: Option<DateTimeUtc>,
    pub time_answered: Option<DateTimeUtc>,
    pub time_withdrawn: Option<DateTimeUtc>,
    pub time_rejected: Option<DateTimeUtc>,
    pub time_last_updated: DateTimeUtc,

    pub rejected_reason: Option<RejectionReason>,
    #[sea_orm(column_type = "Text", nullable)]
    pub rejected_reason_other: Option<String>,

    #[sea_orm(has_many)]
    pub feedback_answers: HasMany<super::feedback_answer::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn status(&self) -> QuestionStatus {
        QuestionStatus::derive(
            self.time_started.is_some(),
            self.time_answered.is_some(),
            self.time_withdrawn.is_some(),
            self.time_rejected.is_some(),
        )
    }
}

/// SQL condition matching questions whose derived status is `status`.
pub fn status_condition(status: QuestionStatus) -> Condition {
    let open = Condition::all()
        .add(Column::TimeWithdrawn.is_null())
        .add(Column::TimeRejected.is_null());
    match status {
        QuestionStatus::Asked => open
            .add(Column::TimeStarted.is_null())
            .add(Column::TimeAnswered.is_null()),
        QuestionStatus::Active => open
            .add(Column::TimeStarted.is_not_null())
            .add(Column::TimeAnswered.is_null()),
        QuestionStatus::Answered => open.add(Column::TimeAnswered.is_not_null()),
        QuestionStatus::Withdrawn => Condition::all().add(Column::TimeWithdrawn.is_not_null()),
        QuestionStatus::Rejected => Condition::all()
            .add(Column::TimeWithdrawn.is_null())
            .add(Column::TimeRejected.is_not_null()),
    }
}
