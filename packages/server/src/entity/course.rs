use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "course")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub course_code: String,
    pub department: String,
    pub course_title: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,

    pub semester_id: i32,
    #[sea_orm(belongs_to, from = "semester_id", to = "id")]
    pub semester: HasOne<super::semester::Entity>,

    #[sea_orm(default_value = false)]
    pub archived: bool,
    #[sea_orm(default_value = false)]
    pub invite_only: bool,

    /// Tag vocabulary available to this course's queues and questions,
    /// stored as a JSON array of strings.
    #[sea_orm(column_type = "JsonBinary")]
    pub tags: Json,

    #[sea_orm(has_many)]
    pub queues: HasMany<super::queue::Entity>,

    #[sea_orm(has_many, via = "course_user")]
    pub users: HasMany<super::user::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
