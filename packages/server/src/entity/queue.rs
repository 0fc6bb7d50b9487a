use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "queue")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique_key = "course_queue_name")]
    pub course_id: i32,
    #[sea_orm(belongs_to, from = "course_id", to = "id")]
    pub course: HasOne<super::course::Entity>,

    #[sea_orm(unique_key = "course_queue_name")]
    pub name: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,

    /// Staff-provided estimate in minutes.
    #[sea_orm(default_value = 0)]
    pub estimated_wait_time: i32,

    pub active: bool,
    #[sea_orm(default_value = false)]
    pub archived: bool,

    /// JSON array of `{weekday, start, end}` windows.
    #[sea_orm(column_type = "JsonBinary")]
    pub start_end_times: Json,

    /// JSON array of tag names, a subset of the course vocabulary.
    #[sea_orm(column_type = "JsonBinary")]
    pub tags: Json,

    #[sea_orm(has_many)]
    pub questions: HasMany<super::question::Entity>,

    #[sea_orm(has_many)]
    pub statistics: HasMany<super::queue_statistic::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
