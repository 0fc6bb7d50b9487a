use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "vector_db")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique_key = "course_vector_db_name")]
    pub name: String,

    #[sea_orm(unique_key = "course_vector_db_name")]
    pub course_id: i32,
    #[sea_orm(belongs_to, from = "course_id", to = "id")]
    pub course: HasOne<super::course::Entity>,

    pub top_k: Option<i32>,

    #[sea_orm(has_many)]
    pub documents: HasMany<super::document::Entity>,

    pub time_updated: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
