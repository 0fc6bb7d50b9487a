use common::CourseUserKind;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// An invite for an email address that has no account yet.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "membership_invite")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique_key = "course_email")]
    pub course_id: i32,
    #[sea_orm(belongs_to, from = "course_id", to = "id")]
    pub course: HasOne<super::course::Entity>,

    #[sea_orm(unique_key = "course_email", indexed)]
    pub email: String,
    pub kind: CourseUserKind,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
