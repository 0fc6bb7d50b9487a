use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "document")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Unique across all vector databases.
    #[sea_orm(unique)]
    pub name: String,

    pub vector_db_id: i32,
    #[sea_orm(belongs_to, from = "vector_db_id", to = "id")]
    pub vector_db: HasOne<super::vector_db::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
