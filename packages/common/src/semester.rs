#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};

/// Academic term of a semester.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Term {
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "SPRING"))]
    Spring,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "SUMMER"))]
    Summer,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "FALL"))]
    Fall,
}
