#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};

/// Input style of a course feedback question.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeedbackQuestionKind {
    /// Free text.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "SHORT_ANSWER"))]
    ShortAnswer,
    /// One of a fixed list of choices.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "RADIO_BUTTON"))]
    RadioButton,
    /// An integer within an inclusive range.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "SLIDER"))]
    Slider,
}
