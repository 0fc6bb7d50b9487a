#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ParseEnumError;

/// Role of a user within a single course.
///
/// When the `sea-orm` feature is enabled, this enum can be used directly in SeaORM entities.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CourseUserKind {
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "STUDENT"))]
    Student,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "TA"))]
    Ta,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "HEAD_TA"))]
    HeadTa,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "PROFESSOR"))]
    Professor,
}

impl CourseUserKind {
    pub const ALL: &'static [CourseUserKind] =
        &[Self::Student, Self::Ta, Self::HeadTa, Self::Professor];

    /// Kinds that may pull questions off a queue.
    pub const STAFF: &'static [CourseUserKind] = &[Self::Ta, Self::HeadTa, Self::Professor];

    /// Kinds that may manage the course itself (settings, members, queues).
    pub const LEADERSHIP: &'static [CourseUserKind] = &[Self::HeadTa, Self::Professor];

    pub fn is_staff(&self) -> bool {
        !matches!(self, Self::Student)
    }

    pub fn is_leadership(&self) -> bool {
        matches!(self, Self::HeadTa | Self::Professor)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "STUDENT",
            Self::Ta => "TA",
            Self::HeadTa => "HEAD_TA",
            Self::Professor => "PROFESSOR",
        }
    }
}

impl fmt::Display for CourseUserKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CourseUserKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| {
                ParseEnumError::new(
                    "course user kind",
                    s,
                    &Self::ALL.iter().map(|k| k.as_str()).collect::<Vec<_>>(),
                )
            })
    }
}
