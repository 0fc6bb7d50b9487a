#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ParseEnumError;

/// Kind of precomputed queue statistic.
///
/// Weekly metrics are bucketed by the Sunday that starts the week; heatmap
/// metrics are bucketed by (weekday, hour).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatisticMetric {
    /// Mean seconds between asking and being picked up.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "AVG_WAIT"))]
    AvgWait,
    /// Mean seconds between being picked up and being answered.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "AVG_TIME_HELPING"))]
    AvgTimeHelping,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "NUM_ANSWERED"))]
    NumAnswered,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "STUDENTS_HELPED"))]
    StudentsHelped,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "HEATMAP_WAIT"))]
    HeatmapWait,
    #[cfg_attr(
        feature = "sea-orm",
        sea_orm(string_value = "HEATMAP_QUESTIONS_PER_TA")
    )]
    HeatmapQuestionsPerTa,
}

impl StatisticMetric {
    pub const ALL: &'static [StatisticMetric] = &[
        Self::AvgWait,
        Self::AvgTimeHelping,
        Self::NumAnswered,
        Self::StudentsHelped,
        Self::HeatmapWait,
        Self::HeatmapQuestionsPerTa,
    ];

    pub fn is_heatmap(&self) -> bool {
        matches!(self, Self::HeatmapWait | Self::HeatmapQuestionsPerTa)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AvgWait => "AVG_WAIT",
            Self::AvgTimeHelping => "AVG_TIME_HELPING",
            Self::NumAnswered => "NUM_ANSWERED",
            Self::StudentsHelped => "STUDENTS_HELPED",
            Self::HeatmapWait => "HEATMAP_WAIT",
            Self::HeatmapQuestionsPerTa => "HEATMAP_QUESTIONS_PER_TA",
        }
    }
}

impl fmt::Display for StatisticMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatisticMetric {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| {
                ParseEnumError::new(
                    "metric",
                    s,
                    &Self::ALL.iter().map(|m| m.as_str()).collect::<Vec<_>>(),
                )
            })
    }
}
