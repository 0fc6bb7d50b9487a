use chrono::{DateTime, NaiveDate, Utc};
use common::StatisticMetric;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Deserialize, utoipa::IntoParams)]
pub struct StatisticsQuery {
    /// Only return this metric.
    pub metric: Option<StatisticMetric>,
    /// Earliest week start (inclusive) for weekly metrics.
    pub start: Option<NaiveDate>,
    /// Latest week start (inclusive) for weekly metrics.
    pub end: Option<NaiveDate>,
}

pub fn validate_statistics_query(query: &StatisticsQuery) -> Result<(), AppError> {
    if let (Some(start), Some(end)) = (query.start, query.end)
        && end < start
    {
        return Err(AppError::Validation("end must not be before start".into()));
    }
    Ok(())
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct StatisticResponse {
    pub metric: StatisticMetric,
    /// Week start (Sunday) for weekly metrics.
    pub date: Option<NaiveDate>,
    /// 1 = Sunday .. 7 = Saturday, heatmap metrics only.
    pub day: Option<i16>,
    /// 0..=23, heatmap metrics only.
    pub hour: Option<i16>,
    pub value: f64,
    pub time_updated: DateTime<Utc>,
}

impl From<crate::entity::queue_statistic::Model> for StatisticResponse {
    fn from(m: crate::entity::queue_statistic::Model) -> Self {
        Self {
            metric: m.metric,
            date: m.date,
            day: m.day,
            hour: m.hour,
            value: m.value,
            time_updated: m.time_updated,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct RefreshStatisticsResponse {
    /// Number of statistic rows written.
    pub written: u64,
}
