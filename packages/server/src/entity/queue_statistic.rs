use common::StatisticMetric;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Precomputed aggregate for one queue, metric and bucket.
///
/// Weekly metrics set `date` (the Sunday starting the week); heatmap
/// metrics set `day` (1 = Sunday .. 7 = Saturday) and `hour` (0..=23).
/// (queue_id, metric, date, day, hour) is unique with NULLs treated as
/// equal; the index is created by `seed::ensure_indexes`.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "queue_statistic")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub queue_id: i32,
    #[sea_orm(belongs_to, from = "queue_id", to = "id")]
    pub queue: HasOne<super::queue::Entity>,

    #[sea_orm(indexed)]
    pub metric: StatisticMetric,

    pub date: Option<Date>,
    pub day: Option<i16>,
    pub hour: Option<i16>,

    pub value: f64,

    pub time_updated: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
