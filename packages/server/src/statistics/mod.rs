pub mod aggregate;
pub mod time;

use std::time::Duration as StdDuration;

use anyhow::Context;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use common::StatisticsConfig;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QuerySelect, Set,
};
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use crate::entity::{question, queue, queue_statistic};
use aggregate::{QuestionSample, StatRow, heatmap_rows, weekly_rows};

/// Questions of a queue that touched the week starting at `week_start`.
///
/// The UTC window is padded by a day on each side so every local date in the
/// week is covered; the aggregations filter exactly.
async fn load_week_samples<C: ConnectionTrait>(
    db: &C,
    queue_id: i32,
    week_start: NaiveDate,
) -> Result<Vec<QuestionSample>, DbErr> {
    let from = week_start.and_time(NaiveTime::MIN).and_utc() - Duration::days(1);
    let to = from + Duration::days(10);

    let rows = question::Entity::find()
        .filter(question::Column::QueueId.eq(queue_id))
        .filter(
            Condition::any()
                .add(question::Column::TimeAsked.between(from, to))
                .add(question::Column::TimeStarted.between(from, to))
                .add(question::Column::TimeAnswered.between(from, to)),
        )
        .all(db)
        .await?;
    Ok(rows.iter().map(QuestionSample::from).collect())
}

/// Questions feeding the heatmaps; `lookback_days == 0` loads all history.
async fn load_heatmap_samples<C: ConnectionTrait>(
    db: &C,
    queue_id: i32,
    now: DateTime<Utc>,
    lookback_days: u32,
) -> Result<Vec<QuestionSample>, DbErr> {
    let mut select = question::Entity::find().filter(question::Column::QueueId.eq(queue_id));
    if lookback_days > 0 {
        select = select
            .filter(question::Column::TimeAsked.gte(now - Duration::days(lookback_days as i64)));
    }
    let rows = select.all(db).await?;
    Ok(rows.iter().map(QuestionSample::from).collect())
}

/// Insert or overwrite each row keyed by (queue, metric, date, day, hour).
///
/// Relies on the `uq_queue_statistic_bucket` index created by
/// [`crate::seed::ensure_indexes`].
pub async fn upsert_rows<C: ConnectionTrait>(
    db: &C,
    queue_id: i32,
    rows: &[StatRow],
    now: DateTime<Utc>,
) -> Result<u64, DbErr> {
    if rows.is_empty() {
        return Ok(0);
    }

    let models = rows.iter().map(|row| queue_statistic::ActiveModel {
        queue_id: Set(queue_id),
        metric: Set(row.metric),
        date: Set(row.date),
        day: Set(row.day),
        hour: Set(row.hour),
        value: Set(row.value),
        time_updated: Set(now),
        ..Default::default()
    });

    queue_statistic::Entity::insert_many(models)
        .on_conflict(
            OnConflict::columns([
                queue_statistic::Column::QueueId,
                queue_statistic::Column::Metric,
                queue_statistic::Column::Date,
                queue_statistic::Column::Day,
                queue_statistic::Column::Hour,
            ])
            .update_columns([
                queue_statistic::Column::Value,
                queue_statistic::Column::TimeUpdated,
            ])
            .to_owned(),
        )
        .exec_without_returning(db)
        .await?;

    Ok(rows.len() as u64)
}

/// Recompute the current week's metrics and both heatmaps for one queue.
///
/// No row lock is taken on the queue, so students can keep asking while the
/// history loads. Concurrent refreshes of one queue both land on the same
/// keys. Returns the number of rows written.
pub async fn compute_queue_statistics(
    db: &DatabaseConnection,
    tz: Tz,
    config: &StatisticsConfig,
    queue_id: i32,
    now: DateTime<Utc>,
) -> anyhow::Result<u64> {
    let week_start = time::week_start(now.with_timezone(&tz).date_naive());

    queue::Entity::find_by_id(queue_id)
        .one(db)
        .await?
        .with_context(|| format!("queue {queue_id} not found"))?;

    let weekly = load_week_samples(db, queue_id, week_start).await?;
    let history = load_heatmap_samples(db, queue_id, now, config.heatmap_lookback_days).await?;

    let mut rows = weekly_rows(&weekly, tz, week_start);
    rows.extend(heatmap_rows(&history, tz, now));

    Ok(upsert_rows(db, queue_id, &rows, now).await?)
}

/// Recompute statistics for every non-archived queue. One queue failing does
/// not stop the others.
pub async fn sweep(
    db: &DatabaseConnection,
    tz: Tz,
    config: &StatisticsConfig,
) -> anyhow::Result<()> {
    let queue_ids: Vec<i32> = queue::Entity::find()
        .select_only()
        .column(queue::Column::Id)
        .filter(queue::Column::Archived.eq(false))
        .into_tuple()
        .all(db)
        .await?;

    let now = Utc::now();
    let mut failed = 0usize;
    for queue_id in &queue_ids {
        if let Err(e) = compute_queue_statistics(db, tz, config, *queue_id, now).await {
            failed += 1;
            error!(queue_id, error = %e, "Failed to compute queue statistics");
        }
    }

    info!(queues = queue_ids.len(), failed, "Statistics sweep finished");
    Ok(())
}

/// Run the periodic statistics sweep as a background task.
pub async fn run_statistics_task(db: DatabaseConnection, tz: Tz, config: StatisticsConfig) {
    info!(
        interval_secs = config.interval_secs,
        timezone = %tz,
        heatmap_lookback_days = config.heatmap_lookback_days,
        "Starting statistics task"
    );

    let mut interval = tokio::time::interval(StdDuration::from_secs(config.interval_secs.max(1)));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        interval.tick().await;

        if let Err(e) = sweep(&db, tz, &config).await {
            error!(error = %e, "Statistics sweep failed");
        }
    }
}
