use axum::{
    Json,
    extract::{Path, State},
};
use sea_orm::*;
use tracing::instrument;

use crate::entity::queue_statistic;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::request::AppQuery;
use crate::models::statistics::*;
use crate::state::AppState;
use crate::statistics::compute_queue_statistics;
use crate::utils::course::{find_queue_in_course, require_leadership, require_staff};

#[utoipa::path(
    get,
    path = "/",
    tag = "Statistics",
    operation_id = "listQueueStatistics",
    summary = "List stored statistics for a queue",
    description = "Returns precomputed statistics, optionally filtered by metric and by week start range. `start`/`end` only restrict weekly metrics; heatmap cells are always returned when their metric is selected. Requires a staff role.",
    params(
        ("id" = i32, Path, description = "Course ID"),
        ("queue_id" = i32, Path, description = "Queue ID"),
        StatisticsQuery,
    ),
    responses(
        (status = 200, description = "List of statistics", body = Vec<StatisticResponse>),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Course or queue not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(course_id, queue_id))]
pub async fn list_statistics(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((course_id, queue_id)): Path<(i32, i32)>,
    AppQuery(query): AppQuery<StatisticsQuery>,
) -> Result<Json<Vec<StatisticResponse>>, AppError> {
    validate_statistics_query(&query)?;
    require_staff(&state.db, course_id, &auth_user).await?;
    find_queue_in_course(&state.db, course_id, queue_id).await?;

    let mut select = queue_statistic::Entity::find()
        .filter(queue_statistic::Column::QueueId.eq(queue_id))
        .order_by_asc(queue_statistic::Column::Metric)
        .order_by_asc(queue_statistic::Column::Date)
        .order_by_asc(queue_statistic::Column::Day)
        .order_by_asc(queue_statistic::Column::Hour);
    if let Some(metric) = query.metric {
        select = select.filter(queue_statistic::Column::Metric.eq(metric));
    }
    if let Some(start) = query.start {
        select = select.filter(
            Condition::any()
                .add(queue_statistic::Column::Date.is_null())
                .add(queue_statistic::Column::Date.gte(start)),
        );
    }
    if let Some(end) = query.end {
        select = select.filter(
            Condition::any()
                .add(queue_statistic::Column::Date.is_null())
                .add(queue_statistic::Column::Date.lte(end)),
        );
    }

    let items = select
        .all(&state.db)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    Ok(Json(items))
}

#[utoipa::path(
    post,
    path = "/refresh",
    tag = "Statistics",
    operation_id = "refreshQueueStatistics",
    summary = "Recompute statistics for a queue now",
    description = "Synchronously recomputes the current week's metrics and both heatmaps. Idempotent. Requires a leadership role.",
    params(
        ("id" = i32, Path, description = "Course ID"),
        ("queue_id" = i32, Path, description = "Queue ID"),
    ),
    responses(
        (status = 200, description = "Statistics recomputed", body = RefreshStatisticsResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Course or queue not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(course_id, queue_id))]
pub async fn refresh_statistics(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((course_id, queue_id)): Path<(i32, i32)>,
) -> Result<Json<RefreshStatisticsResponse>, AppError> {
    require_leadership(&state.db, course_id, &auth_user).await?;
    find_queue_in_course(&state.db, course_id, queue_id).await?;

    let written = compute_queue_statistics(
        &state.db,
        state.timezone,
        &state.config.statistics,
        queue_id,
        chrono::Utc::now(),
    )
    .await
    .map_err(|e| AppError::Internal(format!("Statistics refresh failed: {e:#}")))?;

    Ok(Json(RefreshStatisticsResponse { written }))
}
