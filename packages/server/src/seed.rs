use sea_orm::sea_query::{Index, IndexCreateStatement, OnConflict, PostgresQueryBuilder};
use sea_orm::*;
use tracing::info;

use crate::entity::{question, queue_statistic, role, role_permission};

/// Default roles seeded on startup.
const DEFAULT_ROLES: &[&str] = &["admin", "user"];

/// Default role-permission mappings seeded on startup.
const DEFAULT_MAPPINGS: &[(&str, &str)] = &[
    ("admin", "semester:manage"),
    ("admin", "course:create"),
    ("admin", "course:manage_any"),
    ("user", "course:create"),
];

/// Seed the `role` and `role_permission` tables with defaults.
pub async fn seed_role_permissions(db: &DatabaseConnection) -> Result<(), DbErr> {
    let mut roles_inserted = 0u32;
    for &name in DEFAULT_ROLES {
        let model = role::ActiveModel {
            name: Set(name.to_string()),
        };

        let result = role::Entity::insert(model)
            .on_conflict(OnConflict::column(role::Column::Name).do_nothing().to_owned())
            .exec_without_returning(db)
            .await;

        match result {
            Ok(_) => roles_inserted += 1,
            Err(DbErr::RecordNotInserted) => {}
            Err(e) => return Err(e),
        }
    }

    if roles_inserted > 0 {
        info!("Seeded {} new roles", roles_inserted);
    }

    let mut perms_inserted = 0u32;
    for &(role, permission) in DEFAULT_MAPPINGS {
        let model = role_permission::ActiveModel {
            role: Set(role.to_string()),
            permission: Set(permission.to_string()),
        };

        let result = role_permission::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([
                    role_permission::Column::Role,
                    role_permission::Column::Permission,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(db)
            .await;

        match result {
            Ok(_) => perms_inserted += 1,
            Err(DbErr::RecordNotInserted) => {}
            Err(e) => return Err(e),
        }
    }

    if perms_inserted > 0 {
        info!("Seeded {} new role-permission mappings", perms_inserted);
    }

    Ok(())
}

async fn create_index(db: &DatabaseConnection, name: &str, stmt: &IndexCreateStatement) {
    match db.execute_unprepared(&stmt.to_string(PostgresQueryBuilder)).await {
        Ok(_) => info!("Ensured index {} exists", name),
        Err(e) => tracing::warn!("Failed to create index {}: {}", name, e),
    }
}

/// Ensure required database indexes exist.
///
/// Schema sync only creates single-column indexes, so the composite ones
/// are created here on startup.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    // Queue listings and position lookups:
    // WHERE queue_id = ? ORDER BY time_asked
    create_index(
        db,
        "idx_question_queue_asked",
        Index::create()
            .if_not_exists()
            .name("idx_question_queue_asked")
            .table(question::Entity)
            .col(question::Column::QueueId)
            .col(question::Column::TimeAsked),
    )
    .await;

    // Outstanding-question check on create:
    // WHERE asked_by_id = ? AND time_answered IS NULL
    create_index(
        db,
        "idx_question_asker_answered",
        Index::create()
            .if_not_exists()
            .name("idx_question_asker_answered")
            .table(question::Entity)
            .col(question::Column::AskedById)
            .col(question::Column::TimeAnswered),
    )
    .await;

    // Statistics upsert target. `date`, `day` and `hour` are nullable, so
    // NULLs must compare equal for ON CONFLICT to match (PostgreSQL 15+).
    let bucket = Index::create()
        .if_not_exists()
        .unique()
        .nulls_not_distinct()
        .name("uq_queue_statistic_bucket")
        .table(queue_statistic::Entity)
        .col(queue_statistic::Column::QueueId)
        .col(queue_statistic::Column::Metric)
        .col(queue_statistic::Column::Date)
        .col(queue_statistic::Column::Day)
        .col(queue_statistic::Column::Hour)
        .to_owned();
    db.execute_unprepared(&bucket.to_string(PostgresQueryBuilder))
        .await?;
    info!("Ensured index uq_queue_statistic_bucket exists");

    Ok(())
}
