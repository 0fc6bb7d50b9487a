use chrono_tz::Tz;
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: AppConfig,
    /// Parsed `statistics.timezone`, used for every local-time bucket.
    pub timezone: Tz,
}
