use chrono_tz::Tz;
use tracing::{Level, info};

use server::config::AppConfig;
use server::state::AppState;
use server::{build_router, database, seed, statistics};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let config = AppConfig::load()?;
    let timezone: Tz = config
        .statistics
        .timezone
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid statistics.timezone: {e}"))?;

    let db = database::init_db(&config.database.url).await?;
    seed::seed_role_permissions(&db).await?;
    seed::ensure_indexes(&db).await?;

    if config.statistics.enabled {
        tokio::spawn(statistics::run_statistics_task(
            db.clone(),
            timezone,
            config.statistics.clone(),
        ));
    } else {
        info!("Statistics task disabled");
    }

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState {
        db,
        config,
        timezone,
    };
    let app = build_router(state);

    info!("Server running at http://{}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
