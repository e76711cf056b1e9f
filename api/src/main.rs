use anyhow::{Context, Result};
use api::{router, seed, AppState};
use migration::{Migrator, MigratorTrait};
use shared::{get_db_connection, Config, LogFormat};
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// How often expired sessions are purged
const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match format {
        LogFormat::Json => tracing_subscriber::fmt().json().with_env_filter(filter).init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    init_tracing(config.log_format);

    info!(
        "Starting Paper Trader API server {} ({})...",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH")
    );

    let db = get_db_connection(&config.database_url)
        .await
        .context("connecting to database")?;
    info!("Connected to database");

    Migrator::up(&db, None).await.context("running migrations")?;
    info!("Migrations applied");

    let bind_addr = config.bind_addr.clone();
    let state = AppState::new(db, config);

    if state.config.seed_demo {
        seed::seed_demo(state.db.clone()).await.context("seeding demo data")?;
    }

    let users = state.users.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            if let Err(e) = users.purge_expired_sessions().await {
                error!("Failed to purge expired sessions: {}", e);
            }
        }
    });

    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding {}", bind_addr))?;
    info!("API server listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("API server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
}
