use anyhow::{Context, Result};
use api::seed::{seed_demo, SeedOutcome};
use migration::{Migrator, MigratorTrait};
use shared::{get_db_connection, Config};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Starting database seed...");

    let config = Config::from_env()?;
    let db = get_db_connection(&config.database_url)
        .await
        .context("connecting to database")?;
    Migrator::up(&db, None).await.context("running migrations")?;

    match seed_demo(Arc::new(db)).await? {
        SeedOutcome::Seeded { trades, activities } => {
            tracing::info!("Database seed completed: {} trades, {} activities", trades, activities)
        }
        SeedOutcome::Skipped { existing_trades } => {
            tracing::info!("Demo user already has {} trades, nothing to do", existing_trades)
        }
    }
    Ok(())
}
