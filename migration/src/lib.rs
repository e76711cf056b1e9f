pub use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::DbBackend;

mod m20250401_000001_create_users;
mod m20250401_000002_create_trades;
mod m20250401_000003_create_trade_activities;
mod m20250401_000004_create_sessions;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250401_000001_create_users::Migration),
            Box::new(m20250401_000002_create_trades::Migration),
            Box::new(m20250401_000003_create_trade_activities::Migration),
            Box::new(m20250401_000004_create_sessions::Migration),
        ]
    }
}

/// Decimal column. SQLite's backend rejects precision above 16, so it is capped there.
pub(crate) fn decimal_col<T: IntoIden>(manager: &SchemaManager, name: T, precision: u32, scale: u32) -> ColumnDef {
    let precision = match manager.get_database_backend() {
        DbBackend::Sqlite => precision.min(SQLITE_MAX_DECIMAL_PRECISION),
        _ => precision,
    };
    let mut def = ColumnDef::new(name);
    def.decimal_len(precision, scale);
    def
}

const SQLITE_MAX_DECIMAL_PRECISION: u32 = 16;

/// UTC timestamp column. MySQL gets microsecond precision so activity ordering survives a round trip.
pub(crate) fn timestamp_col<T: IntoIden>(manager: &SchemaManager, name: T) -> ColumnDef {
    let mut def = ColumnDef::new(name);
    match manager.get_database_backend() {
        DbBackend::MySql => def.custom(Alias::new("timestamp(6)")),
        _ => def.timestamp_with_time_zone(),
    };
    def
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm_migration::sea_orm::{ConnectOptions, Database};

    #[tokio::test]
    async fn test_migrations_apply_on_sqlite() {
        let mut options = ConnectOptions::new("sqlite::memory:".to_string());
        options.max_connections(1).min_connections(1).sqlx_logging(false);
        let db = Database::connect(options).await.unwrap();

        Migrator::up(&db, None).await.unwrap();

        let manager = SchemaManager::new(&db);
        for table in ["users", "trades", "trade_activities", "sessions"] {
            assert!(manager.has_table(table).await.unwrap(), "missing table {}", table);
        }
        assert!(manager.has_column("trades", "entry_price").await.unwrap());

        Migrator::down(&db, None).await.unwrap();
        assert!(!manager.has_table("trades").await.unwrap());
    }
}
