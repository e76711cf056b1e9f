#![allow(dead_code)]

use api::services::NewTrade;
use api::AppState;
use migration::{Migrator, MigratorTrait};
use rust_decimal::Decimal;
use sea_orm::{ConnectOptions, Database};
use shared::Config;

/// Fresh app state over a migrated in-memory SQLite database
pub async fn test_state() -> AppState {
    let mut options = ConnectOptions::new("sqlite::memory:".to_string());
    options.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = Database::connect(options).await.expect("connect to in-memory sqlite");
    Migrator::up(&db, None).await.expect("run migrations");

    let config = Config {
        database_url: "sqlite::memory:".to_string(),
        ..Config::default()
    };
    AppState::new(db, config)
}

pub fn new_trade(symbol: &str, entry_price: Decimal, quantity: Decimal) -> NewTrade {
    NewTrade {
        symbol: symbol.to_string(),
        position: "Long".to_string(),
        quantity,
        entry_price,
        take_profit: entry_price * Decimal::from(2),
        stop_loss: entry_price / Decimal::from(2),
        api_used: "Binance".to_string(),
        notes: None,
        current_price: None,
    }
}
