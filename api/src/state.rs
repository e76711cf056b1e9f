use sea_orm::DatabaseConnection;
use shared::Config;
use std::sync::Arc;

use crate::services::{TradeService, UserService};

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: Arc<Config>,
    pub users: Arc<UserService>,
    pub trades: Arc<TradeService>,
}

impl AppState {
    pub fn new(db: DatabaseConnection, config: Config) -> Self {
        let db = Arc::new(db);
        let users = Arc::new(UserService::new(db.clone(), config.session_ttl_hours));
        let trades = Arc::new(TradeService::new(db.clone()));

        AppState {
            db,
            config: Arc::new(config),
            users,
            trades,
        }
    }
}
