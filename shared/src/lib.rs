pub mod config;
pub mod database;
pub mod display;
pub mod entity;
pub mod filters;
pub mod metrics;
pub mod models;
pub mod theme;

pub use config::{Config, LogFormat};
pub use database::{get_db_connection, DbConn};
pub use models::*;
pub use theme::Theme;
