pub mod trade_service;
pub mod user_service;

pub use trade_service::{NewTrade, TradeService, TradeUpdate};
pub use user_service::{ProfileUpdate, UserService};
