pub mod activity_repository;
pub mod session_repository;
pub mod trade_repository;
pub mod user_repository;

use chrono::{DateTime, Timelike, Utc};

pub use activity_repository::{ActivityRepository, NewActivity};
pub use session_repository::SessionRepository;
pub use trade_repository::TradeRepository;
pub use user_repository::UserRepository;

/// Current time truncated to the microsecond precision the database keeps
pub fn db_now() -> DateTime<Utc> {
    truncate_micros(Utc::now())
}

pub(crate) fn truncate_micros(t: DateTime<Utc>) -> DateTime<Utc> {
    t.with_nanosecond(t.nanosecond() / 1_000 * 1_000).unwrap_or(t)
}
