pub mod auth;
pub mod error;
pub mod repositories;
pub mod routes;
pub mod seed;
pub mod services;
pub mod state;
pub mod views;

pub use error::{ApiError, ApiResult};
pub use routes::router;
pub use state::AppState;
