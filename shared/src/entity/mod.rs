//! `SeaORM` entities for the paper-trading store

pub mod sessions;
pub mod trade_activities;
pub mod trades;
pub mod users;
