//! Demo account with a few sample trades

use anyhow::Result;
use rust_decimal::Decimal;
use sea_orm::{ActiveValue, DatabaseConnection, TransactionTrait};
use shared::entity::trades;
use shared::models::{
    ACTIVITY_TRADE_STARTED, ACTIVITY_TRADE_STOPPED, STATUS_CLOSED, STATUS_COMPLETED, STATUS_UPDATED,
};
use std::str::FromStr;
use std::sync::Arc;

use crate::auth::hash_password;
use crate::repositories::{db_now, ActivityRepository, NewActivity, TradeRepository, UserRepository};

pub const DEMO_USERNAME: &str = "demo";
pub const DEMO_PASSWORD: &str = "password";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    Seeded { trades: usize, activities: usize },
    /// The demo user already had trades
    Skipped { existing_trades: u64 },
}

struct SampleTrade {
    symbol: &'static str,
    entry_price: &'static str,
    current_price: &'static str,
    quantity: &'static str,
    take_profit: &'static str,
    stop_loss: &'static str,
    profit_loss: &'static str,
    profit_loss_percentage: &'static str,
    api_used: &'static str,
}

const SAMPLE_TRADES: [SampleTrade; 3] = [
    SampleTrade {
        symbol: "BTC/USD",
        entry_price: "36742.50",
        current_price: "37842.18",
        quantity: "0.05",
        take_profit: "38950.00",
        stop_loss: "35250.00",
        profit_loss: "1099.68",
        profit_loss_percentage: "2.99",
        api_used: "Binance",
    },
    SampleTrade {
        symbol: "ETH/USD",
        entry_price: "2435.20",
        current_price: "2512.80",
        quantity: "0.75",
        take_profit: "2650.00",
        stop_loss: "2300.00",
        profit_loss: "77.60",
        profit_loss_percentage: "3.19",
        api_used: "Coinbase Pro",
    },
    SampleTrade {
        symbol: "XRP/USD",
        entry_price: "0.6420",
        current_price: "0.6280",
        quantity: "1000",
        take_profit: "0.7100",
        stop_loss: "0.6000",
        profit_loss: "-0.0140",
        profit_loss_percentage: "-2.18",
        api_used: "Kraken",
    },
];

fn dec(value: &str) -> Result<Decimal> {
    Ok(Decimal::from_str(value)?)
}

fn sample_activity(
    user_id: i32,
    trade_id: Option<i32>,
    activity_type: &str,
    symbol: &str,
    price: &str,
    amount: &str,
    status: &str,
) -> Result<NewActivity> {
    Ok(NewActivity {
        user_id,
        trade_id,
        activity_type: activity_type.to_string(),
        symbol: symbol.to_string(),
        price: Some(dec(price)?),
        amount: Some(dec(amount)?),
        status: Some(status.to_string()),
        metadata: None,
    })
}

/// Create the demo user (if missing) and, when it has no trades yet, its sample trades and activities
pub async fn seed_demo(db: Arc<DatabaseConnection>) -> Result<SeedOutcome> {
    let users = UserRepository::new(db.clone());
    let user = match users.find_by_username(DEMO_USERNAME).await? {
        Some(user) => {
            tracing::info!("Using existing demo user with ID: {}", user.id);
            user
        }
        None => {
            let user = users.create(DEMO_USERNAME, hash_password(DEMO_PASSWORD)).await?;
            tracing::info!("Created demo user with ID: {}", user.id);
            user
        }
    };

    let existing_trades = TradeRepository::new(db.clone()).count_for_user(user.id).await?;
    if existing_trades > 0 {
        tracing::info!("Found {} existing trades, skipping seed", existing_trades);
        return Ok(SeedOutcome::Skipped { existing_trades });
    }

    let txn = db.begin().await?;
    let mut trade_ids = Vec::with_capacity(SAMPLE_TRADES.len());
    for sample in &SAMPLE_TRADES {
        let now = db_now();
        let trade = TradeRepository::insert(
            &txn,
            trades::ActiveModel {
                user_id: ActiveValue::Set(user.id),
                symbol: ActiveValue::Set(sample.symbol.to_string()),
                entry_price: ActiveValue::Set(dec(sample.entry_price)?),
                current_price: ActiveValue::Set(Some(dec(sample.current_price)?)),
                position: ActiveValue::Set("Long".to_string()),
                quantity: ActiveValue::Set(dec(sample.quantity)?),
                take_profit: ActiveValue::Set(Some(dec(sample.take_profit)?)),
                stop_loss: ActiveValue::Set(Some(dec(sample.stop_loss)?)),
                profit_loss: ActiveValue::Set(Some(dec(sample.profit_loss)?)),
                profit_loss_percentage: ActiveValue::Set(Some(dec(sample.profit_loss_percentage)?)),
                api_used: ActiveValue::Set(Some(sample.api_used.to_string())),
                notes: ActiveValue::Set(None),
                is_active: ActiveValue::Set(true),
                created_at: ActiveValue::Set(now),
                updated_at: ActiveValue::Set(now),
                closed_at: ActiveValue::Set(None),
                ..Default::default()
            },
        )
        .await?;
        trade_ids.push(trade.id);
    }

    let activities = vec![
        sample_activity(user.id, Some(trade_ids[0]), ACTIVITY_TRADE_STARTED, "BTC/USD", "36742.50", "0.05", STATUS_COMPLETED)?,
        sample_activity(user.id, Some(trade_ids[1]), ACTIVITY_TRADE_STARTED, "ETH/USD", "2435.20", "0.75", STATUS_COMPLETED)?,
        sample_activity(user.id, Some(trade_ids[1]), "Take Profit Modified", "ETH/USD", "2435.20", "0.75", STATUS_UPDATED)?,
        sample_activity(user.id, Some(trade_ids[2]), ACTIVITY_TRADE_STARTED, "XRP/USD", "0.6420", "1000", STATUS_COMPLETED)?,
        sample_activity(user.id, None, ACTIVITY_TRADE_STOPPED, "SOL/USD", "82.30", "2.5", STATUS_CLOSED)?,
    ];
    let activity_count = activities.len();
    for new_activity in activities {
        ActivityRepository::append(&txn, new_activity).await?;
    }
    txn.commit().await?;

    tracing::info!(
        "Seeded demo user {} with {} trades and {} activities",
        user.id,
        trade_ids.len(),
        activity_count
    );
    Ok(SeedOutcome::Seeded {
        trades: trade_ids.len(),
        activities: activity_count,
    })
}
