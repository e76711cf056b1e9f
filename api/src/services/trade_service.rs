//! Trade lifecycle: create, edit and stop, each recorded in the activity log

use rust_decimal::Decimal;
use sea_orm::prelude::DatabaseConnection;
use sea_orm::{ActiveValue, IntoActiveModel, TransactionTrait};
use serde::Deserialize;
use shared::entity::trades;
use shared::models::{
    Activity, PositionSide, Trade, ACTIVITY_TRADE_MODIFIED, ACTIVITY_TRADE_STARTED, ACTIVITY_TRADE_STOPPED,
    STATUS_CLOSED, STATUS_COMPLETED, STATUS_UPDATED,
};
use std::sync::Arc;

use crate::error::{ApiError, ApiResult};
use crate::repositories::{db_now, ActivityRepository, NewActivity, TradeRepository};

pub const DEFAULT_ACTIVITY_LIMIT: u64 = 10;
pub const MAX_ACTIVITY_LIMIT: u64 = 500;

/// Fields accepted when opening a trade
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTrade {
    pub symbol: String,
    pub position: String,
    pub quantity: Decimal,
    pub entry_price: Decimal,
    pub take_profit: Decimal,
    pub stop_loss: Decimal,
    pub api_used: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub current_price: Option<Decimal>,
}

/// Partial edit of an active trade; absent fields are left untouched
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TradeUpdate {
    pub symbol: Option<String>,
    pub position: Option<String>,
    pub quantity: Option<Decimal>,
    pub entry_price: Option<Decimal>,
    pub current_price: Option<Decimal>,
    pub take_profit: Option<Decimal>,
    pub stop_loss: Option<Decimal>,
    pub profit_loss: Option<Decimal>,
    pub profit_loss_percentage: Option<Decimal>,
    pub api_used: Option<String>,
    pub notes: Option<String>,
}

pub struct TradeService {
    db: Arc<DatabaseConnection>,
    trades: TradeRepository,
    activities: ActivityRepository,
}

impl TradeService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            trades: TradeRepository::new(db.clone()),
            activities: ActivityRepository::new(db.clone()),
            db,
        }
    }

    /// All of a user's trades, active first, then newest first
    pub async fn list_trades(&self, user_id: i32) -> ApiResult<Vec<Trade>> {
        let trades = self.trades.list_for_user(user_id).await?;
        Ok(trades.into_iter().map(Trade::from).collect())
    }

    pub async fn get_trade(&self, user_id: i32, trade_id: i32) -> ApiResult<Trade> {
        let model = self.owned_trade(user_id, trade_id).await?;
        Ok(model.into())
    }

    pub async fn create_trade(&self, user_id: i32, new_trade: NewTrade) -> ApiResult<Trade> {
        let symbol = required_text(&new_trade.symbol, "Symbol")?;
        let api_used = required_text(&new_trade.api_used, "Trading API")?;
        let position = parse_position(&new_trade.position)?;
        let quantity = positive(new_trade.quantity, "Quantity")?;
        let entry_price = positive(new_trade.entry_price, "Entry price")?;
        let take_profit = positive(new_trade.take_profit, "Take profit")?;
        let stop_loss = positive(new_trade.stop_loss, "Stop loss")?;
        let current_price = new_trade
            .current_price
            .map(|p| positive(p, "Current price"))
            .transpose()?;

        let now = db_now();
        let active_model = trades::ActiveModel {
            user_id: ActiveValue::Set(user_id),
            symbol: ActiveValue::Set(symbol.clone()),
            entry_price: ActiveValue::Set(entry_price),
            current_price: ActiveValue::Set(current_price),
            position: ActiveValue::Set(position.to_string()),
            quantity: ActiveValue::Set(quantity),
            take_profit: ActiveValue::Set(Some(take_profit)),
            stop_loss: ActiveValue::Set(Some(stop_loss)),
            profit_loss: ActiveValue::Set(None),
            profit_loss_percentage: ActiveValue::Set(None),
            api_used: ActiveValue::Set(Some(api_used)),
            notes: ActiveValue::Set(optional_text(new_trade.notes)),
            is_active: ActiveValue::Set(true),
            created_at: ActiveValue::Set(now),
            updated_at: ActiveValue::Set(now),
            closed_at: ActiveValue::Set(None),
            ..Default::default()
        };

        let txn = self.db.begin().await?;
        let trade = TradeRepository::insert(&txn, active_model).await?;
        ActivityRepository::append(
            &txn,
            NewActivity {
                user_id,
                trade_id: Some(trade.id),
                activity_type: ACTIVITY_TRADE_STARTED.to_string(),
                symbol,
                price: Some(entry_price),
                amount: Some(quantity),
                status: Some(STATUS_COMPLETED.to_string()),
                metadata: None,
            },
        )
        .await?;
        txn.commit().await?;

        tracing::info!("User {} opened trade {} on {}", user_id, trade.id, trade.symbol);
        Ok(trade.into())
    }

    pub async fn update_trade(&self, user_id: i32, trade_id: i32, update: TradeUpdate) -> ApiResult<Trade> {
        let existing = self.owned_trade(user_id, trade_id).await?;
        if !existing.is_active {
            return Err(ApiError::Conflict("Cannot edit a closed trade".to_string()));
        }

        let mut changed: Vec<&'static str> = Vec::new();
        let mut active_model = existing.clone().into_active_model();

        if let Some(symbol) = update.symbol.as_deref() {
            let symbol = required_text(symbol, "Symbol")?;
            if symbol != existing.symbol {
                changed.push("symbol");
                active_model.symbol = ActiveValue::Set(symbol);
            }
        }
        if let Some(position) = update.position.as_deref() {
            let position = parse_position(position)?.to_string();
            if position != existing.position {
                changed.push("position");
                active_model.position = ActiveValue::Set(position);
            }
        }
        if let Some(quantity) = update.quantity {
            let quantity = positive(quantity, "Quantity")?;
            if quantity != existing.quantity {
                changed.push("quantity");
                active_model.quantity = ActiveValue::Set(quantity);
            }
        }
        if let Some(entry_price) = update.entry_price {
            let entry_price = positive(entry_price, "Entry price")?;
            if entry_price != existing.entry_price {
                changed.push("entryPrice");
                active_model.entry_price = ActiveValue::Set(entry_price);
            }
        }
        if let Some(current_price) = update.current_price {
            let current_price = Some(positive(current_price, "Current price")?);
            if current_price != existing.current_price {
                changed.push("currentPrice");
                active_model.current_price = ActiveValue::Set(current_price);
            }
        }
        if let Some(take_profit) = update.take_profit {
            let take_profit = Some(positive(take_profit, "Take profit")?);
            if take_profit != existing.take_profit {
                changed.push("takeProfit");
                active_model.take_profit = ActiveValue::Set(take_profit);
            }
        }
        if let Some(stop_loss) = update.stop_loss {
            let stop_loss = Some(positive(stop_loss, "Stop loss")?);
            if stop_loss != existing.stop_loss {
                changed.push("stopLoss");
                active_model.stop_loss = ActiveValue::Set(stop_loss);
            }
        }
        if let Some(profit_loss) = update.profit_loss {
            if Some(profit_loss) != existing.profit_loss {
                changed.push("profitLoss");
                active_model.profit_loss = ActiveValue::Set(Some(profit_loss));
            }
        }
        if let Some(percentage) = update.profit_loss_percentage {
            if Some(percentage) != existing.profit_loss_percentage {
                changed.push("profitLossPercentage");
                active_model.profit_loss_percentage = ActiveValue::Set(Some(percentage));
            }
        }
        if let Some(api_used) = update.api_used.as_deref() {
            let api_used = Some(required_text(api_used, "Trading API")?);
            if api_used != existing.api_used {
                changed.push("apiUsed");
                active_model.api_used = ActiveValue::Set(api_used);
            }
        }
        if let Some(notes) = update.notes {
            let notes = optional_text(Some(notes));
            if notes != existing.notes {
                changed.push("notes");
                active_model.notes = ActiveValue::Set(notes);
            }
        }
        let now = db_now();
        active_model.updated_at = ActiveValue::Set(now);

        let txn = self.db.begin().await?;
        if !TradeRepository::touch_if_active(&txn, existing.id, now).await? {
            return Err(ApiError::Conflict("Cannot edit a closed trade".to_string()));
        }
        let trade = TradeRepository::update(&txn, active_model).await?;
        ActivityRepository::append(
            &txn,
            NewActivity {
                user_id,
                trade_id: Some(trade.id),
                activity_type: ACTIVITY_TRADE_MODIFIED.to_string(),
                symbol: existing.symbol.clone(),
                price: Some(existing.current_price.unwrap_or(existing.entry_price)),
                amount: Some(existing.quantity),
                status: Some(STATUS_UPDATED.to_string()),
                metadata: Some(serde_json::json!({ "changed": changed })),
            },
        )
        .await?;
        txn.commit().await?;

        tracing::info!("User {} modified trade {} ({:?})", user_id, trade.id, changed);
        Ok(trade.into())
    }

    /// Close an active trade
    pub async fn stop_trade(&self, user_id: i32, trade_id: i32) -> ApiResult<Trade> {
        let existing = self.owned_trade(user_id, trade_id).await?;
        if !existing.is_active {
            return Err(ApiError::Conflict("Trade is already closed".to_string()));
        }

        let txn = self.db.begin().await?;
        let trade = TradeRepository::close_if_active(&txn, existing.id, db_now())
            .await?
            .ok_or_else(|| ApiError::Conflict("Trade is already closed".to_string()))?;
        ActivityRepository::append(
            &txn,
            NewActivity {
                user_id,
                trade_id: Some(trade.id),
                activity_type: ACTIVITY_TRADE_STOPPED.to_string(),
                symbol: trade.symbol.clone(),
                price: Some(trade.current_price.unwrap_or(trade.entry_price)),
                amount: Some(trade.quantity),
                status: Some(STATUS_CLOSED.to_string()),
                metadata: None,
            },
        )
        .await?;
        txn.commit().await?;

        tracing::info!("User {} stopped trade {}", user_id, trade.id);
        Ok(trade.into())
    }

    /// Newest activities, `limit` clamped to 1..=500 and defaulting to 10
    pub async fn recent_activities(&self, user_id: i32, limit: Option<u64>) -> ApiResult<Vec<Activity>> {
        let limit = limit.unwrap_or(DEFAULT_ACTIVITY_LIMIT).clamp(1, MAX_ACTIVITY_LIMIT);
        let activities = self.activities.recent_for_user(user_id, limit).await?;
        Ok(activities.into_iter().map(Activity::from).collect())
    }

    pub async fn all_activities(&self, user_id: i32) -> ApiResult<Vec<Activity>> {
        let activities = self.activities.list_for_user(user_id).await?;
        Ok(activities.into_iter().map(Activity::from).collect())
    }

    pub async fn count_trades(&self, user_id: i32) -> ApiResult<u64> {
        Ok(self.trades.count_for_user(user_id).await?)
    }

    async fn owned_trade(&self, user_id: i32, trade_id: i32) -> ApiResult<trades::Model> {
        let trade = self
            .trades
            .find_by_id(trade_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Trade not found".to_string()))?;
        if trade.user_id != user_id {
            tracing::warn!("User {} tried to access trade {} of user {}", user_id, trade_id, trade.user_id);
            return Err(ApiError::Forbidden("Not authorized to access this trade".to_string()));
        }
        Ok(trade)
    }
}

fn required_text(value: &str, field: &str) -> ApiResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ApiError::validation(format!("{} is required", field)));
    }
    Ok(value.to_string())
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_position(value: &str) -> ApiResult<PositionSide> {
    value
        .parse()
        .map_err(|_| ApiError::validation("Position must be Long or Short"))
}

fn positive(value: Decimal, field: &str) -> ApiResult<Decimal> {
    if value <= Decimal::ZERO {
        return Err(ApiError::validation(format!("{} must be a positive number", field)));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_positive_rejects_zero_and_negative() {
        assert_eq!(positive(dec!(0.5), "Quantity").unwrap(), dec!(0.5));
        assert!(positive(dec!(0), "Quantity").is_err());
        assert!(positive(dec!(-1), "Quantity").is_err());
    }

    #[test]
    fn test_text_helpers() {
        assert_eq!(required_text("  BTC/USD ", "Symbol").unwrap(), "BTC/USD");
        assert!(required_text("   ", "Symbol").is_err());
        assert_eq!(optional_text(Some("  ".to_string())), None);
        assert_eq!(optional_text(Some(" hold ".to_string())), Some("hold".to_string()));
    }

    #[test]
    fn test_new_trade_accepts_string_and_number_decimals() {
        let body = serde_json::json!({
            "symbol": "ETH/USD",
            "position": "Long",
            "quantity": "0.75",
            "entryPrice": 2435.2,
            "takeProfit": "2650",
            "stopLoss": "2300",
            "apiUsed": "Coinbase Pro"
        });
        let trade: NewTrade = serde_json::from_value(body).unwrap();
        assert_eq!(trade.quantity, dec!(0.75));
        assert_eq!(trade.take_profit, dec!(2650));
        assert!(trade.notes.is_none());
    }
}
