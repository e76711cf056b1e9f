use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::entity::{trade_activities, trades, users};

/// Activity type tags written by the trade lifecycle
pub const ACTIVITY_TRADE_STARTED: &str = "Trade Started";
pub const ACTIVITY_TRADE_MODIFIED: &str = "Trade Modified";
pub const ACTIVITY_TRADE_STOPPED: &str = "Trade Stopped";

/// Activity status labels written by the trade lifecycle
pub const STATUS_COMPLETED: &str = "Completed";
pub const STATUS_UPDATED: &str = "Updated";
pub const STATUS_CLOSED: &str = "Closed";

/// Side of a simulated position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PositionSide {
    #[default]
    Long,
    Short,
}

impl PositionSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            PositionSide::Long => "Long",
            PositionSide::Short => "Short",
        }
    }
}

impl fmt::Display for PositionSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PositionSide {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "long" => Ok(PositionSide::Long),
            "short" => Ok(PositionSide::Short),
            other => Err(anyhow::anyhow!("Unknown position side: {}", other)),
        }
    }
}

/// A user's simulated position, as served to the dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    pub id: i32,
    pub user_id: i32,
    pub symbol: String,
    pub position: PositionSide,
    pub quantity: Decimal,
    pub entry_price: Decimal,
    pub current_price: Option<Decimal>,
    pub take_profit: Option<Decimal>,
    pub stop_loss: Option<Decimal>,
    pub profit_loss: Option<Decimal>,
    pub profit_loss_percentage: Option<Decimal>,
    pub api_used: Option<String>,
    pub notes: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

impl Trade {
    /// Current price, falling back to the entry price when none was recorded
    pub fn display_price(&self) -> Decimal {
        self.current_price.unwrap_or(self.entry_price)
    }

    /// Time the trade left the active set, or its creation time while still open
    pub fn event_time(&self) -> DateTime<Utc> {
        self.closed_at.unwrap_or(self.created_at)
    }

    /// Stored profit/loss as a float, zero when absent
    pub fn profit_loss_or_zero(&self) -> f64 {
        decimal_to_f64(self.profit_loss).unwrap_or(0.0)
    }
}

impl From<trades::Model> for Trade {
    fn from(model: trades::Model) -> Self {
        let position = model.position.parse().unwrap_or_else(|_| {
            tracing::warn!(
                "Trade {} has unknown position '{}', treating as Long",
                model.id,
                model.position
            );
            PositionSide::Long
        });

        Trade {
            id: model.id,
            user_id: model.user_id,
            symbol: model.symbol,
            position,
            quantity: model.quantity,
            entry_price: model.entry_price,
            current_price: model.current_price,
            take_profit: model.take_profit,
            stop_loss: model.stop_loss,
            profit_loss: model.profit_loss,
            profit_loss_percentage: model.profit_loss_percentage,
            api_used: model.api_used,
            notes: model.notes,
            is_active: model.is_active,
            created_at: model.created_at,
            updated_at: model.updated_at,
            closed_at: model.closed_at,
        }
    }
}

/// Immutable audit-log entry describing a trade lifecycle event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: i32,
    pub user_id: i32,
    pub trade_id: Option<i32>,
    #[serde(rename = "type")]
    pub activity_type: String,
    pub symbol: String,
    pub price: Option<Decimal>,
    pub amount: Option<Decimal>,
    pub status: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl From<trade_activities::Model> for Activity {
    fn from(model: trade_activities::Model) -> Self {
        Activity {
            id: model.id,
            user_id: model.user_id,
            trade_id: model.trade_id,
            activity_type: model.activity_type,
            symbol: model.symbol,
            price: model.price,
            amount: model.amount,
            status: model.status,
            metadata: model.metadata,
            created_at: model.created_at,
        }
    }
}

/// Account view without the password hash
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i32,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        User {
            id: model.id,
            username: model.username,
            created_at: model.created_at,
        }
    }
}

pub(crate) fn decimal_to_f64(value: Option<Decimal>) -> Option<f64> {
    value.and_then(|d| d.to_f64())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn model() -> trades::Model {
        let now = Utc::now();
        trades::Model {
            id: 7,
            user_id: 1,
            symbol: "BTC/USD".to_string(),
            entry_price: dec!(100),
            current_price: None,
            position: "short".to_string(),
            quantity: dec!(2),
            take_profit: Some(dec!(90)),
            stop_loss: Some(dec!(120)),
            profit_loss: None,
            profit_loss_percentage: None,
            api_used: Some("Binance".to_string()),
            notes: None,
            is_active: true,
            created_at: now,
            updated_at: now,
            closed_at: None,
        }
    }

    #[test]
    fn test_position_side_parsing() {
        assert_eq!("Long".parse::<PositionSide>().unwrap(), PositionSide::Long);
        assert_eq!(" SHORT ".parse::<PositionSide>().unwrap(), PositionSide::Short);
        assert!("sideways".parse::<PositionSide>().is_err());
    }

    #[test]
    fn test_trade_from_model() {
        let trade = Trade::from(model());
        assert_eq!(trade.position, PositionSide::Short);
        assert_eq!(trade.display_price(), dec!(100));
        assert_eq!(trade.event_time(), trade.created_at);
        assert_eq!(trade.profit_loss_or_zero(), 0.0);
    }

    #[test]
    fn test_trade_serializes_camel_case() {
        let trade = Trade::from(model());
        let json = serde_json::to_value(&trade).unwrap();
        assert_eq!(json["entryPrice"], "100");
        assert_eq!(json["position"], "Short");
        assert_eq!(json["isActive"], true);
        assert!(json["closedAt"].is_null());
    }

    #[test]
    fn test_activity_type_field_name() {
        let activity = Activity {
            id: 1,
            user_id: 1,
            trade_id: Some(7),
            activity_type: ACTIVITY_TRADE_STARTED.to_string(),
            symbol: "BTC/USD".to_string(),
            price: Some(dec!(100)),
            amount: Some(dec!(2)),
            status: Some(STATUS_COMPLETED.to_string()),
            metadata: None,
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&activity).unwrap();
        assert_eq!(json["type"], "Trade Started");
        assert_eq!(json["tradeId"], 7);
    }
}
