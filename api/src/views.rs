//! Askama page templates and the row/card models they render

use askama::Template;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use shared::display::{format_price, format_profit_loss, format_signed_percent, Tone};
use shared::filters::PositionCounts;
use shared::metrics::{trade_progress, PortfolioStats, TradingPerformance};
use shared::models::{Activity, PositionSide, Trade, STATUS_CLOSED, STATUS_COMPLETED};
use shared::{Theme, User};

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Chrome shared by every signed-in page
pub struct Layout {
    pub theme_class: &'static str,
    /// Label of the theme the toggle switches to
    pub toggle_label: &'static str,
    pub username: String,
    pub nav: &'static str,
    /// Where the theme toggle returns to
    pub path: String,
}

impl Layout {
    pub fn new(user: &User, theme: Theme, nav: &'static str, path: impl Into<String>) -> Self {
        Layout {
            theme_class: theme.as_class(),
            toggle_label: match theme.toggled() {
                Theme::Light => "Light mode",
                Theme::Dark => "Dark mode",
            },
            username: user.username.clone(),
            nav,
            path: path.into(),
        }
    }
}

pub struct SelectOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

impl SelectOption {
    pub fn list(options: &[(&'static str, &'static str)], current: &str) -> Vec<SelectOption> {
        options
            .iter()
            .map(|&(value, label)| SelectOption {
                value,
                label,
                selected: value == current,
            })
            .collect()
    }
}

pub struct TradeCard {
    pub id: i32,
    pub symbol: String,
    pub position: &'static str,
    pub position_class: &'static str,
    pub quantity: String,
    pub entry_price: String,
    pub current_price: String,
    pub take_profit: String,
    pub stop_loss: String,
    pub profit_loss: String,
    pub profit_loss_class: &'static str,
    pub progress: String,
    pub api_used: String,
    pub notes: String,
    pub opened: String,
    pub closed: String,
    pub is_active: bool,
}

impl From<&Trade> for TradeCard {
    fn from(trade: &Trade) -> Self {
        let pl = format_profit_loss(trade.profit_loss, trade.profit_loss_percentage);
        TradeCard {
            id: trade.id,
            symbol: trade.symbol.clone(),
            position: trade.position.as_str(),
            position_class: match trade.position {
                PositionSide::Long => "badge-long",
                PositionSide::Short => "badge-short",
            },
            quantity: trade.quantity.normalize().to_string(),
            entry_price: format_price(trade.entry_price),
            current_price: format_price(trade.display_price()),
            take_profit: trade.take_profit.map(format_price).unwrap_or_else(|| "-".to_string()),
            stop_loss: trade.stop_loss.map(format_price).unwrap_or_else(|| "-".to_string()),
            profit_loss: pl.text,
            profit_loss_class: pl.class,
            progress: format!("{:.0}", trade_progress(trade)),
            api_used: trade.api_used.clone().unwrap_or_default(),
            notes: trade.notes.clone().unwrap_or_default(),
            opened: format_time(trade.created_at),
            closed: trade.closed_at.map(format_time).unwrap_or_default(),
            is_active: trade.is_active,
        }
    }
}

pub struct ActivityRow {
    pub activity_type: String,
    pub symbol: String,
    pub price: String,
    pub amount: String,
    pub status: String,
    pub status_class: &'static str,
    pub when: String,
}

impl From<&Activity> for ActivityRow {
    fn from(activity: &Activity) -> Self {
        let status = activity.status.clone().unwrap_or_default();
        ActivityRow {
            activity_type: activity.activity_type.clone(),
            symbol: activity.symbol.clone(),
            price: activity.price.map(format_price).unwrap_or_else(|| "-".to_string()),
            amount: activity
                .amount
                .map(|a| a.normalize().to_string())
                .unwrap_or_else(|| "-".to_string()),
            status_class: match status.as_str() {
                STATUS_COMPLETED => "status-completed",
                STATUS_CLOSED => "status-closed",
                _ => "status-updated",
            },
            status,
            when: format_time(activity.created_at),
        }
    }
}

pub fn format_time(t: DateTime<Utc>) -> String {
    t.format(DATE_FORMAT).to_string()
}

#[derive(Template)]
#[template(path = "auth.html")]
pub struct AuthPage {
    pub theme_class: &'static str,
    pub mode: &'static str,
    pub username: String,
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardPage {
    pub layout: Layout,
    pub stats: PortfolioStats,
    /// Tone of the aggregate P/L card
    pub profit_loss_class: &'static str,
    pub cards: Vec<TradeCard>,
    pub page: usize,
    pub page_count: usize,
    pub activities: Vec<ActivityRow>,
}

#[derive(Template)]
#[template(path = "trades.html")]
pub struct TradesPage {
    pub layout: Layout,
    pub cards: Vec<TradeCard>,
    pub counts: PositionCounts,
    pub position: String,
    pub search: String,
    pub sort_options: Vec<SelectOption>,
}

/// Raw values of the trade form, kept as typed so errors can re-render them
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TradeFormValues {
    pub symbol: String,
    pub position: String,
    pub quantity: String,
    pub entry_price: String,
    pub current_price: String,
    pub take_profit: String,
    pub stop_loss: String,
    pub profit_loss: String,
    pub profit_loss_percentage: String,
    pub api_used: String,
    pub notes: String,
}

impl From<&Trade> for TradeFormValues {
    fn from(trade: &Trade) -> Self {
        let plain = |d: Option<rust_decimal::Decimal>| d.map(|d| d.normalize().to_string()).unwrap_or_default();
        TradeFormValues {
            symbol: trade.symbol.clone(),
            position: trade.position.as_str().to_string(),
            quantity: plain(Some(trade.quantity)),
            entry_price: plain(Some(trade.entry_price)),
            current_price: plain(trade.current_price),
            take_profit: plain(trade.take_profit),
            stop_loss: plain(trade.stop_loss),
            profit_loss: plain(trade.profit_loss),
            profit_loss_percentage: plain(trade.profit_loss_percentage),
            api_used: trade.api_used.clone().unwrap_or_default(),
            notes: trade.notes.clone().unwrap_or_default(),
        }
    }
}

#[derive(Template)]
#[template(path = "trade_form.html")]
pub struct TradeFormPage {
    pub layout: Layout,
    pub title: &'static str,
    pub action: String,
    pub editing: bool,
    pub form: TradeFormValues,
    pub position_options: Vec<SelectOption>,
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "history.html")]
pub struct HistoryPage {
    pub layout: Layout,
    pub tab: &'static str,
    pub activities: Vec<ActivityRow>,
    pub closed: Vec<TradeCard>,
    pub from_date: String,
    pub to_date: String,
    pub activity_type: String,
    pub search: String,
    pub sort_options: Vec<SelectOption>,
}

#[derive(Template)]
#[template(path = "profile.html")]
pub struct ProfilePage {
    pub layout: Layout,
    pub username: String,
    pub member_since: String,
    pub performance: TradingPerformance,
    pub success_rate: String,
    pub avg_profit: String,
    pub avg_profit_class: &'static str,
    pub error: Option<String>,
    pub notice: Option<String>,
}

impl ProfilePage {
    pub fn new(layout: Layout, user: &User, performance: TradingPerformance) -> Self {
        ProfilePage {
            layout,
            username: user.username.clone(),
            member_since: performance
                .first_trade_at
                .unwrap_or(user.created_at)
                .format("%B %Y")
                .to_string(),
            success_rate: format!("{:.1}%", performance.success_rate),
            avg_profit: format_signed_percent(performance.avg_profit_percent),
            avg_profit_class: Tone::of(performance.avg_profit_percent).css_class(),
            performance,
            error: None,
            notice: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn trade() -> Trade {
        let opened = Utc.with_ymd_and_hms(2025, 4, 10, 9, 30, 0).unwrap();
        Trade {
            id: 1,
            user_id: 1,
            symbol: "BTC/USD".to_string(),
            position: PositionSide::Long,
            quantity: dec!(0.05),
            entry_price: dec!(36742.50),
            current_price: Some(dec!(37842.18)),
            take_profit: Some(dec!(38950.00)),
            stop_loss: Some(dec!(35250.00)),
            profit_loss: Some(dec!(1099.68)),
            profit_loss_percentage: Some(dec!(2.99)),
            api_used: Some("Binance".to_string()),
            notes: None,
            is_active: true,
            created_at: opened,
            updated_at: opened,
            closed_at: None,
        }
    }

    #[test]
    fn test_trade_card() {
        let card = TradeCard::from(&trade());
        assert_eq!(card.entry_price, "$36,742.50");
        assert_eq!(card.current_price, "$37,842.18");
        assert_eq!(card.profit_loss, "+$1,099.68 (2.99%)");
        assert_eq!(card.profit_loss_class, "text-profit");
        assert_eq!(card.progress, "70");
        assert_eq!(card.quantity, "0.05");
        assert_eq!(card.opened, "2025-04-10 09:30");
    }

    #[test]
    fn test_form_values_from_trade() {
        let values = TradeFormValues::from(&trade());
        assert_eq!(values.entry_price, "36742.5");
        assert_eq!(values.position, "Long");
        assert_eq!(values.notes, "");
    }

    #[test]
    fn test_select_options_mark_current() {
        let options = SelectOption::list(&[("newest", "Newest"), ("oldest", "Oldest")], "oldest");
        assert!(!options[0].selected);
        assert!(options[1].selected);
    }
}
