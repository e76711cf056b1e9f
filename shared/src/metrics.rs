//! Derived portfolio statistics
//!
//! Everything here is a pure function of an already-fetched snapshot of
//! trades. Missing or malformed numbers degrade to zero (or to the neutral
//! progress value) instead of failing, so a bad row never breaks the
//! dashboard.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::display::{format_change_percent, format_usd};
use crate::models::{decimal_to_f64, Trade};

/// Progress shown when a trade lacks the prices to place it within its band
pub const NEUTRAL_PROGRESS: f64 = 50.0;

/// Window within which a trade update marks the venue as connected
pub const VENUE_ACTIVITY_WINDOW_HOURS: i64 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VenueStatus {
    Connected,
    Disconnected,
}

impl VenueStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VenueStatus::Connected => "Connected",
            VenueStatus::Disconnected => "Disconnected",
        }
    }
}

/// Headline figures for the dashboard stat cards
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioStats {
    /// Sum of entry value across every trade
    pub balance: f64,
    pub balance_display: String,
    pub active_trades: usize,
    /// Unrealized P&L across active trades, recomputed from prices
    pub profit_loss: f64,
    pub profit_loss_display: String,
    pub profit_loss_percentage: f64,
    pub profit_loss_percentage_display: String,
    pub venue_status: VenueStatus,
}

/// Closed-trade performance shown on the profile page
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TradingPerformance {
    pub total_trades: usize,
    pub active_trades: usize,
    pub closed_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    /// Winning share of closed trades, 0-100
    pub success_rate: f64,
    /// Mean percentage return over closed trades with both prices known
    pub avg_profit_percent: f64,
    pub first_trade_at: Option<DateTime<Utc>>,
}

/// Compute the dashboard summary for a user's trades.
///
/// `now` is passed in so the result depends only on its inputs.
pub fn compute_portfolio_stats(trades: &[Trade], now: DateTime<Utc>) -> PortfolioStats {
    let balance: f64 = trades.iter().map(entry_value).sum();

    let active: Vec<&Trade> = trades.iter().filter(|t| t.is_active).collect();

    let profit_loss: f64 = active.iter().map(|t| unrealized_pnl(t)).sum();
    let active_entry_value: f64 = active.iter().map(|t| entry_value(t)).sum();

    let profit_loss_percentage = if active_entry_value != 0.0 {
        profit_loss / active_entry_value * 100.0
    } else {
        0.0
    };

    PortfolioStats {
        balance,
        balance_display: format_usd(balance),
        active_trades: active.len(),
        profit_loss,
        profit_loss_display: format_usd(profit_loss),
        profit_loss_percentage,
        profit_loss_percentage_display: format_change_percent(profit_loss_percentage),
        venue_status: venue_status(trades, now),
    }
}

/// Entry value of a trade (entry price times quantity)
pub fn entry_value(trade: &Trade) -> f64 {
    let entry = decimal_to_f64(Some(trade.entry_price)).unwrap_or(0.0);
    let quantity = decimal_to_f64(Some(trade.quantity)).unwrap_or(0.0);
    entry * quantity
}

/// Unrealized P&L of a trade; zero when no current price is known
pub fn unrealized_pnl(trade: &Trade) -> f64 {
    let Some(current) = decimal_to_f64(trade.current_price) else {
        return 0.0;
    };
    let quantity = decimal_to_f64(Some(trade.quantity)).unwrap_or(0.0);
    current * quantity - entry_value(trade)
}

/// "Connected" when the most recently updated trade changed within the last day
pub fn venue_status(trades: &[Trade], now: DateTime<Utc>) -> VenueStatus {
    let latest = trades.iter().map(|t| t.updated_at).max();
    match latest {
        Some(updated) if updated > now - Duration::hours(VENUE_ACTIVITY_WINDOW_HOURS) => {
            VenueStatus::Connected
        }
        _ => VenueStatus::Disconnected,
    }
}

/// Progress-bar position of a trade between its stop-loss and take-profit
pub fn trade_progress(trade: &Trade) -> f64 {
    progress_percent(
        decimal_to_f64(trade.current_price),
        decimal_to_f64(Some(trade.entry_price)),
        decimal_to_f64(trade.take_profit),
        decimal_to_f64(trade.stop_loss),
    )
}

/// `clamp(|current - stop_loss| / |take_profit - stop_loss| * 100, 0, 100)`.
///
/// Returns [`NEUTRAL_PROGRESS`] when any input is missing or the band has
/// zero width. Long and Short positions are treated alike.
pub fn progress_percent(
    current: Option<f64>,
    entry: Option<f64>,
    take_profit: Option<f64>,
    stop_loss: Option<f64>,
) -> f64 {
    let (Some(current), Some(_entry), Some(take_profit), Some(stop_loss)) =
        (current, entry, take_profit, stop_loss)
    else {
        return NEUTRAL_PROGRESS;
    };

    let total_range = (take_profit - stop_loss).abs();
    if total_range == 0.0 || !total_range.is_finite() {
        return NEUTRAL_PROGRESS;
    }

    let distance_from_stop = (current - stop_loss).abs();
    let progress = distance_from_stop / total_range * 100.0;
    if progress.is_nan() {
        return NEUTRAL_PROGRESS;
    }
    progress.clamp(0.0, 100.0)
}

/// Compute closed-trade performance for the profile page
pub fn compute_trading_performance(trades: &[Trade]) -> TradingPerformance {
    let active_trades = trades.iter().filter(|t| t.is_active).count();
    let closed: Vec<&Trade> = trades.iter().filter(|t| !t.is_active).collect();

    let winning_trades = closed
        .iter()
        .filter(|t| decimal_to_f64(t.profit_loss).is_some_and(|pl| pl > 0.0))
        .count();

    let success_rate = if closed.is_empty() {
        0.0
    } else {
        winning_trades as f64 / closed.len() as f64 * 100.0
    };

    TradingPerformance {
        total_trades: trades.len(),
        active_trades,
        closed_trades: closed.len(),
        winning_trades,
        losing_trades: closed.len() - winning_trades,
        success_rate,
        avg_profit_percent: average_return_percent(&closed),
        first_trade_at: trades.iter().map(|t| t.created_at).min(),
    }
}

/// Mean of `(exit - entry) / entry * 100` over closed trades.
///
/// The trade's last recorded price stands in for the exit price. Trades
/// without both prices, or with a zero entry, are left out of the mean.
pub fn average_return_percent(closed: &[&Trade]) -> f64 {
    let returns: Vec<f64> = closed
        .iter()
        .filter_map(|t| {
            let exit = decimal_to_f64(t.current_price)?;
            let entry = decimal_to_f64(Some(t.entry_price))?;
            if entry == 0.0 {
                return None;
            }
            Some((exit - entry) / entry * 100.0)
        })
        .collect();

    if returns.is_empty() {
        0.0
    } else {
        returns.iter().sum::<f64>() / returns.len() as f64
    }
}
