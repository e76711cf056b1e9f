//! Filter and sort pipelines for trade and activity lists
//!
//! Each pipeline borrows the source list and returns a new, ordered view.
//! Sorting is stable: records with equal keys keep their input order.

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;

use crate::models::{Activity, PositionSide, Trade};

/// Number of active trade cards per dashboard page
pub const DASHBOARD_PAGE_SIZE: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TradeSort {
    #[default]
    #[serde(rename = "newest")]
    Newest,
    #[serde(rename = "oldest")]
    Oldest,
    #[serde(rename = "profitDesc")]
    ProfitDesc,
    #[serde(rename = "profitAsc")]
    ProfitAsc,
}

impl TradeSort {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeSort::Newest => "newest",
            TradeSort::Oldest => "oldest",
            TradeSort::ProfitDesc => "profitDesc",
            TradeSort::ProfitAsc => "profitAsc",
        }
    }
}

impl FromStr for TradeSort {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "newest" => Ok(TradeSort::Newest),
            "oldest" => Ok(TradeSort::Oldest),
            "profitDesc" => Ok(TradeSort::ProfitDesc),
            "profitAsc" => Ok(TradeSort::ProfitAsc),
            other => Err(anyhow::anyhow!("Unknown trade sort: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivitySort {
    #[default]
    Newest,
    Oldest,
}

impl ActivitySort {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivitySort::Newest => "newest",
            ActivitySort::Oldest => "oldest",
        }
    }
}

impl FromStr for ActivitySort {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "newest" => Ok(ActivitySort::Newest),
            "oldest" => Ok(ActivitySort::Oldest),
            other => Err(anyhow::anyhow!("Unknown activity sort: {}", other)),
        }
    }
}

/// Criteria for the active trades list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TradeCriteria {
    pub active_only: bool,
    /// "long", "short", or "all"/empty for no filter
    pub position: Option<String>,
    pub search: Option<String>,
    pub sort: TradeSort,
}

/// Criteria for the activity log
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActivityCriteria {
    #[serde(deserialize_with = "lenient_date")]
    pub from_date: Option<NaiveDate>,
    #[serde(deserialize_with = "lenient_date")]
    pub to_date: Option<NaiveDate>,
    /// Substring of the activity type, "all"/empty for no filter
    pub activity_type: Option<String>,
    pub search: Option<String>,
    pub sort: ActivitySort,
}

/// Criteria for the closed-trade history
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClosedTradeCriteria {
    #[serde(deserialize_with = "lenient_date")]
    pub from_date: Option<NaiveDate>,
    #[serde(deserialize_with = "lenient_date")]
    pub to_date: Option<NaiveDate>,
    pub search: Option<String>,
    pub sort: TradeSort,
}

/// Select and order trades by position side, search text and sort key
pub fn filter_and_sort_trades<'a>(trades: &'a [Trade], criteria: &TradeCriteria) -> Vec<&'a Trade> {
    let position = position_filter(criteria.position.as_deref());
    let search = search_term(criteria.search.as_deref());

    let mut filtered: Vec<&Trade> = trades
        .iter()
        .filter(|t| !criteria.active_only || t.is_active)
        .filter(|t| position.map_or(true, |side| t.position.as_str().eq_ignore_ascii_case(side)))
        .filter(|t| {
            search.as_deref().map_or(true, |term| {
                contains_ci(&t.symbol, term) || t.api_used.as_deref().is_some_and(|v| contains_ci(v, term))
            })
        })
        .collect();

    sort_trades(&mut filtered, criteria.sort, |t| t.created_at);
    filtered
}

/// Select and order closed trades for the history view.
///
/// Dates are matched against the closing time, falling back to creation.
pub fn filter_and_sort_closed_trades<'a>(trades: &'a [Trade], criteria: &ClosedTradeCriteria) -> Vec<&'a Trade> {
    let search = search_term(criteria.search.as_deref());
    let range = DateRange::new(criteria.from_date, criteria.to_date);

    let mut filtered: Vec<&Trade> = trades
        .iter()
        .filter(|t| !t.is_active)
        .filter(|t| range.contains(t.event_time()))
        .filter(|t| {
            search.as_deref().map_or(true, |term| {
                contains_ci(&t.symbol, term)
                    || contains_ci(t.position.as_str(), term)
                    || t.api_used.as_deref().is_some_and(|v| contains_ci(v, term))
            })
        })
        .collect();

    sort_trades(&mut filtered, criteria.sort, |t| t.event_time());
    filtered
}

/// Select and order activities by date range, type and search text
pub fn filter_and_sort_activities<'a>(activities: &'a [Activity], criteria: &ActivityCriteria) -> Vec<&'a Activity> {
    let search = search_term(criteria.search.as_deref());
    let activity_type = criteria
        .activity_type
        .as_deref()
        .filter(|v| !is_wildcard(v))
        .map(str::to_lowercase);
    let range = DateRange::new(criteria.from_date, criteria.to_date);

    let mut filtered: Vec<&Activity> = activities
        .iter()
        .filter(|a| range.contains(a.created_at))
        .filter(|a| activity_type.as_deref().map_or(true, |ty| contains_ci(&a.activity_type, ty)))
        .filter(|a| {
            search.as_deref().map_or(true, |term| {
                contains_ci(&a.symbol, term)
                    || contains_ci(&a.activity_type, term)
                    || a.status.as_deref().is_some_and(|v| contains_ci(v, term))
            })
        })
        .collect();

    match criteria.sort {
        ActivitySort::Newest => filtered.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        ActivitySort::Oldest => filtered.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
    }
    filtered
}

/// Active trade counts for the position tabs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PositionCounts {
    pub all: usize,
    pub long: usize,
    pub short: usize,
}

pub fn position_counts(trades: &[Trade]) -> PositionCounts {
    trades.iter().filter(|t| t.is_active).fold(PositionCounts::default(), |mut acc, t| {
        acc.all += 1;
        match t.position {
            PositionSide::Long => acc.long += 1,
            PositionSide::Short => acc.short += 1,
        }
        acc
    })
}

/// One page of a list
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based page number actually returned
    pub page: usize,
    pub page_count: usize,
}

/// Slice `items` into 1-based pages; out-of-range pages clamp to the nearest one
pub fn paginate<T: Clone>(items: &[T], page: usize, per_page: usize) -> Page<T> {
    let per_page = per_page.max(1);
    let page_count = items.len().div_ceil(per_page).max(1);
    let page = page.clamp(1, page_count);
    let start = (page - 1) * per_page;

    Page {
        items: items.iter().skip(start).take(per_page).cloned().collect(),
        page,
        page_count,
    }
}

fn sort_trades<F>(trades: &mut [&Trade], sort: TradeSort, time_of: F)
where
    F: Fn(&Trade) -> DateTime<Utc>,
{
    match sort {
        TradeSort::Newest => trades.sort_by(|a, b| time_of(b).cmp(&time_of(a))),
        TradeSort::Oldest => trades.sort_by(|a, b| time_of(a).cmp(&time_of(b))),
        TradeSort::ProfitDesc => {
            trades.sort_by(|a, b| compare_f64(b.profit_loss_or_zero(), a.profit_loss_or_zero()))
        }
        TradeSort::ProfitAsc => {
            trades.sort_by(|a, b| compare_f64(a.profit_loss_or_zero(), b.profit_loss_or_zero()))
        }
    }
}

fn compare_f64(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

/// Inclusive lower bound at the start of `from`, exclusive upper bound at the
/// start of the day after `to`
#[derive(Debug, Clone, Copy)]
struct DateRange {
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
}

impl DateRange {
    fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        DateRange {
            start: from.and_then(start_of_day),
            end: to
                .and_then(|d| d.checked_add_days(Days::new(1)))
                .and_then(start_of_day),
        }
    }

    fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start.map_or(true, |start| at >= start) && self.end.map_or(true, |end| at < end)
    }
}

fn start_of_day(date: NaiveDate) -> Option<DateTime<Utc>> {
    date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc())
}

/// Side to match, compared case-insensitively; an unknown side matches nothing
fn position_filter(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !is_wildcard(v))
}

/// Raw search text, lowercased; whitespace is part of the term
fn search_term(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_lowercase)
}

/// Blank or malformed dates mean "no bound"
fn lenient_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.as_deref().and_then(parse_date))
}

/// Parse a `YYYY-MM-DD` date, ignoring surrounding whitespace
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

fn is_wildcard(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || value.eq_ignore_ascii_case("all")
}

/// Case-insensitive substring match; `needle` must already be lowercase
fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn trade(id: i32, symbol: &str, side: PositionSide, pl: Option<Decimal>, minutes_ago: i64) -> Trade {
        let base = Utc.with_ymd_and_hms(2025, 4, 10, 12, 0, 0).unwrap();
        let created = base - Duration::minutes(minutes_ago);
        Trade {
            id,
            user_id: 1,
            symbol: symbol.to_string(),
            position: side,
            quantity: dec!(1),
            entry_price: dec!(100),
            current_price: None,
            take_profit: None,
            stop_loss: None,
            profit_loss: pl,
            profit_loss_percentage: None,
            api_used: Some("Binance".to_string()),
            notes: None,
            is_active: true,
            created_at: created,
            updated_at: created,
            closed_at: None,
        }
    }

    fn activity(id: i32, ty: &str, symbol: &str, status: &str, at: DateTime<Utc>) -> Activity {
        Activity {
            id,
            user_id: 1,
            trade_id: None,
            activity_type: ty.to_string(),
            symbol: symbol.to_string(),
            price: None,
            amount: None,
            status: Some(status.to_string()),
            metadata: None,
            created_at: at,
        }
    }

    fn ids<T>(items: &[&T], id_of: impl Fn(&T) -> i32) -> Vec<i32> {
        items.iter().map(|t| id_of(t)).collect()
    }

    #[test]
    fn test_profit_desc_ordering() {
        let trades = vec![
            trade(1, "A", PositionSide::Long, Some(dec!(-5)), 0),
            trade(2, "B", PositionSide::Long, Some(dec!(10)), 0),
            trade(3, "C", PositionSide::Long, Some(dec!(0)), 0),
        ];
        let criteria = TradeCriteria { sort: TradeSort::ProfitDesc, ..Default::default() };
        let result = filter_and_sort_trades(&trades, &criteria);
        assert_eq!(ids(&result, |t| t.id), vec![2, 3, 1]);

        let criteria = TradeCriteria { sort: TradeSort::ProfitAsc, ..Default::default() };
        let result = filter_and_sort_trades(&trades, &criteria);
        assert_eq!(ids(&result, |t| t.id), vec![1, 3, 2]);
    }

    #[test]
    fn test_missing_profit_sorts_as_zero_and_is_stable() {
        let trades = vec![
            trade(1, "A", PositionSide::Long, None, 0),
            trade(2, "B", PositionSide::Long, Some(dec!(1)), 0),
            trade(3, "C", PositionSide::Long, Some(dec!(0)), 0),
            trade(4, "D", PositionSide::Long, Some(dec!(-1)), 0),
        ];
        let criteria = TradeCriteria { sort: TradeSort::ProfitDesc, ..Default::default() };
        let result = filter_and_sort_trades(&trades, &criteria);
        assert_eq!(ids(&result, |t| t.id), vec![2, 1, 3, 4]);
    }

    #[test]
    fn test_newest_and_oldest() {
        let trades = vec![
            trade(1, "A", PositionSide::Long, None, 30),
            trade(2, "B", PositionSide::Long, None, 10),
            trade(3, "C", PositionSide::Long, None, 20),
        ];
        let newest = filter_and_sort_trades(&trades, &TradeCriteria::default());
        assert_eq!(ids(&newest, |t| t.id), vec![2, 3, 1]);

        let criteria = TradeCriteria { sort: TradeSort::Oldest, ..Default::default() };
        let oldest = filter_and_sort_trades(&trades, &criteria);
        assert_eq!(ids(&oldest, |t| t.id), vec![1, 3, 2]);
    }

    #[test]
    fn test_position_and_search_filters() {
        let mut trades = vec![
            trade(1, "BTC/USD", PositionSide::Long, None, 3),
            trade(2, "ETH/USD", PositionSide::Short, None, 2),
            trade(3, "XRP/USD", PositionSide::Long, None, 1),
        ];
        trades[2].api_used = Some("Kraken".to_string());
        trades[0].is_active = false;

        let criteria = TradeCriteria {
            active_only: true,
            position: Some("LONG".to_string()),
            ..Default::default()
        };
        assert_eq!(ids(&filter_and_sort_trades(&trades, &criteria), |t| t.id), vec![3]);

        let criteria = TradeCriteria { search: Some("kra".to_string()), ..Default::default() };
        assert_eq!(ids(&filter_and_sort_trades(&trades, &criteria), |t| t.id), vec![3]);

        let criteria = TradeCriteria { search: Some("usd".to_string()), position: Some("all".to_string()), ..Default::default() };
        assert_eq!(filter_and_sort_trades(&trades, &criteria).len(), 3);
    }

    #[test]
    fn test_unknown_position_matches_nothing() {
        let trades = vec![
            trade(1, "BTC/USD", PositionSide::Long, None, 1),
            trade(2, "ETH/USD", PositionSide::Short, None, 0),
        ];
        let criteria = TradeCriteria { position: Some("sideways".to_string()), ..Default::default() };
        assert!(filter_and_sort_trades(&trades, &criteria).is_empty());

        let criteria = TradeCriteria { position: Some("short".to_string()), ..Default::default() };
        assert_eq!(ids(&filter_and_sort_trades(&trades, &criteria), |t| t.id), vec![2]);

        let criteria = TradeCriteria { position: Some(String::new()), ..Default::default() };
        assert_eq!(filter_and_sort_trades(&trades, &criteria).len(), 2);
    }

    #[test]
    fn test_search_matches_raw_substring() {
        let trades = vec![trade(1, "BTC/USD", PositionSide::Long, None, 0)];
        let criteria = TradeCriteria { search: Some(" btc".to_string()), ..Default::default() };
        assert!(filter_and_sort_trades(&trades, &criteria).is_empty());

        let criteria = TradeCriteria { search: Some("btc/".to_string()), ..Default::default() };
        assert_eq!(filter_and_sort_trades(&trades, &criteria).len(), 1);
    }

    #[test]
    fn test_filter_does_not_mutate_source() {
        let trades = vec![
            trade(1, "A", PositionSide::Long, Some(dec!(1)), 0),
            trade(2, "B", PositionSide::Long, Some(dec!(2)), 0),
        ];
        let before = trades.clone();
        let criteria = TradeCriteria { sort: TradeSort::ProfitDesc, ..Default::default() };
        let _ = filter_and_sort_trades(&trades, &criteria);
        assert_eq!(trades, before);
    }

    #[test]
    fn test_activity_single_day_range() {
        let day = NaiveDate::from_ymd_opt(2025, 4, 10).unwrap();
        let midnight = Utc.with_ymd_and_hms(2025, 4, 10, 0, 0, 0).unwrap();
        let activities = vec![
            activity(1, "Trade Started", "BTC/USD", "Completed", midnight - Duration::seconds(1)),
            activity(2, "Trade Started", "BTC/USD", "Completed", midnight),
            activity(3, "Trade Modified", "BTC/USD", "Updated", midnight + Duration::hours(23)),
            activity(4, "Trade Stopped", "BTC/USD", "Closed", midnight + Duration::days(1)),
        ];
        let criteria = ActivityCriteria {
            from_date: Some(day),
            to_date: Some(day),
            ..Default::default()
        };
        let result = filter_and_sort_activities(&activities, &criteria);
        assert_eq!(ids(&result, |a| a.id), vec![3, 2]);
    }

    #[test]
    fn test_activity_type_and_search() {
        let at = Utc.with_ymd_and_hms(2025, 4, 10, 9, 0, 0).unwrap();
        let activities = vec![
            activity(1, "Trade Started", "BTC/USD", "Completed", at),
            activity(2, "Take Profit Modified", "ETH/USD", "Updated", at + Duration::minutes(1)),
            activity(3, "Trade Stopped", "SOL/USD", "Closed", at + Duration::minutes(2)),
        ];

        let criteria = ActivityCriteria { activity_type: Some("modified".to_string()), ..Default::default() };
        assert_eq!(ids(&filter_and_sort_activities(&activities, &criteria), |a| a.id), vec![2]);

        let criteria = ActivityCriteria { search: Some("closed".to_string()), ..Default::default() };
        assert_eq!(ids(&filter_and_sort_activities(&activities, &criteria), |a| a.id), vec![3]);

        let criteria = ActivityCriteria {
            activity_type: Some("All".to_string()),
            sort: ActivitySort::Oldest,
            ..Default::default()
        };
        assert_eq!(ids(&filter_and_sort_activities(&activities, &criteria), |a| a.id), vec![1, 2, 3]);
    }

    #[test]
    fn test_closed_trades_use_close_time() {
        let mut open = trade(1, "BTC/USD", PositionSide::Long, None, 0);
        open.is_active = true;

        let mut closed_early = trade(2, "ETH/USD", PositionSide::Short, Some(dec!(3)), 600);
        closed_early.is_active = false;
        closed_early.closed_at = Some(Utc.with_ymd_and_hms(2025, 4, 9, 18, 0, 0).unwrap());

        let mut closed_late = trade(3, "XRP/USD", PositionSide::Long, Some(dec!(-1)), 900);
        closed_late.is_active = false;
        closed_late.closed_at = Some(Utc.with_ymd_and_hms(2025, 4, 10, 8, 0, 0).unwrap());

        let trades = vec![open, closed_early, closed_late];

        let all = filter_and_sort_closed_trades(&trades, &ClosedTradeCriteria::default());
        assert_eq!(ids(&all, |t| t.id), vec![3, 2]);

        let criteria = ClosedTradeCriteria {
            from_date: NaiveDate::from_ymd_opt(2025, 4, 10),
            ..Default::default()
        };
        assert_eq!(ids(&filter_and_sort_closed_trades(&trades, &criteria), |t| t.id), vec![3]);

        let criteria = ClosedTradeCriteria { search: Some("short".to_string()), ..Default::default() };
        assert_eq!(ids(&filter_and_sort_closed_trades(&trades, &criteria), |t| t.id), vec![2]);
    }

    #[test]
    fn test_closed_trades_single_day_range() {
        let day = NaiveDate::from_ymd_opt(2025, 4, 10).unwrap();
        let midnight = Utc.with_ymd_and_hms(2025, 4, 10, 0, 0, 0).unwrap();
        let closed_at = [
            midnight - Duration::seconds(1),
            midnight,
            midnight + Duration::hours(23),
            midnight + Duration::days(1),
        ];
        let trades: Vec<Trade> = closed_at
            .iter()
            .enumerate()
            .map(|(i, at)| {
                let mut t = trade(i as i32 + 1, "BTC/USD", PositionSide::Long, None, 2000);
                t.is_active = false;
                t.closed_at = Some(*at);
                t
            })
            .collect();

        let criteria = ClosedTradeCriteria {
            from_date: Some(day),
            to_date: Some(day),
            ..Default::default()
        };
        let result = filter_and_sort_closed_trades(&trades, &criteria);
        assert_eq!(ids(&result, |t| t.id), vec![3, 2]);
    }

    #[test]
    fn test_blank_or_malformed_dates_deserialize_as_no_bound() {
        let criteria: ActivityCriteria =
            serde_json::from_value(serde_json::json!({ "fromDate": "", "toDate": "10/04/2025", "sort": "oldest" }))
                .unwrap();
        assert_eq!(criteria.from_date, None);
        assert_eq!(criteria.to_date, None);
        assert_eq!(criteria.sort, ActivitySort::Oldest);

        let criteria: ClosedTradeCriteria =
            serde_json::from_value(serde_json::json!({ "fromDate": "2025-04-10", "toDate": " " })).unwrap();
        assert_eq!(criteria.from_date, NaiveDate::from_ymd_opt(2025, 4, 10));
        assert_eq!(criteria.to_date, None);

        assert_eq!(parse_date("2025-04-10"), NaiveDate::from_ymd_opt(2025, 4, 10));
        assert_eq!(parse_date("garbage"), None);
    }

    #[test]
    fn test_position_counts() {
        let mut trades = vec![
            trade(1, "A", PositionSide::Long, None, 0),
            trade(2, "B", PositionSide::Short, None, 0),
            trade(3, "C", PositionSide::Long, None, 0),
        ];
        trades[2].is_active = false;
        assert_eq!(position_counts(&trades), PositionCounts { all: 2, long: 1, short: 1 });
    }

    #[test]
    fn test_paginate() {
        let items: Vec<i32> = (1..=7).collect();
        let page = paginate(&items, 2, DASHBOARD_PAGE_SIZE);
        assert_eq!(page.items, vec![4, 5, 6]);
        assert_eq!(page.page_count, 3);

        let last = paginate(&items, 99, DASHBOARD_PAGE_SIZE);
        assert_eq!(last.page, 3);
        assert_eq!(last.items, vec![7]);

        let empty = paginate::<i32>(&[], 0, DASHBOARD_PAGE_SIZE);
        assert_eq!(empty.page, 1);
        assert_eq!(empty.page_count, 1);
        assert!(empty.items.is_empty());
    }

    #[test]
    fn test_sort_keys_parse() {
        assert_eq!("profitDesc".parse::<TradeSort>().unwrap(), TradeSort::ProfitDesc);
        assert!("bogus".parse::<TradeSort>().is_err());
        assert_eq!("oldest".parse::<ActivitySort>().unwrap(), ActivitySort::Oldest);
    }
}
