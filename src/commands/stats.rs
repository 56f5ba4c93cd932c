use chrono::{Days, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::analytics::{self, MetricsComparison, MetricsReport, Period, PeriodKey};
use crate::error::{JournalError, Result};
use crate::journal::Journal;
use crate::models::TradeRecord;

/// Trailing window the dashboard is restricted to, counted back from
/// today.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateRange {
    #[default]
    All,
    Today,
    Week,
    Month,
    #[serde(rename = "3months")]
    ThreeMonths,
    #[serde(rename = "6months")]
    SixMonths,
    Year,
}

impl DateRange {
    /// First date inside the window, `None` for no restriction.
    pub fn start(&self, today: NaiveDate) -> Option<NaiveDate> {
        let days = match self {
            DateRange::All => return None,
            DateRange::Today => 0,
            DateRange::Week => 7,
            DateRange::Month => 30,
            DateRange::ThreeMonths => 90,
            DateRange::SixMonths => 180,
            DateRange::Year => 365,
        };
        today.checked_sub_days(Days::new(days))
    }

    fn contains(&self, date: NaiveDate, today: NaiveDate) -> bool {
        self.start(today).is_none_or(|start| date >= start)
    }
}

impl FromStr for DateRange {
    type Err = JournalError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "all" => Ok(DateRange::All),
            "today" => Ok(DateRange::Today),
            "week" => Ok(DateRange::Week),
            "month" => Ok(DateRange::Month),
            "3months" => Ok(DateRange::ThreeMonths),
            "6months" => Ok(DateRange::SixMonths),
            "year" => Ok(DateRange::Year),
            other => Err(JournalError::Config(format!("unknown date range '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub range: DateRange,
    pub metrics: MetricsReport,
    pub open_trades: usize,
    pub total_net_pnl: f64,
    pub total_fees: f64,
    pub best_trade: f64,
    pub worst_trade: f64,
    pub current_balance: f64,
    pub moving_average_20: Option<f64>,
}

/// One ledger row of the equity curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityCurvePoint {
    pub trade_id: u64,
    pub date: NaiveDate,
    pub net_pnl: f64,
    pub cumulative_performance: f64,
    pub performance_pct: Option<f64>,
    pub moving_average_20: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyEquityPoint {
    pub date: NaiveDate,
    pub cumulative_pnl: f64,
    pub daily_pnl: f64,
    pub trade_count: usize,
}

fn in_range<'a>(trades: &'a [TradeRecord], range: DateRange, today: NaiveDate) -> Vec<&'a TradeRecord> {
    trades.iter().filter(|t| range.contains(t.date, today)).collect()
}

fn dashboard_stats(trades: &[TradeRecord], initial_balance: f64, range: DateRange, today: NaiveDate) -> DashboardStats {
    let selected = in_range(trades, range, today);
    let net_pnls = || selected.iter().map(|t| t.net_pnl);

    DashboardStats {
        range,
        metrics: analytics::compute_metrics(selected.iter().copied()),
        open_trades: selected.iter().filter(|t| !t.is_closed()).count(),
        total_net_pnl: net_pnls().sum(),
        total_fees: selected
            .iter()
            .map(|t| t.risk_management_fee + t.total_broker_fees)
            .sum(),
        best_trade: net_pnls().reduce(f64::max).unwrap_or(0.0),
        worst_trade: net_pnls().reduce(f64::min).unwrap_or(0.0),
        current_balance: trades
            .last()
            .map(|t| t.cumulative_performance)
            .unwrap_or(initial_balance),
        moving_average_20: trades.last().and_then(|t| t.moving_average_20),
    }
}

fn daily_equity(trades: &[TradeRecord], range: DateRange, today: NaiveDate) -> Vec<DailyEquityPoint> {
    let days = analytics::bucket(in_range(trades, range, today), Period::Day);

    let mut cumulative_pnl = 0.0;
    days.iter()
        .filter_map(|(key, bucket)| {
            let PeriodKey::Day(date) = *key else { return None };
            cumulative_pnl += bucket.net_pnl_sum;
            Some(DailyEquityPoint {
                date,
                cumulative_pnl,
                daily_pnl: bucket.net_pnl_sum,
                trade_count: bucket.trade_count,
            })
        })
        .collect()
}

pub fn get_dashboard_stats(journal: &Journal, range: DateRange) -> Result<DashboardStats> {
    let today = Local::now().date_naive();
    journal.with_ledger(|ledger, settings| {
        Ok(dashboard_stats(&ledger.trades, settings.initial_balance, range, today))
    })
}

/// Per-trade equity curve in ledger order.
pub fn get_equity_curve(journal: &Journal) -> Result<Vec<EquityCurvePoint>> {
    journal.with_ledger(|ledger, _| {
        Ok(ledger
            .trades
            .iter()
            .map(|t| EquityCurvePoint {
                trade_id: t.trade_id,
                date: t.date,
                net_pnl: t.net_pnl,
                cumulative_performance: t.cumulative_performance,
                performance_pct: t.performance_pct,
                moving_average_20: t.moving_average_20,
            })
            .collect())
    })
}

/// Net P&L grouped by trade date, accumulated from zero.
pub fn get_daily_equity(journal: &Journal, range: DateRange) -> Result<Vec<DailyEquityPoint>> {
    let today = Local::now().date_naive();
    journal.with_ledger(|ledger, _| Ok(daily_equity(&ledger.trades, range, today)))
}

/// All trades against the last `window` trades, with Improving/Declining
/// remarks per metric.
pub fn get_metrics_comparison(journal: &Journal, window: usize) -> Result<MetricsComparison> {
    journal.with_ledger(|ledger, _| Ok(analytics::last_n_comparison(&ledger.trades, window)))
}
