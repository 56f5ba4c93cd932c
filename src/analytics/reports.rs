use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::analytics::calendar::quarter_of;
use crate::models::{Direction, TradeRecord};

/// Reporting window of the periodic report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "period", rename_all = "snake_case")]
pub enum ReportSelection {
    Month { year: i32, month: u32 },
    Quarter { year: i32, quarter: u32 },
    Year { year: i32 },
}

impl ReportSelection {
    pub fn contains(&self, date: NaiveDate) -> bool {
        match *self {
            ReportSelection::Month { year, month } => date.year() == year && date.month() == month,
            ReportSelection::Quarter { year, quarter } => {
                date.year() == year && quarter_of(date.month()) == quarter
            }
            ReportSelection::Year { year } => date.year() == year,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PeriodReport {
    pub volume: u64,
    pub total_fees: f64,
    pub long_pnl: f64,
    pub short_pnl: f64,
    pub net_pnl: f64,
    pub long_trades: usize,
    pub short_trades: usize,
    pub total_trades: usize,
    pub winner_long: usize,
    pub winner_short: usize,
    pub loser_long: usize,
    pub loser_short: usize,
    pub gross_profit: f64,
    pub gross_losses: f64,
    pub win_rate: f64,
    pub risk_reward: Option<f64>,
    pub avg_winning_trade: Option<f64>,
    pub avg_losing_trade: Option<f64>,
}

/// Monthly, quarterly or annual statistics. `None` when nothing was
/// traded in the selected window.
pub fn period_report(trades: &[TradeRecord], selection: ReportSelection) -> Option<PeriodReport> {
    let selected: Vec<&TradeRecord> = trades.iter().filter(|t| selection.contains(t.date)).collect();
    if selected.is_empty() {
        return None;
    }

    let mut report = PeriodReport {
        total_trades: selected.len(),
        ..Default::default()
    };

    let mut winning: Vec<f64> = Vec::new();
    let mut losing: Vec<f64> = Vec::new();

    for trade in &selected {
        report.volume += trade.contracts as u64;
        report.total_fees += trade.total_broker_fees + trade.risk_management_fee;
        report.net_pnl += trade.net_pnl;

        let won = trade.net_pnl > 0.0;
        let lost = trade.net_pnl < 0.0;
        match trade.direction {
            Direction::Long => {
                report.long_pnl += trade.net_pnl;
                report.long_trades += 1;
                report.winner_long += won as usize;
                report.loser_long += lost as usize;
            }
            Direction::Short => {
                report.short_pnl += trade.net_pnl;
                report.short_trades += 1;
                report.winner_short += won as usize;
                report.loser_short += lost as usize;
            }
        }

        // Gross figures are taken before fees.
        if trade.pnl > 0.0 {
            report.gross_profit += trade.pnl;
        } else if trade.pnl < 0.0 {
            report.gross_losses += trade.pnl;
        }

        if won {
            winning.push(trade.net_pnl);
        } else if lost {
            losing.push(trade.net_pnl);
        }
    }

    report.win_rate = winning.len() as f64 / report.total_trades as f64 * 100.0;
    report.risk_reward = (!winning.is_empty()).then(|| losing.len() as f64 / winning.len() as f64);
    report.avg_winning_trade =
        (!winning.is_empty()).then(|| winning.iter().sum::<f64>() / winning.len() as f64);
    report.avg_losing_trade =
        (!losing.is_empty()).then(|| losing.iter().sum::<f64>() / losing.len() as f64);

    Some(report)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    pub as_of: Option<NaiveDate>,
    pub this_month: f64,
    pub quarters: [f64; 4],
    pub year_to_date: f64,
    pub previous_year_to_date: f64,
}

/// Net PnL of the current month, each quarter of the current year, the
/// year to date and the same span of the previous year.
pub fn performance_summary(trades: &[TradeRecord], as_of: NaiveDate) -> PerformanceSummary {
    let year = as_of.year();
    let year_start = NaiveDate::from_ymd_opt(year, 1, 1);
    let previous_start = NaiveDate::from_ymd_opt(year - 1, 1, 1);
    let previous_end = as_of.checked_sub_months(Months::new(12));

    let mut summary = PerformanceSummary {
        as_of: Some(as_of),
        ..Default::default()
    };

    for trade in trades {
        let date = trade.date;
        if date.year() == year {
            summary.quarters[(quarter_of(date.month()) - 1) as usize] += trade.net_pnl;
            if date.month() == as_of.month() {
                summary.this_month += trade.net_pnl;
            }
            if year_start.is_some_and(|start| date >= start) && date <= as_of {
                summary.year_to_date += trade.net_pnl;
            }
        }
        if let (Some(start), Some(end)) = (previous_start, previous_end) {
            if date >= start && date <= end {
                summary.previous_year_to_date += trade.net_pnl;
            }
        }
    }

    summary
}

/// Month preselected by the monthly report: the one before the latest
/// trade's month.
pub fn default_report_month(latest: NaiveDate) -> (i32, u32) {
    if latest.month() == 1 {
        (latest.year() - 1, 12)
    } else {
        (latest.year(), latest.month() - 1)
    }
}
