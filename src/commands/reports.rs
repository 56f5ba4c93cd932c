use chrono::NaiveDate;

use crate::analytics::{
    self, MonthCalendar, PerformanceSummary, Period, PeriodReport, PeriodRow, ReportSelection, ReturnBucket,
    SetupAnalysis, TradeEvaluation,
};
use crate::error::Result;
use crate::journal::Journal;

/// Net P&L and trade count per calendar bucket. With a date range every
/// bucket in it is listed, empty ones included; otherwise only buckets
/// holding trades.
pub fn get_calendar(journal: &Journal, period: Period, range: Option<(NaiveDate, NaiveDate)>) -> Result<Vec<PeriodRow>> {
    journal.with_ledger(|ledger, _| {
        let buckets = match range {
            Some((from, to)) => analytics::bucket_range(&ledger.trades, period, from, to),
            None => analytics::bucket(&ledger.trades, period),
        };
        Ok(analytics::to_rows(&buckets))
    })
}

pub fn get_month_calendar(journal: &Journal, year: i32, month: u32) -> Result<Option<MonthCalendar>> {
    journal.with_ledger(|ledger, _| Ok(analytics::month_calendar(&ledger.trades, year, month)))
}

/// Report for `selection`, defaulting to the month before the latest
/// trade. `None` when the window holds no trades.
pub fn get_period_report(journal: &Journal, selection: Option<ReportSelection>) -> Result<Option<PeriodReport>> {
    journal.with_ledger(|ledger, _| {
        let selection = match selection {
            Some(selection) => selection,
            None => {
                let Some(latest) = ledger.trades.iter().map(|t| t.date).max() else {
                    return Ok(None);
                };
                let (year, month) = analytics::default_report_month(latest);
                ReportSelection::Month { year, month }
            }
        };
        Ok(analytics::period_report(&ledger.trades, selection))
    })
}

/// Summary anchored at `as_of`, or at the latest trade date.
pub fn get_performance_summary(journal: &Journal, as_of: Option<NaiveDate>) -> Result<PerformanceSummary> {
    journal.with_ledger(|ledger, _| {
        let as_of = as_of.or_else(|| ledger.trades.iter().map(|t| t.date).max());
        Ok(as_of
            .map(|date| analytics::performance_summary(&ledger.trades, date))
            .unwrap_or_default())
    })
}

pub fn get_setup_analysis(journal: &Journal) -> Result<SetupAnalysis> {
    journal.with_ledger(|ledger, _| Ok(analytics::analyze_setups(&ledger.trades)))
}

pub fn get_return_distribution(journal: &Journal) -> Result<Vec<ReturnBucket>> {
    journal.with_ledger(|ledger, _| Ok(analytics::return_distribution(&ledger.trades)))
}

/// Tag scores over the whole ledger, curve restricted to the last `last`
/// trades when given.
pub fn get_trade_evaluation(journal: &Journal, last: Option<usize>) -> Result<TradeEvaluation> {
    journal.with_ledger(|ledger, _| Ok(analytics::evaluate_trades(&ledger.trades, last)))
}
