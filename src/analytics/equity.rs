use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::error::JournalWarning;
use crate::models::TradeRecord;

/// Number of trades in the cumulative-performance moving average.
pub const MOVING_AVERAGE_WINDOW: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub cumulative_performance: f64,
    pub performance_pct: Option<f64>,
    pub moving_average_20: Option<f64>,
}

/// Left fold over net P&L values producing the equity curve.
///
/// Only the last `MOVING_AVERAGE_WINDOW - 1` cumulative values are kept, so
/// appending a trade to an existing ledger needs nothing more than that
/// tail (see [`EquityCurveBuilder::resume`]). A full rebuild and an append
/// run the same arithmetic and produce identical values.
#[derive(Debug, Clone)]
pub struct EquityCurveBuilder {
    initial_balance: f64,
    trailing: VecDeque<f64>,
}

impl EquityCurveBuilder {
    pub fn new(initial_balance: f64) -> Self {
        Self {
            initial_balance,
            trailing: VecDeque::with_capacity(MOVING_AVERAGE_WINDOW),
        }
    }

    /// Continues a curve from the cumulative values of the preceding trades,
    /// oldest first. Passing the whole history is fine; only the tail is kept.
    pub fn resume(initial_balance: f64, preceding: &[f64]) -> Self {
        let mut builder = Self::new(initial_balance);
        let start = preceding.len().saturating_sub(MOVING_AVERAGE_WINDOW - 1);
        builder.trailing.extend(preceding[start..].iter().copied());
        builder
    }

    pub fn push(&mut self, net_pnl: f64) -> EquityPoint {
        let previous = self.trailing.back().copied().unwrap_or(self.initial_balance);
        let cumulative = previous + net_pnl;

        let performance_pct = if previous == 0.0 {
            None
        } else {
            Some((cumulative / previous - 1.0) * 100.0)
        };

        self.trailing.push_back(cumulative);

        let moving_average_20 = if self.trailing.len() == MOVING_AVERAGE_WINDOW {
            let sum: f64 = self.trailing.iter().sum();
            Some(sum / MOVING_AVERAGE_WINDOW as f64)
        } else {
            None
        };

        if self.trailing.len() == MOVING_AVERAGE_WINDOW {
            self.trailing.pop_front();
        }

        EquityPoint {
            cumulative_performance: cumulative,
            performance_pct,
            moving_average_20,
        }
    }
}

pub fn build_curve<I>(net_pnls: I, initial_balance: f64) -> Vec<EquityPoint>
where
    I: IntoIterator<Item = f64>,
{
    let mut builder = EquityCurveBuilder::new(initial_balance);
    net_pnls.into_iter().map(|pnl| builder.push(pnl)).collect()
}

fn apply_point(record: &mut TradeRecord, point: EquityPoint) -> Option<JournalWarning> {
    record.cumulative_performance = point.cumulative_performance;
    record.performance_pct = point.performance_pct;
    record.moving_average_20 = point.moving_average_20;

    if point.performance_pct.is_none() {
        return Some(JournalWarning::UndefinedPerformance {
            trade_id: record.trade_id,
        });
    }
    None
}

/// Recomputes the cumulative fields of every record in ledger order.
pub fn rebuild_equity(trades: &mut [TradeRecord], initial_balance: f64) -> Vec<JournalWarning> {
    let mut builder = EquityCurveBuilder::new(initial_balance);
    trades
        .iter_mut()
        .filter_map(|record| {
            let point = builder.push(record.net_pnl);
            apply_point(record, point)
        })
        .collect()
}

/// Fills the cumulative fields of `record` as the next entry after `preceding`.
pub fn append_equity(
    preceding: &[TradeRecord],
    record: &mut TradeRecord,
    initial_balance: f64,
) -> Option<JournalWarning> {
    let start = preceding.len().saturating_sub(MOVING_AVERAGE_WINDOW - 1);
    let tail: Vec<f64> = preceding[start..]
        .iter()
        .map(|t| t.cumulative_performance)
        .collect();

    let mut builder = EquityCurveBuilder::resume(initial_balance, &tail);
    let point = builder.push(record.net_pnl);
    apply_point(record, point)
}
