use serde::{Deserialize, Serialize};

use crate::models::TradeRecord;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsReport {
    pub total_trades: usize,
    pub wins: usize,
    pub losses: usize,
    pub breakevens: usize,
    pub win_rate: f64,
    pub largest_profit: f64,
    pub largest_loss: f64,
    pub largest_win_pct: f64,
    pub largest_loss_pct: f64,
    pub avg_profit: f64,
    pub avg_loss: f64,
    pub avg_win_pct: f64,
    pub avg_loss_pct: f64,
    pub gross_profit: f64,
    pub gross_loss: f64,
    pub profit_factor: f64,
    pub expectancy: f64,
    pub win_loss_ratio: f64,
    pub pl_ratio: f64,
}

/// Keys of the metrics compared between two windows, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetricKey {
    WinRate,
    LargestProfit,
    LargestLoss,
    LargestWinPct,
    LargestLossPct,
    AvgProfit,
    AvgLoss,
    ProfitFactor,
    Expectancy,
}

impl MetricKey {
    pub const ALL: [MetricKey; 9] = [
        MetricKey::WinRate,
        MetricKey::LargestProfit,
        MetricKey::LargestLoss,
        MetricKey::LargestWinPct,
        MetricKey::LargestLossPct,
        MetricKey::AvgProfit,
        MetricKey::AvgLoss,
        MetricKey::ProfitFactor,
        MetricKey::Expectancy,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            MetricKey::WinRate => "Win rate %",
            MetricKey::LargestProfit => "Largest Profit",
            MetricKey::LargestLoss => "Largest Loss",
            MetricKey::LargestWinPct => "Largest Win %",
            MetricKey::LargestLossPct => "Largest Loss %",
            MetricKey::AvgProfit => "Avg. Profit per trade",
            MetricKey::AvgLoss => "Avg. Loss per trade",
            MetricKey::ProfitFactor => "Profit Factor",
            MetricKey::Expectancy => "Expectancy per trade",
        }
    }
}

impl MetricsReport {
    pub fn value(&self, key: MetricKey) -> f64 {
        match key {
            MetricKey::WinRate => self.win_rate,
            MetricKey::LargestProfit => self.largest_profit,
            MetricKey::LargestLoss => self.largest_loss,
            MetricKey::LargestWinPct => self.largest_win_pct,
            MetricKey::LargestLossPct => self.largest_loss_pct,
            MetricKey::AvgProfit => self.avg_profit,
            MetricKey::AvgLoss => self.avg_loss,
            MetricKey::ProfitFactor => self.profit_factor,
            MetricKey::Expectancy => self.expectancy,
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Aggregate statistics over any subset of the ledger. Every ratio has a
/// defined value on empty or one-sided input; nothing here divides by zero.
pub fn compute_metrics<'a, I>(trades: I) -> MetricsReport
where
    I: IntoIterator<Item = &'a TradeRecord>,
{
    let trades: Vec<&TradeRecord> = trades.into_iter().collect();
    if trades.is_empty() {
        return MetricsReport::default();
    }

    let net: Vec<f64> = trades.iter().map(|t| t.net_pnl).collect();
    let winners: Vec<f64> = net.iter().copied().filter(|p| *p > 0.0).collect();
    let losers: Vec<f64> = net.iter().copied().filter(|p| *p < 0.0).collect();
    let win_returns: Vec<f64> = trades.iter().map(|t| t.return_pct).filter(|r| *r > 0.0).collect();
    let loss_returns: Vec<f64> = trades.iter().map(|t| t.return_pct).filter(|r| *r < 0.0).collect();

    let total = trades.len();
    let wins = winners.len();
    let losses = losers.len();
    let gross_profit: f64 = winners.iter().sum();
    let gross_loss: f64 = losers.iter().sum::<f64>().abs();
    let avg_profit = mean(&winners);
    let avg_loss = mean(&losers);

    let profit_factor = if losses > 0 { gross_profit / gross_loss } else { 0.0 };

    let win_loss_ratio = if losses > 0 {
        wins as f64 / losses as f64
    } else if wins > 0 {
        f64::INFINITY
    } else {
        0.0
    };

    let pl_ratio = if losses > 0 {
        avg_profit / avg_loss.abs()
    } else if wins > 0 {
        f64::INFINITY
    } else {
        0.0
    };

    MetricsReport {
        total_trades: total,
        wins,
        losses,
        breakevens: total - wins - losses,
        win_rate: wins as f64 / total as f64 * 100.0,
        largest_profit: net.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        largest_loss: net.iter().copied().fold(f64::INFINITY, f64::min),
        largest_win_pct: trades.iter().map(|t| t.return_pct).fold(f64::NEG_INFINITY, f64::max),
        largest_loss_pct: trades.iter().map(|t| t.return_pct).fold(f64::INFINITY, f64::min),
        avg_profit,
        avg_loss,
        avg_win_pct: mean(&win_returns),
        avg_loss_pct: mean(&loss_returns),
        gross_profit,
        gross_loss,
        profit_factor,
        expectancy: mean(&net),
        win_loss_ratio,
        pl_ratio,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trend {
    Improving,
    Declining,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRemark {
    pub metric: MetricKey,
    pub label: String,
    pub current: f64,
    pub reference: f64,
    pub trend: Trend,
}

/// Labels every metric `Improving` when the current value is at least the
/// reference value. The comparison is the same for every metric; a smaller
/// "Largest Loss" is reported as declining.
pub fn compare_metrics(current: &MetricsReport, reference: &MetricsReport) -> Vec<MetricRemark> {
    MetricKey::ALL
        .iter()
        .map(|&metric| {
            let current_value = current.value(metric);
            let reference_value = reference.value(metric);
            MetricRemark {
                metric,
                label: metric.label().to_string(),
                current: current_value,
                reference: reference_value,
                trend: if current_value >= reference_value {
                    Trend::Improving
                } else {
                    Trend::Declining
                },
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsComparison {
    pub window: usize,
    pub all_trades: MetricsReport,
    pub recent_trades: MetricsReport,
    pub remarks: Vec<MetricRemark>,
}

/// "All trades" against "last `window` trades" in ledger order.
pub fn last_n_comparison(trades: &[TradeRecord], window: usize) -> MetricsComparison {
    let all_trades = compute_metrics(trades);
    let start = trades.len().saturating_sub(window);
    let recent_trades = compute_metrics(&trades[start..]);
    let remarks = compare_metrics(&recent_trades, &all_trades);

    MetricsComparison {
        window,
        all_trades,
        recent_trades,
        remarks,
    }
}
