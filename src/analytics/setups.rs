use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::{Direction, Setup, TradeRecord};

const RANKED_SETUPS: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetupSummary {
    pub setup: Setup,
    pub net_profit: f64,
    /// Mean of the defined performance % values; `None` if none are defined.
    pub avg_performance_pct: Option<f64>,
    pub win_rate: f64,
    pub trade_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SetupTotals {
    pub net_profit: f64,
    pub avg_performance_pct: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DirectionalBreakdown {
    pub long_pnl: f64,
    pub short_pnl: f64,
    pub total_pnl: f64,
    pub long_share_pct: f64,
    pub short_share_pct: f64,
    pub total_profit: f64,
    pub total_loss: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SetupAnalysis {
    /// Every traded setup, in vocabulary order.
    pub setups: Vec<SetupSummary>,
    pub top: Vec<SetupSummary>,
    pub bottom: Vec<SetupSummary>,
    pub grand_total: SetupTotals,
    pub directions: DirectionalBreakdown,
}

fn mean(values: &[f64]) -> Option<f64> {
    (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
}

pub fn summarize_setups<'a, I>(trades: I) -> Vec<SetupSummary>
where
    I: IntoIterator<Item = &'a TradeRecord>,
{
    let mut grouped: BTreeMap<Setup, Vec<&TradeRecord>> = BTreeMap::new();
    for trade in trades {
        grouped.entry(trade.setup).or_default().push(trade);
    }

    grouped
        .into_iter()
        .map(|(setup, group)| {
            let performances: Vec<f64> = group.iter().filter_map(|t| t.performance_pct).collect();
            let winners = group.iter().filter(|t| t.net_pnl > 0.0).count();
            SetupSummary {
                setup,
                net_profit: group.iter().map(|t| t.net_pnl).sum(),
                avg_performance_pct: mean(&performances),
                win_rate: winners as f64 / group.len() as f64 * 100.0,
                trade_count: group.len(),
            }
        })
        .collect()
}

pub fn directional_breakdown<'a, I>(trades: I) -> DirectionalBreakdown
where
    I: IntoIterator<Item = &'a TradeRecord>,
{
    let mut breakdown = DirectionalBreakdown::default();
    for trade in trades {
        match trade.direction {
            Direction::Long => breakdown.long_pnl += trade.net_pnl,
            Direction::Short => breakdown.short_pnl += trade.net_pnl,
        }
        if trade.net_pnl > 0.0 {
            breakdown.total_profit += trade.net_pnl;
        } else {
            breakdown.total_loss += trade.net_pnl;
        }
    }

    breakdown.total_pnl = breakdown.long_pnl + breakdown.short_pnl;
    if breakdown.total_pnl != 0.0 {
        breakdown.long_share_pct = breakdown.long_pnl / breakdown.total_pnl * 100.0;
        breakdown.short_share_pct = breakdown.short_pnl / breakdown.total_pnl * 100.0;
    }
    breakdown
}

/// Setup table with the best and worst three setups by net profit.
/// The grand total averages the per-setup performance means.
pub fn analyze_setups(trades: &[TradeRecord]) -> SetupAnalysis {
    let setups = summarize_setups(trades);

    let mut ranked = setups.clone();
    ranked.sort_by(|a, b| b.net_profit.total_cmp(&a.net_profit));
    let top: Vec<SetupSummary> = ranked.iter().take(RANKED_SETUPS).cloned().collect();
    let bottom: Vec<SetupSummary> = ranked.iter().rev().take(RANKED_SETUPS).cloned().collect();

    let averages: Vec<f64> = setups.iter().filter_map(|s| s.avg_performance_pct).collect();
    let grand_total = SetupTotals {
        net_profit: setups.iter().map(|s| s.net_profit).sum(),
        avg_performance_pct: mean(&averages),
    };

    SetupAnalysis {
        setups,
        top,
        bottom,
        grand_total,
        directions: directional_breakdown(trades),
    }
}
