use serde::{Deserialize, Serialize};

use crate::analytics::equity::{append_equity, rebuild_equity};
use crate::analytics::pnl::{apply_pnl, compute_trade_pnl};
use crate::error::{JournalWarning, Result};
use crate::models::{AccountSettings, InstrumentTable, TradeRecord};

/// Maximum difference tolerated between stored and recomputed values.
pub const DRIFT_TOLERANCE: f64 = 1e-9;

/// Recomputes every derived field of the ledger in order: per-trade P&L
/// first, then the equity fold.
pub fn recompute_ledger(
    trades: &mut [TradeRecord],
    settings: &AccountSettings,
    instruments: &InstrumentTable,
) -> Result<Vec<JournalWarning>> {
    let mut warnings = Vec::new();

    for record in trades.iter_mut() {
        let pnl = compute_trade_pnl(&record.fields(), instruments.lookup(&record.ticker), settings)?;
        apply_pnl(record, &pnl);
        warnings.extend(pnl.warning);
    }

    warnings.extend(rebuild_equity(trades, settings.initial_balance));
    Ok(warnings)
}

/// Derives the fields of `record` as the next entry after `preceding`.
/// Equivalent to a full recompute of `preceding + [record]`.
pub fn derive_appended(
    preceding: &[TradeRecord],
    record: &mut TradeRecord,
    settings: &AccountSettings,
    instruments: &InstrumentTable,
) -> Result<Vec<JournalWarning>> {
    let pnl = compute_trade_pnl(&record.fields(), instruments.lookup(&record.ticker), settings)?;
    apply_pnl(record, &pnl);

    let mut warnings: Vec<JournalWarning> = pnl.warning.into_iter().collect();
    warnings.extend(append_equity(preceding, record, settings.initial_balance));
    Ok(warnings)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDrift {
    pub field: String,
    pub stored: Option<f64>,
    pub expected: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftReport {
    pub trade_id: u64,
    pub fields: Vec<FieldDrift>,
}

fn drifted(stored: Option<f64>, expected: Option<f64>) -> bool {
    match (stored, expected) {
        (Some(a), Some(b)) => (a - b).abs() > DRIFT_TOLERANCE,
        (None, None) => false,
        _ => true,
    }
}

/// Lists the records whose stored derived values no longer match a fresh
/// recompute. The ledger itself is left untouched.
pub fn verify_ledger(
    trades: &[TradeRecord],
    settings: &AccountSettings,
    instruments: &InstrumentTable,
) -> Result<Vec<DriftReport>> {
    let mut expected = trades.to_vec();
    recompute_ledger(&mut expected, settings, instruments)?;

    let reports = trades
        .iter()
        .zip(&expected)
        .filter_map(|(stored, fresh)| {
            let pairs = [
                ("pnl", Some(stored.pnl), Some(fresh.pnl)),
                ("net_pnl", Some(stored.net_pnl), Some(fresh.net_pnl)),
                ("return_pct", Some(stored.return_pct), Some(fresh.return_pct)),
                (
                    "risk_management_fee",
                    Some(stored.risk_management_fee),
                    Some(fresh.risk_management_fee),
                ),
                (
                    "total_broker_fees",
                    Some(stored.total_broker_fees),
                    Some(fresh.total_broker_fees),
                ),
                (
                    "cumulative_performance",
                    Some(stored.cumulative_performance),
                    Some(fresh.cumulative_performance),
                ),
                ("performance_pct", stored.performance_pct, fresh.performance_pct),
                ("moving_average_20", stored.moving_average_20, fresh.moving_average_20),
            ];

            let fields: Vec<FieldDrift> = pairs
                .into_iter()
                .filter(|(_, s, e)| drifted(*s, *e))
                .map(|(field, stored, expected)| FieldDrift {
                    field: field.to_string(),
                    stored,
                    expected,
                })
                .collect();

            (!fields.is_empty()).then(|| DriftReport {
                trade_id: stored.trade_id,
                fields,
            })
        })
        .collect::<Vec<_>>();

    if !reports.is_empty() {
        log::warn!("{} ledger record(s) drifted from their recomputed values", reports.len());
    }
    Ok(reports)
}
