use serde::{Deserialize, Serialize};

use super::log_warnings;
use crate::analytics::{self, DriftReport};
use crate::error::{JournalError, JournalWarning, Result};
use crate::journal::Journal;
use crate::models::{CreateTradeInput, TradeFilter, TradeRecord, UpdateTradeInput};

/// A stored trade plus the warnings raised while deriving it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeOutcome {
    pub trade: TradeRecord,
    pub warnings: Vec<JournalWarning>,
}

pub fn get_trades(journal: &Journal) -> Result<Vec<TradeRecord>> {
    journal.with_ledger(|ledger, _| Ok(ledger.trades.clone()))
}

pub fn get_trade(journal: &Journal, trade_id: u64) -> Result<TradeRecord> {
    journal.with_ledger(|ledger, _| ledger.get(trade_id).cloned().ok_or(JournalError::NotFound(trade_id)))
}

pub fn filter_trades(journal: &Journal, filter: TradeFilter) -> Result<Vec<TradeRecord>> {
    journal.with_ledger(|ledger, _| Ok(ledger.trades.iter().filter(|t| filter.matches(t)).cloned().collect()))
}

/// Appends a trade at the end of the ledger. Only the new row is derived;
/// earlier rows are untouched.
pub fn add_trade(journal: &Journal, input: CreateTradeInput) -> Result<TradeOutcome> {
    let fields = input.into_fields()?;
    let outcome = journal.mutate_ledger(|ledger, settings| {
        let mut record = TradeRecord::new(ledger.allocate_id(), fields);
        let warnings = analytics::derive_appended(&ledger.trades, &mut record, settings, journal.instruments())?;
        ledger.trades.push(record.clone());
        Ok(TradeOutcome { trade: record, warnings })
    })?;

    log::info!("Added trade {} ({} {})", outcome.trade.trade_id, outcome.trade.direction, outcome.trade.ticker);
    log_warnings(&outcome.warnings);
    Ok(outcome)
}

/// Copies a trade as a new, still open position at the end of the ledger.
pub fn duplicate_trade(journal: &Journal, trade_id: u64) -> Result<TradeOutcome> {
    let outcome = journal.mutate_ledger(|ledger, settings| {
        let original = ledger.get(trade_id).ok_or(JournalError::NotFound(trade_id))?;
        let mut fields = original.fields();
        fields.exit_time = None;

        let mut record = TradeRecord::new(ledger.allocate_id(), fields);
        let warnings = analytics::derive_appended(&ledger.trades, &mut record, settings, journal.instruments())?;
        ledger.trades.push(record.clone());
        Ok(TradeOutcome { trade: record, warnings })
    })?;

    log::info!("Duplicated trade {} as {}", trade_id, outcome.trade.trade_id);
    log_warnings(&outcome.warnings);
    Ok(outcome)
}

/// Deletes a trade and rebuilds every derived field of the rows after it.
/// The freed id is never handed out again.
pub fn remove_trade(journal: &Journal, trade_id: u64) -> Result<Vec<JournalWarning>> {
    let warnings = journal.mutate_ledger(|ledger, settings| {
        let position = ledger.position(trade_id).ok_or(JournalError::NotFound(trade_id))?;
        ledger.trades.remove(position);
        analytics::recompute_ledger(&mut ledger.trades, settings, journal.instruments())
    })?;

    log::info!("Removed trade {}", trade_id);
    log_warnings(&warnings);
    Ok(warnings)
}

/// Applies a partial edit in place and recomputes the whole ledger.
pub fn edit_trade(journal: &Journal, trade_id: u64, update: UpdateTradeInput) -> Result<TradeOutcome> {
    let outcome = journal.mutate_ledger(|ledger, settings| {
        let position = ledger.position(trade_id).ok_or(JournalError::NotFound(trade_id))?;
        let fields = update.apply(&ledger.trades[position].fields())?;
        ledger.trades[position] = TradeRecord::new(trade_id, fields);

        let warnings = analytics::recompute_ledger(&mut ledger.trades, settings, journal.instruments())?;
        Ok(TradeOutcome {
            trade: ledger.trades[position].clone(),
            warnings,
        })
    })?;

    log::info!("Edited trade {}", trade_id);
    log_warnings(&outcome.warnings);
    Ok(outcome)
}

/// Rebuilds every derived field from the raw inputs and saves the result.
pub fn recompute_ledger(journal: &Journal) -> Result<Vec<JournalWarning>> {
    let warnings = journal.mutate_ledger(|ledger, settings| {
        analytics::recompute_ledger(&mut ledger.trades, settings, journal.instruments())
    })?;
    log::info!("Ledger recomputed");
    log_warnings(&warnings);
    Ok(warnings)
}

/// Compares stored derived fields against a fresh recomputation without
/// saving anything.
pub fn verify_ledger(journal: &Journal) -> Result<Vec<DriftReport>> {
    journal.with_ledger(|ledger, settings| analytics::verify_ledger(&ledger.trades, settings, journal.instruments()))
}
