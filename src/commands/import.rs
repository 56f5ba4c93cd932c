use chrono::{NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use super::log_warnings;
use crate::analytics;
use crate::error::{JournalError, JournalWarning, Result};
use crate::journal::Journal;
use crate::models::{AccountSettings, CreateTradeInput, TradeRecord, Withdrawal};
use crate::store::Ledger;

const TIME_FORMATS: &[&str] = &["%H:%M:%S%.f", "%H:%M", "%I:%M %p", "%I:%M:%S %p"];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportResult {
    pub imported: usize,
    pub warnings: Vec<JournalWarning>,
}

/// Row of an uploaded trade log. Accepts the spreadsheet's Title Case
/// headers as well as the ledger's own column names; any other column
/// (ids, derived values) is ignored and recomputed.
#[derive(Debug, Deserialize)]
struct TradeLogRow {
    #[serde(alias = "Date")]
    date: String,
    #[serde(alias = "Entry Time")]
    entry_time: String,
    #[serde(alias = "Exit Time", default)]
    exit_time: Option<String>,
    #[serde(alias = "Ticker")]
    ticker: String,
    #[serde(alias = "Direction")]
    direction: String,
    #[serde(alias = "Contracts")]
    contracts: f64,
    #[serde(alias = "Entry Price")]
    entry_price: f64,
    #[serde(alias = "Exit Price")]
    exit_price: f64,
    #[serde(alias = "Setup")]
    setup: String,
    #[serde(alias = "Entry/Exit", alias = "entry_exit_quality")]
    entry_exit: String,
    #[serde(alias = "Emotion")]
    emotion: String,
}

fn parse_date(value: &str) -> Result<NaiveDate> {
    let value = value.trim();
    // Spreadsheet exports may carry a midnight time after the date.
    let value = value.split_whitespace().next().unwrap_or(value);
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        .ok_or_else(|| JournalError::InvalidTrade(format!("unrecognised date '{}'", value)))
}

fn parse_time(value: &str) -> Result<NaiveTime> {
    let value = value.trim();
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(value, fmt).ok())
        .ok_or_else(|| JournalError::InvalidTrade(format!("unrecognised time '{}'", value)))
}

impl TradeLogRow {
    fn into_input(self) -> Result<CreateTradeInput> {
        if self.contracts.fract() != 0.0 {
            return Err(JournalError::InvalidTrade(format!(
                "contracts must be a whole number, got {}",
                self.contracts
            )));
        }

        let exit_time = match self.exit_time.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(t) => Some(parse_time(t)?),
        };

        Ok(CreateTradeInput {
            date: parse_date(&self.date)?,
            entry_time: parse_time(&self.entry_time)?,
            exit_time,
            ticker: self.ticker,
            direction: self.direction,
            contracts: self.contracts as i64,
            entry_price: self.entry_price,
            exit_price: self.exit_price,
            setup: self.setup,
            entry_exit: self.entry_exit,
            emotion: self.emotion,
        })
    }
}

fn parse_trade_log(csv_content: &str) -> Result<Vec<TradeRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(csv_content.as_bytes());

    let mut trades = Vec::new();
    for (index, row) in reader.deserialize::<TradeLogRow>().enumerate() {
        // Line 1 is the header.
        let line = index + 2;
        let fields = row
            .map_err(JournalError::from)
            .and_then(|row| row.into_input()?.into_fields())
            .map_err(|e| JournalError::InvalidTrade(format!("line {}: {}", line, e)))?;
        trades.push(TradeRecord::new(trades.len() as u64 + 1, fields));
    }
    Ok(trades)
}

/// Replaces the ledger with an uploaded trade log. Ids are reassigned
/// from 1 in file order and every derived column is recomputed. A single
/// bad row rejects the whole file. Ids handed out before the upload are
/// still never reused.
pub fn import_trade_log_csv(journal: &Journal, csv_content: &str) -> Result<ImportResult> {
    let mut trades = parse_trade_log(csv_content)?;
    let imported = trades.len();

    let warnings = journal.mutate_ledger(|ledger, settings| {
        let warnings = analytics::recompute_ledger(&mut trades, settings, journal.instruments())?;
        let next_trade_id = ledger.next_trade_id.max(imported as u64 + 1);
        *ledger = Ledger {
            trades,
            next_trade_id,
        };
        Ok(warnings)
    })?;

    log::info!("Imported {} trades from trade log", imported);
    log_warnings(&warnings);
    Ok(ImportResult { imported, warnings })
}

// Data Export/Import

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupData {
    pub settings: AccountSettings,
    pub trades: Vec<TradeRecord>,
    #[serde(default)]
    pub next_trade_id: Option<u64>,
    #[serde(default)]
    pub withdrawals: Vec<Withdrawal>,
    pub export_date: String,
    pub version: String,
}

/// Serialises settings, ledger and withdrawals to pretty JSON.
pub fn export_all_data(journal: &Journal) -> Result<String> {
    let (settings, ledger) = journal.with_ledger(|ledger, settings| Ok((settings.clone(), ledger.clone())))?;
    let withdrawals = journal.with_store(|store| store.load_withdrawals())?;

    let backup = BackupData {
        settings,
        trades: ledger.trades,
        next_trade_id: Some(ledger.next_trade_id),
        withdrawals,
        export_date: Utc::now().to_rfc3339(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    Ok(serde_json::to_string_pretty(&backup)?)
}

/// Restores a JSON backup, replacing settings, ledger and withdrawals.
/// Derived fields are recomputed rather than trusted.
pub fn import_all_data(journal: &Journal, json_data: &str) -> Result<ImportResult> {
    let backup: BackupData = serde_json::from_str(json_data)?;
    backup.settings.validate()?;
    for withdrawal in &backup.withdrawals {
        withdrawal.validate()?;
    }

    let mut ledger = match backup.next_trade_id {
        Some(next_trade_id) => Ledger {
            trades: backup.trades,
            next_trade_id,
        },
        None => Ledger::from_trades(backup.trades),
    };
    ledger.normalize();
    let imported = ledger.trades.len();

    let warnings = journal.replace_settings(|_| Ok(backup.settings), |current, settings| {
        let warnings = analytics::recompute_ledger(&mut ledger.trades, settings, journal.instruments())?;
        *current = ledger;
        Ok(warnings)
    })?;
    journal.with_store(|store| store.save_withdrawals(&backup.withdrawals))?;

    log::info!("Restored backup from {} ({} trades)", backup.export_date, imported);
    log_warnings(&warnings);
    Ok(ImportResult { imported, warnings })
}
