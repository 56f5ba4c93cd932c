use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{JournalError, Result};
use crate::models::{TradeRecord, Withdrawal};
use crate::store::{Ledger, LedgerStore};

#[derive(Debug, Serialize, Deserialize)]
struct LedgerMeta {
    next_trade_id: u64,
}

/// Flat-file ledger: one CSV row per trade, derived columns included.
///
/// Next to `trades.csv` it keeps `trades.meta.json` with the id
/// high-water mark and `trades.withdrawals.csv`. Every save rewrites the
/// whole file through a temporary sibling and a rename.
#[derive(Debug, Clone)]
pub struct CsvLedgerStore {
    trades_path: PathBuf,
    meta_path: PathBuf,
    withdrawals_path: PathBuf,
}

impl CsvLedgerStore {
    pub fn new(trades_path: impl Into<PathBuf>) -> Self {
        let trades_path = trades_path.into();
        let stem = trades_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("trades")
            .to_string();
        let meta_path = trades_path.with_file_name(format!("{}.meta.json", stem));
        let withdrawals_path = trades_path.with_file_name(format!("{}.withdrawals.csv", stem));

        Self {
            trades_path,
            meta_path,
            withdrawals_path,
        }
    }

    fn read_meta(&self) -> Result<Option<LedgerMeta>> {
        if !self.meta_path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.meta_path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }
}

fn read_rows<T>(path: &Path) -> Result<Option<Vec<T>>>
where
    T: for<'de> Deserialize<'de>,
{
    if !path.exists() {
        return Ok(None);
    }
    let mut reader = csv::Reader::from_path(path)?;
    let rows = reader
        .deserialize()
        .collect::<std::result::Result<Vec<T>, csv::Error>>()?;
    Ok(Some(rows))
}

fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

fn write_rows<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer.serialize(row)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| JournalError::Storage(e.to_string()))?;
    write_atomically(path, &bytes)
}

impl LedgerStore for CsvLedgerStore {
    fn load(&self) -> Result<Option<Ledger>> {
        let Some(trades) = read_rows::<TradeRecord>(&self.trades_path)? else {
            log::debug!("No ledger at {}", self.trades_path.display());
            return Ok(None);
        };

        let ledger = match self.read_meta()? {
            Some(meta) => Ledger {
                trades,
                next_trade_id: meta.next_trade_id,
            },
            None => {
                log::warn!(
                    "Missing {}, deriving next trade id from stored rows",
                    self.meta_path.display()
                );
                Ledger::from_trades(trades)
            }
        };

        log::debug!(
            "Loaded {} trades from {}",
            ledger.trades.len(),
            self.trades_path.display()
        );
        Ok(Some(ledger))
    }

    fn save(&mut self, ledger: &Ledger) -> Result<()> {
        write_rows(&self.trades_path, &ledger.trades)?;

        let meta = LedgerMeta {
            next_trade_id: ledger.next_trade_id,
        };
        write_atomically(&self.meta_path, serde_json::to_string_pretty(&meta)?.as_bytes())?;

        log::debug!(
            "Saved {} trades to {}",
            ledger.trades.len(),
            self.trades_path.display()
        );
        Ok(())
    }

    fn load_withdrawals(&self) -> Result<Vec<Withdrawal>> {
        Ok(read_rows(&self.withdrawals_path)?.unwrap_or_default())
    }

    fn save_withdrawals(&mut self, withdrawals: &[Withdrawal]) -> Result<()> {
        write_rows(&self.withdrawals_path, withdrawals)
    }
}
