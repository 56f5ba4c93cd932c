pub mod csv_store;

pub use csv_store::CsvLedgerStore;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{TradeRecord, Withdrawal};

/// Ordered trade rows plus the id high-water mark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ledger {
    pub trades: Vec<TradeRecord>,
    pub next_trade_id: u64,
}

impl Default for Ledger {
    fn default() -> Self {
        Self {
            trades: Vec::new(),
            next_trade_id: 1,
        }
    }
}

impl Ledger {
    /// Ledger for rows whose high-water mark was not persisted.
    pub fn from_trades(trades: Vec<TradeRecord>) -> Self {
        let next_trade_id = trades.iter().map(|t| t.trade_id).max().unwrap_or(0) + 1;
        Self {
            trades,
            next_trade_id,
        }
    }

    pub fn allocate_id(&mut self) -> u64 {
        let id = self.next_trade_id;
        self.next_trade_id += 1;
        id
    }

    pub fn position(&self, trade_id: u64) -> Option<usize> {
        self.trades.iter().position(|t| t.trade_id == trade_id)
    }

    pub fn get(&self, trade_id: u64) -> Option<&TradeRecord> {
        self.trades.iter().find(|t| t.trade_id == trade_id)
    }

    /// Repairs a high-water mark that falls behind the stored ids.
    pub fn normalize(&mut self) {
        let floor = self.trades.iter().map(|t| t.trade_id).max().unwrap_or(0) + 1;
        if self.next_trade_id < floor {
            log::warn!(
                "next trade id {} is behind stored ids, raising it to {}",
                self.next_trade_id,
                floor
            );
            self.next_trade_id = floor;
        }
    }
}

/// Persistence seam of the journal. `load` returns `None` when nothing
/// has been stored yet.
pub trait LedgerStore: Send {
    fn load(&self) -> Result<Option<Ledger>>;

    fn save(&mut self, ledger: &Ledger) -> Result<()>;

    fn load_withdrawals(&self) -> Result<Vec<Withdrawal>>;

    fn save_withdrawals(&mut self, withdrawals: &[Withdrawal]) -> Result<()>;

    /// Loaded ledger, or an empty one.
    fn load_or_default(&self) -> Result<Ledger> {
        let mut ledger = self.load()?.unwrap_or_default();
        ledger.normalize();
        Ok(ledger)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::trade::fixtures::fields;
    use crate::models::Direction;

    #[test]
    fn test_ids_are_never_reused() {
        let mut ledger = Ledger::default();
        let first = ledger.allocate_id();
        let second = ledger.allocate_id();
        ledger
            .trades
            .push(TradeRecord::new(first, fields("ES", Direction::Long, 4500.0, 4510.0)));
        ledger
            .trades
            .push(TradeRecord::new(second, fields("ES", Direction::Long, 4500.0, 4510.0)));

        ledger.trades.pop();
        assert_eq!(ledger.allocate_id(), 3);
    }

    #[test]
    fn test_normalize_raises_stale_mark() {
        let trades = vec![TradeRecord::new(7, fields("ES", Direction::Long, 4500.0, 4510.0))];
        let mut ledger = Ledger {
            trades,
            next_trade_id: 2,
        };
        ledger.normalize();
        assert_eq!(ledger.next_trade_id, 8);
        assert_eq!(Ledger::from_trades(ledger.trades.clone()).next_trade_id, 8);
    }
}
