use rusqlite::types::Type;
use rusqlite::{params, OptionalExtension, Row};
use std::str::FromStr;

use crate::db::Database;
use crate::error::Result;
use crate::models::{TradeRecord, Withdrawal};
use crate::store::{Ledger, LedgerStore};

const TRADE_COLUMNS: &str = "trade_id, date, entry_time, exit_time, ticker, direction, contracts, \
     entry_price, exit_price, setup, entry_exit_quality, emotion, risk_management_fee, \
     total_broker_fees, pnl, net_pnl, return_pct, cumulative_performance, performance_pct, \
     moving_average_20";

/// Ledger persisted in SQLite. Rows carry a `position` column so the
/// ledger order survives independently of ids and dates.
pub struct SqliteLedgerStore {
    db: Database,
}

impl SqliteLedgerStore {
    pub fn open(db_path: &str) -> Result<Self> {
        Ok(Self {
            db: Database::open(db_path)?,
        })
    }

    pub fn in_memory() -> Result<Self> {
        Ok(Self {
            db: Database::open_in_memory()?,
        })
    }
}

// Dates, times and tags are stored as their display text.
fn parse_column<T>(idx: usize, value: &str) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn map_row_to_trade(row: &Row) -> rusqlite::Result<TradeRecord> {
    let exit_time: Option<String> = row.get(3)?;

    Ok(TradeRecord {
        trade_id: row.get(0)?,
        date: parse_column(1, &row.get::<_, String>(1)?)?,
        entry_time: parse_column(2, &row.get::<_, String>(2)?)?,
        exit_time: exit_time.map(|t| parse_column(3, &t)).transpose()?,
        ticker: row.get(4)?,
        direction: parse_column(5, &row.get::<_, String>(5)?)?,
        contracts: row.get(6)?,
        entry_price: row.get(7)?,
        exit_price: row.get(8)?,
        setup: parse_column(9, &row.get::<_, String>(9)?)?,
        entry_exit_quality: parse_column(10, &row.get::<_, String>(10)?)?,
        emotion: parse_column(11, &row.get::<_, String>(11)?)?,
        risk_management_fee: row.get(12)?,
        total_broker_fees: row.get(13)?,
        pnl: row.get(14)?,
        net_pnl: row.get(15)?,
        return_pct: row.get(16)?,
        cumulative_performance: row.get(17)?,
        performance_pct: row.get(18)?,
        moving_average_20: row.get(19)?,
    })
}

impl LedgerStore for SqliteLedgerStore {
    fn load(&self) -> Result<Option<Ledger>> {
        let conn = self.db.conn();

        let next_trade_id: Option<u64> = conn
            .query_row("SELECT next_trade_id FROM ledger_meta WHERE id = 1", [], |row| row.get(0))
            .optional()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM trades ORDER BY position",
            TRADE_COLUMNS
        ))?;
        let trades = stmt
            .query_map([], map_row_to_trade)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        match next_trade_id {
            Some(next_trade_id) => Ok(Some(Ledger {
                trades,
                next_trade_id,
            })),
            None if trades.is_empty() => Ok(None),
            None => {
                log::warn!("ledger_meta row missing, deriving next trade id from stored rows");
                Ok(Some(Ledger::from_trades(trades)))
            }
        }
    }

    fn save(&mut self, ledger: &Ledger) -> Result<()> {
        let tx = self.db.conn_mut().transaction()?;

        tx.execute("DELETE FROM trades", [])?;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO trades (position, {}) VALUES \
                 (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                TRADE_COLUMNS
            ))?;

            for (position, t) in ledger.trades.iter().enumerate() {
                stmt.execute(params![
                    position as i64,
                    t.trade_id,
                    t.date.to_string(),
                    t.entry_time.to_string(),
                    t.exit_time.map(|e| e.to_string()),
                    t.ticker,
                    t.direction.label(),
                    t.contracts,
                    t.entry_price,
                    t.exit_price,
                    t.setup.label(),
                    t.entry_exit_quality.label(),
                    t.emotion.label(),
                    t.risk_management_fee,
                    t.total_broker_fees,
                    t.pnl,
                    t.net_pnl,
                    t.return_pct,
                    t.cumulative_performance,
                    t.performance_pct,
                    t.moving_average_20,
                ])?;
            }
        }

        tx.execute(
            "INSERT INTO ledger_meta (id, next_trade_id) VALUES (1, ?)
             ON CONFLICT(id) DO UPDATE SET next_trade_id = excluded.next_trade_id",
            params![ledger.next_trade_id],
        )?;

        tx.commit()?;
        log::debug!("Saved {} trades to SQLite", ledger.trades.len());
        Ok(())
    }

    fn load_withdrawals(&self) -> Result<Vec<Withdrawal>> {
        let mut stmt = self
            .db
            .conn()
            .prepare("SELECT date, amount, currency FROM withdrawals ORDER BY id")?;

        let withdrawals = stmt
            .query_map([], |row| {
                Ok(Withdrawal {
                    date: parse_column(0, &row.get::<_, String>(0)?)?,
                    amount: row.get(1)?,
                    currency: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(withdrawals)
    }

    fn save_withdrawals(&mut self, withdrawals: &[Withdrawal]) -> Result<()> {
        let tx = self.db.conn_mut().transaction()?;

        tx.execute("DELETE FROM withdrawals", [])?;
        for w in withdrawals {
            tx.execute(
                "INSERT INTO withdrawals (date, amount, currency) VALUES (?, ?, ?)",
                params![w.date.to_string(), w.amount, w.currency],
            )?;
        }

        tx.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::recompute_ledger;
    use crate::models::trade::fixtures::fields;
    use crate::models::{AccountSettings, Direction, Emotion, InstrumentTable, Setup};
    use chrono::NaiveDate;

    fn sample_ledger() -> Ledger {
        let mut reopened = TradeRecord::new(9, fields("GC", Direction::Short, 2350.4, 2344.1));
        reopened.exit_time = None;
        reopened.setup = Setup::TugOfWar;
        reopened.emotion = Emotion::Fomo;

        // Ids deliberately out of order: ledger order is the row position.
        let mut trades = vec![
            TradeRecord::new(3, fields("ES", Direction::Long, 4500.0, 4510.0)),
            reopened,
            TradeRecord::new(1, fields("CL", Direction::Long, 78.42, 78.01)),
        ];
        recompute_ledger(&mut trades, &AccountSettings::default(), &InstrumentTable::default())
            .unwrap();
        Ledger {
            trades,
            next_trade_id: 10,
        }
    }

    #[test]
    fn test_empty_database_loads_none() {
        let store = SqliteLedgerStore::in_memory().unwrap();
        assert!(store.load().unwrap().is_none());
        assert!(store.load_withdrawals().unwrap().is_empty());
    }

    #[test]
    fn test_round_trip_preserves_order_and_fields() {
        let mut store = SqliteLedgerStore::in_memory().unwrap();
        let ledger = sample_ledger();

        store.save(&ledger).unwrap();
        let loaded = store.load().unwrap().unwrap();

        assert_eq!(loaded, ledger);
        let ids: Vec<u64> = loaded.trades.iter().map(|t| t.trade_id).collect();
        assert_eq!(ids, vec![3, 9, 1]);
    }

    #[test]
    fn test_save_replaces_previous_rows() {
        let mut store = SqliteLedgerStore::in_memory().unwrap();
        let mut ledger = sample_ledger();
        store.save(&ledger).unwrap();

        ledger.trades.remove(0);
        store.save(&ledger).unwrap();

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.trades.len(), 2);
        assert_eq!(loaded.next_trade_id, 10);
    }

    #[test]
    fn test_withdrawals_round_trip() {
        let mut store = SqliteLedgerStore::in_memory().unwrap();
        let withdrawals = vec![
            Withdrawal {
                date: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
                amount: 500.0,
                currency: "USD".to_string(),
            },
            Withdrawal {
                date: NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
                amount: 0.0,
                currency: "EUR".to_string(),
            },
        ];

        store.save_withdrawals(&withdrawals).unwrap();
        assert_eq!(store.load_withdrawals().unwrap(), withdrawals);
    }

    #[test]
    fn test_file_database_reopens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journal.db");
        let path = path.to_str().unwrap();

        {
            let mut store = SqliteLedgerStore::open(path).unwrap();
            store.save(&sample_ledger()).unwrap();
        }

        let store = SqliteLedgerStore::open(path).unwrap();
        assert_eq!(store.load().unwrap().unwrap(), sample_ledger());
    }
}
