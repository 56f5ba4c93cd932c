use serde::{Deserialize, Serialize};

use crate::error::{JournalWarning, Result};
use crate::models::{
    AccountSettings, Direction, InstrumentReference, TradeFields, TradeRecord, DEFAULT_BROKER_FEE,
    DEFAULT_POINT_DOLLAR_VALUE,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradePnl {
    pub points: f64,
    pub pnl: f64,
    pub risk_fee: f64,
    pub broker_fee: f64,
    pub net_pnl: f64,
    pub return_pct: f64,
    pub warning: Option<JournalWarning>,
}

/// Computes gross and net P&L of a single trade.
///
/// An unknown instrument is not an error: the trade is priced with a point
/// value of 1 and the default broker fee, and the result carries an
/// `UnknownInstrument` warning.
pub fn compute_trade_pnl(
    trade: &TradeFields,
    instrument: Option<&InstrumentReference>,
    settings: &AccountSettings,
) -> Result<TradePnl> {
    trade.validate()?;

    let points = match trade.direction {
        Direction::Long => trade.exit_price - trade.entry_price,
        Direction::Short => trade.entry_price - trade.exit_price,
    };

    let (point_dollar_value, fee_per_contract, warning) = match instrument {
        Some(inst) => (inst.point_dollar_value, inst.broker_fee_per_contract, None),
        None => (
            DEFAULT_POINT_DOLLAR_VALUE,
            DEFAULT_BROKER_FEE,
            Some(JournalWarning::UnknownInstrument {
                ticker: trade.ticker.clone(),
            }),
        ),
    };

    let contracts = trade.contracts as f64;
    let pnl = contracts * points * point_dollar_value;
    let risk_fee = (settings.risk_management_fee_pct / 100.0) * trade.entry_price * contracts;
    let broker_fee = fee_per_contract * contracts;
    let net_pnl = pnl - risk_fee - broker_fee;
    let return_pct = round2(points / trade.entry_price * 100.0);

    Ok(TradePnl {
        points,
        pnl,
        risk_fee,
        broker_fee,
        net_pnl,
        return_pct,
        warning,
    })
}

/// Writes the per-trade derived fields onto a record.
pub fn apply_pnl(record: &mut TradeRecord, pnl: &TradePnl) {
    record.pnl = pnl.pnl;
    record.risk_management_fee = pnl.risk_fee;
    record.total_broker_fees = pnl.broker_fee;
    record.net_pnl = pnl.net_pnl;
    record.return_pct = pnl.return_pct;
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::trade::fixtures::fields;
    use crate::models::InstrumentTable;

    fn settings() -> AccountSettings {
        AccountSettings {
            initial_balance: 50_000.0,
            risk_management_fee_pct: 2.0,
            currency: "USD".to_string(),
        }
    }

    #[test]
    fn test_es_long_scenario() {
        let table = InstrumentTable::default();
        let trade = fields("ES", Direction::Long, 4500.0, 4510.0);

        let result = compute_trade_pnl(&trade, table.lookup("ES"), &settings()).unwrap();

        assert_eq!(result.points, 10.0);
        assert_eq!(result.pnl, 500.0);
        assert!((result.risk_fee - 90.0).abs() < 1e-9);
        assert_eq!(result.broker_fee, 3.0);
        assert!((result.net_pnl - 407.0).abs() < 1e-9);
        assert_eq!(result.return_pct, 0.22);
        assert!(result.warning.is_none());
    }

    #[test]
    fn test_es_short_scenario_matches_long() {
        let table = InstrumentTable::default();
        let trade = fields("ES", Direction::Short, 4500.0, 4490.0);

        let result = compute_trade_pnl(&trade, table.lookup("ES"), &settings()).unwrap();

        assert_eq!(result.points, 10.0);
        assert!((result.net_pnl - 407.0).abs() < 1e-9);
        assert_eq!(result.return_pct, 0.22);
    }

    #[test]
    fn test_net_pnl_identity() {
        let table = InstrumentTable::default();
        let mut trade = fields("CL", Direction::Short, 78.42, 79.13);
        trade.contracts = 3;

        let r = compute_trade_pnl(&trade, table.lookup("CL"), &settings()).unwrap();
        assert_eq!(r.net_pnl, r.pnl - r.risk_fee - r.broker_fee);
        assert!(r.pnl < 0.0);
        assert_eq!(r.broker_fee, 9.0);
    }

    #[test]
    fn test_unknown_instrument_degrades() {
        let trade = fields("BTC", Direction::Long, 100.0, 110.0);

        let r = compute_trade_pnl(&trade, None, &settings()).unwrap();

        assert_eq!(r.pnl, 10.0);
        assert_eq!(r.broker_fee, 3.0);
        assert!((r.net_pnl - (10.0 - 2.0 - 3.0)).abs() < 1e-9);
        assert_eq!(
            r.warning,
            Some(JournalWarning::UnknownInstrument {
                ticker: "BTC".to_string()
            })
        );
    }

    #[test]
    fn test_losing_long_return_is_negative() {
        let table = InstrumentTable::default();
        let trade = fields("NQ", Direction::Long, 18000.0, 17910.0);
        let r = compute_trade_pnl(&trade, table.lookup("NQ"), &settings()).unwrap();
        assert_eq!(r.return_pct, -0.5);
        assert_eq!(r.pnl, -1800.0);
    }

    #[test]
    fn test_invalid_trade_rejected() {
        let mut trade = fields("ES", Direction::Long, 4500.0, 4510.0);
        trade.entry_price = 0.0;
        assert!(compute_trade_pnl(&trade, None, &settings()).is_err());

        let mut trade = fields("ES", Direction::Long, 4500.0, 4510.0);
        trade.contracts = 0;
        assert!(compute_trade_pnl(&trade, None, &settings()).is_err());
    }
}
