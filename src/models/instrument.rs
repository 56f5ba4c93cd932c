use serde::{Deserialize, Serialize};

/// Broker fee per contract applied when a ticker is not in the table.
pub const DEFAULT_BROKER_FEE: f64 = 3.0;

/// Point value applied when a ticker is not in the table.
pub const DEFAULT_POINT_DOLLAR_VALUE: f64 = 1.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentReference {
    pub ticker: String,
    pub tick_size: f64,
    pub ticks_per_point: u32,
    pub tick_dollar_value: f64,
    pub point_dollar_value: f64,
    pub broker_fee_per_contract: f64,
    pub currency: String,
}

impl InstrumentReference {
    fn usd(
        ticker: &str,
        tick_size: f64,
        ticks_per_point: u32,
        tick_dollar_value: f64,
        point_dollar_value: f64,
    ) -> Self {
        Self {
            ticker: ticker.to_string(),
            tick_size,
            ticks_per_point,
            tick_dollar_value,
            point_dollar_value,
            broker_fee_per_contract: DEFAULT_BROKER_FEE,
            currency: "USD".to_string(),
        }
    }
}

/// Read-only lookup from ticker to contract specification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstrumentTable {
    instruments: Vec<InstrumentReference>,
}

impl InstrumentTable {
    pub fn new(instruments: Vec<InstrumentReference>) -> Self {
        Self { instruments }
    }

    pub fn lookup(&self, ticker: &str) -> Option<&InstrumentReference> {
        let ticker = ticker.trim();
        self.instruments
            .iter()
            .find(|i| i.ticker.eq_ignore_ascii_case(ticker))
    }

    pub fn instruments(&self) -> &[InstrumentReference] {
        &self.instruments
    }
}

impl Default for InstrumentTable {
    /// CME index, metal and energy futures with their micro contracts.
    fn default() -> Self {
        Self::new(vec![
            InstrumentReference::usd("ES", 0.25, 4, 12.5, 50.0),
            InstrumentReference::usd("MES", 0.25, 4, 1.25, 5.0),
            InstrumentReference::usd("YM", 1.0, 1, 5.0, 5.0),
            InstrumentReference::usd("MYM", 1.0, 1, 0.5, 0.5),
            InstrumentReference::usd("GC", 0.1, 10, 10.0, 100.0),
            InstrumentReference::usd("MGC", 0.1, 10, 1.0, 10.0),
            InstrumentReference::usd("CL", 0.01, 100, 10.0, 1000.0),
            InstrumentReference::usd("MCL", 0.01, 100, 1.0, 100.0),
            InstrumentReference::usd("NQ", 0.25, 4, 5.0, 20.0),
            InstrumentReference::usd("MNQ", 0.25, 4, 0.5, 2.0),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_lookup() {
        let table = InstrumentTable::default();
        let es = table.lookup("ES").unwrap();
        assert_eq!(es.point_dollar_value, 50.0);
        assert_eq!(es.broker_fee_per_contract, 3.0);

        let mcl = table.lookup("mcl").unwrap();
        assert_eq!(mcl.point_dollar_value, 100.0);
        assert_eq!(mcl.ticks_per_point, 100);

        assert!(table.lookup("BTC").is_none());
    }

    #[test]
    fn test_tick_value_times_ticks_equals_point_value() {
        for inst in InstrumentTable::default().instruments() {
            let point = inst.tick_dollar_value * inst.ticks_per_point as f64;
            assert!(
                (point - inst.point_dollar_value).abs() < 1e-9,
                "{} tick/point values disagree",
                inst.ticker
            );
        }
    }
}
