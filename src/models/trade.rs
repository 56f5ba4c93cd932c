use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{JournalError, Result};
use crate::models::tags::{Emotion, EntryExitQuality, Setup};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    pub fn label(&self) -> &'static str {
        match self {
            Direction::Long => "Long",
            Direction::Short => "Short",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Direction {
    type Err = JournalError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "long" => Ok(Direction::Long),
            "short" => Ok(Direction::Short),
            other => Err(JournalError::InvalidTrade(format!(
                "direction must be Long or Short, got '{}'",
                other
            ))),
        }
    }
}

/// One journal row. Field names double as the CSV header of the ledger file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub trade_id: u64,
    pub date: NaiveDate,
    pub entry_time: NaiveTime,
    pub exit_time: Option<NaiveTime>, // None while the position is open
    pub ticker: String,
    pub direction: Direction,
    pub contracts: u32,
    pub entry_price: f64,
    pub exit_price: f64,
    pub setup: Setup,
    pub entry_exit_quality: EntryExitQuality,
    pub emotion: Emotion,

    // Derived
    pub risk_management_fee: f64,
    pub total_broker_fees: f64,
    pub pnl: f64,
    pub net_pnl: f64,
    pub return_pct: f64,
    pub cumulative_performance: f64,
    pub performance_pct: Option<f64>,
    pub moving_average_20: Option<f64>,
}

impl TradeRecord {
    /// Builds a record with all derived fields zeroed; callers run the
    /// P&L calculator and the equity fold before persisting it.
    pub fn new(trade_id: u64, fields: TradeFields) -> Self {
        Self {
            trade_id,
            date: fields.date,
            entry_time: fields.entry_time,
            exit_time: fields.exit_time,
            ticker: fields.ticker,
            direction: fields.direction,
            contracts: fields.contracts,
            entry_price: fields.entry_price,
            exit_price: fields.exit_price,
            setup: fields.setup,
            entry_exit_quality: fields.entry_exit_quality,
            emotion: fields.emotion,
            risk_management_fee: 0.0,
            total_broker_fees: 0.0,
            pnl: 0.0,
            net_pnl: 0.0,
            return_pct: 0.0,
            cumulative_performance: 0.0,
            performance_pct: None,
            moving_average_20: None,
        }
    }

    pub fn fields(&self) -> TradeFields {
        TradeFields {
            date: self.date,
            entry_time: self.entry_time,
            exit_time: self.exit_time,
            ticker: self.ticker.clone(),
            direction: self.direction,
            contracts: self.contracts,
            entry_price: self.entry_price,
            exit_price: self.exit_price,
            setup: self.setup,
            entry_exit_quality: self.entry_exit_quality,
            emotion: self.emotion,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.exit_time.is_some()
    }
}

/// Validated, user-entered part of a trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeFields {
    pub date: NaiveDate,
    pub entry_time: NaiveTime,
    pub exit_time: Option<NaiveTime>,
    pub ticker: String,
    pub direction: Direction,
    pub contracts: u32,
    pub entry_price: f64,
    pub exit_price: f64,
    pub setup: Setup,
    pub entry_exit_quality: EntryExitQuality,
    pub emotion: Emotion,
}

impl TradeFields {
    pub fn validate(&self) -> Result<()> {
        if self.ticker.trim().is_empty() {
            return Err(JournalError::InvalidTrade("ticker must not be empty".to_string()));
        }
        validate_price("entry price", self.entry_price)?;
        validate_price("exit price", self.exit_price)?;
        if self.contracts < 1 {
            return Err(JournalError::InvalidTrade(
                "contracts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn validate_price(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(JournalError::InvalidTrade(format!(
            "{} must be a positive number, got {}",
            name, value
        )));
    }
    Ok(())
}

/// Raw input as sent by the presentation layer. Enumerated fields arrive
/// as labels and are checked against their vocabularies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTradeInput {
    pub date: NaiveDate,
    pub entry_time: NaiveTime,
    pub exit_time: Option<NaiveTime>,
    pub ticker: String,
    pub direction: String,
    pub contracts: i64,
    pub entry_price: f64,
    pub exit_price: f64,
    pub setup: String,
    pub entry_exit: String,
    pub emotion: String,
}

impl CreateTradeInput {
    pub fn into_fields(self) -> Result<TradeFields> {
        let contracts = parse_contracts(self.contracts)?;
        let fields = TradeFields {
            date: self.date,
            entry_time: self.entry_time,
            exit_time: self.exit_time,
            ticker: self.ticker.trim().to_string(),
            direction: self.direction.parse()?,
            contracts,
            entry_price: self.entry_price,
            exit_price: self.exit_price,
            setup: self.setup.parse()?,
            entry_exit_quality: self.entry_exit.parse()?,
            emotion: self.emotion.parse()?,
        };
        fields.validate()?;
        Ok(fields)
    }
}

fn parse_contracts(contracts: i64) -> Result<u32> {
    if contracts < 1 {
        return Err(JournalError::InvalidTrade(format!(
            "contracts must be at least 1, got {}",
            contracts
        )));
    }
    u32::try_from(contracts)
        .map_err(|_| JournalError::InvalidTrade(format!("contracts out of range: {}", contracts)))
}

/// Partial edit of a trade. `exit_time: Some(None)` reopens a position.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTradeInput {
    pub date: Option<NaiveDate>,
    pub entry_time: Option<NaiveTime>,
    #[serde(default, with = "double_option")]
    pub exit_time: Option<Option<NaiveTime>>,
    pub ticker: Option<String>,
    pub direction: Option<String>,
    pub contracts: Option<i64>,
    pub entry_price: Option<f64>,
    pub exit_price: Option<f64>,
    pub setup: Option<String>,
    pub entry_exit: Option<String>,
    pub emotion: Option<String>,
}

impl UpdateTradeInput {
    /// Applies the update on top of `current` and validates the result.
    pub fn apply(&self, current: &TradeFields) -> Result<TradeFields> {
        let mut fields = current.clone();

        if let Some(date) = self.date {
            fields.date = date;
        }
        if let Some(entry_time) = self.entry_time {
            fields.entry_time = entry_time;
        }
        if let Some(exit_time) = self.exit_time {
            fields.exit_time = exit_time;
        }
        if let Some(ticker) = &self.ticker {
            fields.ticker = ticker.trim().to_string();
        }
        if let Some(direction) = &self.direction {
            fields.direction = direction.parse()?;
        }
        if let Some(contracts) = self.contracts {
            fields.contracts = parse_contracts(contracts)?;
        }
        if let Some(entry_price) = self.entry_price {
            fields.entry_price = entry_price;
        }
        if let Some(exit_price) = self.exit_price {
            fields.exit_price = exit_price;
        }
        if let Some(setup) = &self.setup {
            fields.setup = setup.parse()?;
        }
        if let Some(entry_exit) = &self.entry_exit {
            fields.entry_exit_quality = entry_exit.parse()?;
        }
        if let Some(emotion) = &self.emotion {
            fields.emotion = emotion.parse()?;
        }

        fields.validate()?;
        Ok(fields)
    }
}

// Distinguishes an absent key from an explicit null.
mod double_option {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<T, S>(value: &Option<Option<T>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: Serialize,
        S: Serializer,
    {
        match value {
            Some(inner) => inner.serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DirectionFilter {
    All,
    Long,
    Short,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderState {
    Open,
    Closed,
}

/// Single-criterion trade filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "criterion", content = "value", rename_all = "snake_case")]
pub enum TradeFilter {
    TradeId(u64),
    Ticker(String),
    Date(NaiveDate),
    Direction(DirectionFilter),
    OrderState(OrderState),
}

impl TradeFilter {
    pub fn matches(&self, trade: &TradeRecord) -> bool {
        match self {
            TradeFilter::TradeId(id) => trade.trade_id == *id,
            TradeFilter::Ticker(ticker) => trade.ticker.eq_ignore_ascii_case(ticker.trim()),
            TradeFilter::Date(date) => trade.date == *date,
            TradeFilter::Direction(DirectionFilter::All) => true,
            TradeFilter::Direction(DirectionFilter::Long) => trade.direction == Direction::Long,
            TradeFilter::Direction(DirectionFilter::Short) => trade.direction == Direction::Short,
            TradeFilter::OrderState(OrderState::Closed) => trade.is_closed(),
            TradeFilter::OrderState(OrderState::Open) => !trade.is_closed(),
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn fields(ticker: &str, direction: Direction, entry: f64, exit: f64) -> TradeFields {
        TradeFields {
            date: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
            entry_time: NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
            exit_time: Some(NaiveTime::from_hms_opt(10, 15, 0).unwrap()),
            ticker: ticker.to_string(),
            direction,
            contracts: 1,
            entry_price: entry,
            exit_price: exit,
            setup: Setup::Zone,
            entry_exit_quality: EntryExitQuality::AsPlanned,
            emotion: Emotion::ByTheRules,
        }
    }

    pub fn input(direction: &str, entry: f64, exit: f64) -> CreateTradeInput {
        CreateTradeInput {
            date: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
            entry_time: NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
            exit_time: Some(NaiveTime::from_hms_opt(10, 15, 0).unwrap()),
            ticker: "ES".to_string(),
            direction: direction.to_string(),
            contracts: 1,
            entry_price: entry,
            exit_price: exit,
            setup: "Zone".to_string(),
            entry_exit: "As Planned".to_string(),
            emotion: "By The Rules".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_direction_parsing() {
        assert_eq!("LONG".parse::<Direction>().unwrap(), Direction::Long);
        assert_eq!("short".parse::<Direction>().unwrap(), Direction::Short);
        assert!(matches!(
            "Sideways".parse::<Direction>(),
            Err(JournalError::InvalidTrade(_))
        ));
    }

    #[test]
    fn test_input_rejects_bad_values() {
        let mut bad_price = input("Long", 0.0, 4510.0);
        assert!(bad_price.clone().into_fields().is_err());
        bad_price.entry_price = -1.0;
        assert!(bad_price.into_fields().is_err());

        let mut bad_contracts = input("Long", 4500.0, 4510.0);
        bad_contracts.contracts = 0;
        assert!(bad_contracts.into_fields().is_err());

        let bad_direction = input("Flat", 4500.0, 4510.0);
        assert!(bad_direction.into_fields().is_err());

        let mut bad_tag = input("Long", 4500.0, 4510.0);
        bad_tag.emotion = "Euphoria".to_string();
        assert!(bad_tag.into_fields().is_err());
    }

    #[test]
    fn test_update_applies_partial_fields() {
        let current = fields("ES", Direction::Long, 4500.0, 4510.0);
        let update = UpdateTradeInput {
            exit_price: Some(4520.0),
            exit_time: Some(None),
            emotion: Some("Greed".to_string()),
            ..Default::default()
        };

        let updated = update.apply(&current).unwrap();
        assert_eq!(updated.exit_price, 4520.0);
        assert_eq!(updated.exit_time, None);
        assert_eq!(updated.emotion, Emotion::Greed);
        assert_eq!(updated.entry_price, 4500.0);
    }

    #[test]
    fn test_update_validates_result() {
        let current = fields("ES", Direction::Long, 4500.0, 4510.0);
        let update = UpdateTradeInput {
            contracts: Some(0),
            ..Default::default()
        };
        assert!(update.apply(&current).is_err());
    }

    #[test]
    fn test_update_exit_time_null_vs_absent() {
        let reopen: UpdateTradeInput = serde_json::from_str(r#"{"exit_time": null}"#).unwrap();
        assert_eq!(reopen.exit_time, Some(None));

        let untouched: UpdateTradeInput = serde_json::from_str("{}").unwrap();
        assert_eq!(untouched.exit_time, None);
    }

    #[test]
    fn test_filters() {
        let mut trade = TradeRecord::new(7, fields("MES", Direction::Short, 4500.0, 4490.0));

        assert!(TradeFilter::TradeId(7).matches(&trade));
        assert!(!TradeFilter::TradeId(8).matches(&trade));
        assert!(TradeFilter::Ticker("mes".to_string()).matches(&trade));
        assert!(!TradeFilter::Ticker("ES".to_string()).matches(&trade));
        assert!(TradeFilter::Date(trade.date).matches(&trade));
        assert!(TradeFilter::Direction(DirectionFilter::All).matches(&trade));
        assert!(TradeFilter::Direction(DirectionFilter::Short).matches(&trade));
        assert!(!TradeFilter::Direction(DirectionFilter::Long).matches(&trade));
        assert!(TradeFilter::OrderState(OrderState::Closed).matches(&trade));

        trade.exit_time = None;
        assert!(TradeFilter::OrderState(OrderState::Open).matches(&trade));
        assert!(!TradeFilter::OrderState(OrderState::Closed).matches(&trade));
    }
}
