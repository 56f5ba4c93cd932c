use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum JournalError {
    #[error("Invalid trade: {0}")]
    InvalidTrade(String),

    #[error("Invalid withdrawal: {0}")]
    InvalidWithdrawal(String),

    #[error("Trade with ID {0} not found")]
    NotFound(u64),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<toml::de::Error> for JournalError {
    fn from(err: toml::de::Error) -> Self {
        JournalError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for JournalError {
    fn from(err: toml::ser::Error) -> Self {
        JournalError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, JournalError>;

/// Non-fatal conditions reported alongside a successful computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JournalWarning {
    /// Ticker missing from the instrument table; default fee and point value were used.
    UnknownInstrument { ticker: String },
    /// Previous equity was zero, so the trade-over-trade performance is undefined.
    UndefinedPerformance { trade_id: u64 },
}

impl std::fmt::Display for JournalWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JournalWarning::UnknownInstrument { ticker } => {
                write!(f, "Unknown instrument '{}': using default fees and point value", ticker)
            }
            JournalWarning::UndefinedPerformance { trade_id } => {
                write!(f, "Performance % undefined for trade {} (previous equity is zero)", trade_id)
            }
        }
    }
}
