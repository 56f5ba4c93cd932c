use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{JournalError, Result};
use crate::models::{AccountSettings, InstrumentTable};

/// Path of the configuration file, overriding `./journal.toml`.
pub const CONFIG_ENV: &str = "TRADING_JOURNAL_CONFIG";
/// Data directory, overriding `data_dir` from the file.
pub const DATA_DIR_ENV: &str = "TRADING_JOURNAL_DIR";

pub const DEFAULT_CONFIG_FILE: &str = "journal.toml";

const CSV_LEDGER_FILE: &str = "trades.csv";
const SQLITE_LEDGER_FILE: &str = "trading_journal.db";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Csv,
    Sqlite,
}

/// Contents of `journal.toml`. Every section is optional.
///
/// ```toml
/// data_dir = "data"
/// backend = "sqlite"
///
/// [account]
/// initial_balance = 25000.0
/// risk_management_fee_pct = 2.0
///
/// [[instruments]]
/// ticker = "ES"
/// tick_size = 0.25
/// ticks_per_point = 4
/// tick_dollar_value = 12.5
/// point_dollar_value = 50.0
/// broker_fee_per_contract = 3.0
/// currency = "USD"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JournalConfig {
    pub data_dir: PathBuf,
    pub backend: Backend,
    pub account: AccountSettings,
    pub instruments: InstrumentTable,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            backend: Backend::default(),
            account: AccountSettings::default(),
            instruments: InstrumentTable::default(),
        }
    }
}

impl JournalConfig {
    /// Reads the file at `path`, falling back to defaults when it does not
    /// exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: JournalConfig = toml::from_str(&content)?;
        config.validate()?;

        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Config file location and contents after applying the environment
    /// overrides.
    pub fn from_env() -> Result<(PathBuf, Self)> {
        let path = std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

        let config = Self::load(&path)?.with_data_dir(std::env::var_os(DATA_DIR_ENV).map(PathBuf::from));
        Ok((path, config))
    }

    pub fn with_data_dir(mut self, data_dir: Option<PathBuf>) -> Self {
        if let Some(dir) = data_dir {
            log::debug!("Data directory overridden: {}", dir.display());
            self.data_dir = dir;
        }
        self
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        self.validate()?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.account.validate()?;

        for instrument in self.instruments.instruments() {
            if instrument.ticker.trim().is_empty() {
                return Err(JournalError::Config("instrument ticker must not be empty".to_string()));
            }
            if !instrument.point_dollar_value.is_finite() || instrument.point_dollar_value <= 0.0 {
                return Err(JournalError::Config(format!(
                    "point dollar value of {} must be positive",
                    instrument.ticker
                )));
            }
            if !instrument.broker_fee_per_contract.is_finite() || instrument.broker_fee_per_contract < 0.0 {
                return Err(JournalError::Config(format!(
                    "broker fee of {} must not be negative",
                    instrument.ticker
                )));
            }
        }
        Ok(())
    }

    /// File holding the ledger for the configured backend.
    pub fn ledger_path(&self) -> PathBuf {
        match self.backend {
            Backend::Csv => self.data_dir.join(CSV_LEDGER_FILE),
            Backend::Sqlite => self.data_dir.join(SQLITE_LEDGER_FILE),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = JournalConfig::load(&dir.path().join("journal.toml")).unwrap();
        assert_eq!(config, JournalConfig::default());
        assert_eq!(config.instruments.instruments().len(), 10);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("journal.toml");
        fs::write(
            &path,
            r#"
backend = "sqlite"

[account]
initial_balance = 25000.0
risk_management_fee_pct = 1.5
"#,
        )
        .unwrap();

        let config = JournalConfig::load(&path).unwrap();
        assert_eq!(config.backend, Backend::Sqlite);
        assert_eq!(config.account.initial_balance, 25_000.0);
        assert_eq!(config.account.currency, "USD");
        assert!(config.instruments.lookup("mes").is_some());
        assert_eq!(config.ledger_path(), PathBuf::from("data").join("trading_journal.db"));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("journal.toml");

        let mut config = JournalConfig::default().with_data_dir(Some(dir.path().to_path_buf()));
        config.account.risk_management_fee_pct = 0.5;
        config.save(&path).unwrap();

        assert_eq!(JournalConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("journal.toml");
        fs::write(&path, "[account]\ninitial_balance = 100.0\nrisk_management_fee_pct = 120.0\n").unwrap();
        assert!(matches!(JournalConfig::load(&path), Err(JournalError::Config(_))));

        fs::write(&path, "backend = \"parquet\"\n").unwrap();
        assert!(matches!(JournalConfig::load(&path), Err(JournalError::Config(_))));
    }
}
