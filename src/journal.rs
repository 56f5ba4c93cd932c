use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use crate::config::{Backend, JournalConfig};
use crate::db::SqliteLedgerStore;
use crate::error::{JournalError, Result};
use crate::models::{AccountSettings, InstrumentTable};
use crate::store::{CsvLedgerStore, Ledger, LedgerStore};

/// Shared state behind every command: the ledger store, the account
/// settings and the instrument table.
///
/// Store and settings sit behind one mutex, so a command that derives
/// fields always sees the settings the ledger is saved with. Nothing read
/// from the store is cached.
pub struct Journal {
    state: Mutex<JournalState>,
    instruments: InstrumentTable,
    config: Option<(PathBuf, JournalConfig)>,
}

struct JournalState {
    store: Box<dyn LedgerStore>,
    settings: AccountSettings,
}

impl Journal {
    pub fn new(store: Box<dyn LedgerStore>, settings: AccountSettings, instruments: InstrumentTable) -> Self {
        Self {
            state: Mutex::new(JournalState { store, settings }),
            instruments,
            config: None,
        }
    }

    /// Opens the configured backend under `data_dir`. When `config_path`
    /// is given, settings updates are written back to it.
    pub fn open(config: JournalConfig, config_path: Option<PathBuf>) -> Result<Self> {
        config.validate()?;
        fs::create_dir_all(&config.data_dir)?;

        let ledger_path = config.ledger_path();
        let store: Box<dyn LedgerStore> = match config.backend {
            Backend::Csv => Box::new(CsvLedgerStore::new(&ledger_path)),
            Backend::Sqlite => {
                let path = ledger_path.to_str().ok_or_else(|| {
                    JournalError::Config(format!("non UTF-8 database path: {}", ledger_path.display()))
                })?;
                Box::new(SqliteLedgerStore::open(path)?)
            }
        };
        log::info!("Journal opened ({:?} backend at {})", config.backend, ledger_path.display());

        let mut journal = Self::new(store, config.account.clone(), config.instruments.clone());
        journal.config = config_path.map(|path| (path, config));
        Ok(journal)
    }

    fn lock(&self) -> Result<MutexGuard<'_, JournalState>> {
        self.state
            .lock()
            .map_err(|e| JournalError::Storage(format!("journal lock poisoned: {}", e)))
    }

    pub fn settings(&self) -> Result<AccountSettings> {
        Ok(self.lock()?.settings.clone())
    }

    pub fn instruments(&self) -> &InstrumentTable {
        &self.instruments
    }

    fn write_config(&self, settings: &AccountSettings) -> Result<()> {
        if let Some((path, config)) = &self.config {
            let mut config = config.clone();
            config.account = settings.clone();
            config.save(path)?;
            log::info!("Settings saved to {}", path.display());
        }
        Ok(())
    }

    /// Runs `f` against the current ledger and the settings it was
    /// derived with.
    pub(crate) fn with_ledger<T>(&self, f: impl FnOnce(&Ledger, &AccountSettings) -> Result<T>) -> Result<T> {
        let state = self.lock()?;
        let ledger = state.store.load_or_default()?;
        f(&ledger, &state.settings)
    }

    /// Loads, mutates and saves the ledger under a single lock. Nothing is
    /// saved when `f` fails.
    pub(crate) fn mutate_ledger<T>(
        &self,
        f: impl FnOnce(&mut Ledger, &AccountSettings) -> Result<T>,
    ) -> Result<T> {
        let mut state = self.lock()?;
        let mut ledger = state.store.load_or_default()?;
        let value = f(&mut ledger, &state.settings)?;
        state.store.save(&ledger)?;
        Ok(value)
    }

    /// Derives new settings from the current ones and lets `f` rebuild the
    /// ledger for them, all under the journal lock.
    ///
    /// The config file is written before the ledger is saved. If the config
    /// write fails nothing changes; if the ledger save fails the previous
    /// settings are written back. In-memory settings change last.
    pub(crate) fn replace_settings<T>(
        &self,
        update: impl FnOnce(&AccountSettings) -> Result<AccountSettings>,
        f: impl FnOnce(&mut Ledger, &AccountSettings) -> Result<T>,
    ) -> Result<T> {
        let mut state = self.lock()?;
        let settings = update(&state.settings)?;
        let mut ledger = state.store.load_or_default()?;
        let value = f(&mut ledger, &settings)?;

        self.write_config(&settings)?;
        if let Err(e) = state.store.save(&ledger) {
            if let Err(restore) = self.write_config(&state.settings) {
                log::error!("Failed to restore previous settings in config: {}", restore);
            }
            return Err(e);
        }

        state.settings = settings;
        Ok(value)
    }

    pub(crate) fn with_store<T>(&self, f: impl FnOnce(&mut dyn LedgerStore) -> Result<T>) -> Result<T> {
        let mut state = self.lock()?;
        f(&mut *state.store)
    }
}
