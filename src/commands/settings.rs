use super::log_warnings;
use crate::analytics;
use crate::error::Result;
use crate::journal::Journal;
use crate::models::{AccountSettings, UpdateSettingsInput};

pub fn get_settings(journal: &Journal) -> Result<AccountSettings> {
    journal.settings()
}

/// Applies a partial settings update. Balance and fee feed every derived
/// field, so the ledger is recomputed for the new settings in the same
/// step that persists them.
pub fn update_settings(journal: &Journal, update: UpdateSettingsInput) -> Result<AccountSettings> {
    let warnings = journal.replace_settings(
        |current| update.apply(current),
        |ledger, settings| analytics::recompute_ledger(&mut ledger.trades, settings, journal.instruments()),
    )?;

    log::info!("Settings updated");
    log_warnings(&warnings);
    get_settings(journal)
}
