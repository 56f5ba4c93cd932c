pub mod analytics;
pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod journal;
pub mod models;
pub mod store;

pub use config::{Backend, JournalConfig};
pub use error::{JournalError, JournalWarning, Result};
pub use journal::Journal;

use anyhow::Context;

/// Opens the journal described by the environment and prints a JSON
/// dashboard summary of the ledger.
pub fn run() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let (config_path, config) = JournalConfig::from_env()
        .context("Failed to load journal configuration")?;

    let ledger_path = config.ledger_path();
    log::info!("Ledger path: {}", ledger_path.display());

    let backend = config.backend;
    let data_dir = config.data_dir.clone();
    let journal = match Journal::open(config, Some(config_path)) {
        Ok(journal) => journal,
        Err(e) => {
            log::error!("Journal initialization failed: {}", e);
            if backend == Backend::Sqlite {
                log::error!(
                    "Database backups taken before each migration are in {}",
                    data_dir.join("backups").display()
                );
            }
            return Err(e).context("Failed to open journal");
        }
    };

    let warnings = commands::verify_ledger(&journal)?;
    if !warnings.is_empty() {
        log::warn!("Run a recompute to repair {} drifted record(s)", warnings.len());
    }

    let summary = serde_json::json!({
        "ledger": ledger_path,
        "settings": commands::get_settings(&journal)?,
        "dashboard": commands::get_dashboard_stats(&journal, commands::DateRange::All)?,
        "performance": commands::get_performance_summary(&journal, None)?,
        "drifted_records": warnings.len(),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}
