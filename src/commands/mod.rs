pub mod import;
pub mod reports;
pub mod settings;
pub mod stats;
pub mod trades;
pub mod withdrawals;

pub use import::*;
pub use reports::*;
pub use settings::*;
pub use stats::*;
pub use trades::*;
pub use withdrawals::*;

use std::collections::HashSet;

use crate::error::JournalWarning;

fn distinct_messages(warnings: &[JournalWarning]) -> Vec<String> {
    let mut seen = HashSet::new();
    warnings
        .iter()
        .map(ToString::to_string)
        .filter(|message| seen.insert(message.clone()))
        .collect()
}

/// Logs each distinct warning once, however many rows raised it.
pub(crate) fn log_warnings(warnings: &[JournalWarning]) {
    for message in distinct_messages(warnings) {
        log::warn!("{}", message);
    }
}
