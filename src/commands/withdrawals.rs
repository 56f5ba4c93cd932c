use crate::error::Result;
use crate::journal::Journal;
use crate::models::Withdrawal;

/// Records a withdrawal. Withdrawals are kept for reporting only and never
/// enter the equity curve.
pub fn add_withdrawal(journal: &Journal, withdrawal: Withdrawal) -> Result<Vec<Withdrawal>> {
    withdrawal.validate()?;

    let withdrawals = journal.with_store(|store| {
        let mut withdrawals = store.load_withdrawals()?;
        withdrawals.push(withdrawal);
        store.save_withdrawals(&withdrawals)?;
        Ok(withdrawals)
    })?;

    log::info!("Withdrawal recorded ({} total)", withdrawals.len());
    Ok(withdrawals)
}

pub fn get_withdrawals(journal: &Journal) -> Result<Vec<Withdrawal>> {
    journal.with_store(|store| store.load_withdrawals())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::trades::{add_trade, get_trades};
    use crate::db::SqliteLedgerStore;
    use crate::error::JournalError;
    use crate::models::trade::fixtures::input;
    use crate::models::{AccountSettings, InstrumentTable};
    use chrono::NaiveDate;

    fn journal() -> Journal {
        Journal::new(
            Box::new(SqliteLedgerStore::in_memory().unwrap()),
            AccountSettings::default(),
            InstrumentTable::default(),
        )
    }

    #[test]
    fn test_withdrawals_do_not_touch_equity() {
        let journal = journal();
        add_trade(&journal, input("Long", 4500.0, 4510.0)).unwrap();

        add_withdrawal(
            &journal,
            Withdrawal {
                date: NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
                amount: 1_000.0,
                currency: "USD".to_string(),
            },
        )
        .unwrap();

        assert_eq!(get_withdrawals(&journal).unwrap().len(), 1);
        assert_eq!(get_trades(&journal).unwrap()[0].cumulative_performance, 50_407.0);
    }

    #[test]
    fn test_invalid_withdrawal_rejected() {
        let journal = journal();
        let result = add_withdrawal(
            &journal,
            Withdrawal {
                date: NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
                amount: -5.0,
                currency: "USD".to_string(),
            },
        );
        assert!(matches!(result, Err(JournalError::InvalidWithdrawal(_))));
        assert!(get_withdrawals(&journal).unwrap().is_empty());
    }
}
