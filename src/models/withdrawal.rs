use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{JournalError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Withdrawal {
    pub date: NaiveDate,
    pub amount: f64,
    pub currency: String,
}

impl Withdrawal {
    pub fn validate(&self) -> Result<()> {
        if !self.amount.is_finite() || self.amount < 0.0 {
            return Err(JournalError::InvalidWithdrawal(format!(
                "withdrawal amount must be non-negative, got {}",
                self.amount
            )));
        }
        if self.currency.trim().is_empty() {
            return Err(JournalError::InvalidWithdrawal("withdrawal currency is required".to_string()));
        }
        Ok(())
    }
}
