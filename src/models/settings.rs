use serde::{Deserialize, Serialize};

use crate::error::{JournalError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountSettings {
    pub initial_balance: f64,
    pub risk_management_fee_pct: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_currency() -> String {
    "USD".to_string()
}

impl Default for AccountSettings {
    fn default() -> Self {
        Self {
            initial_balance: 50_000.0,
            risk_management_fee_pct: 2.0,
            currency: default_currency(),
        }
    }
}

impl AccountSettings {
    pub fn validate(&self) -> Result<()> {
        if !self.initial_balance.is_finite() || self.initial_balance < 0.0 {
            return Err(JournalError::Config(format!(
                "initial balance must be non-negative, got {}",
                self.initial_balance
            )));
        }
        if !(0.0..=100.0).contains(&self.risk_management_fee_pct) {
            return Err(JournalError::Config(format!(
                "risk management fee must be between 0 and 100%, got {}",
                self.risk_management_fee_pct
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateSettingsInput {
    pub initial_balance: Option<f64>,
    pub risk_management_fee_pct: Option<f64>,
    pub currency: Option<String>,
}

impl UpdateSettingsInput {
    pub fn apply(&self, current: &AccountSettings) -> Result<AccountSettings> {
        let mut settings = current.clone();
        if let Some(val) = self.initial_balance {
            settings.initial_balance = val;
        }
        if let Some(val) = self.risk_management_fee_pct {
            settings.risk_management_fee_pct = val;
        }
        if let Some(val) = &self.currency {
            settings.currency = val.clone();
        }
        settings.validate()?;
        Ok(settings)
    }
}
