//! Exchange balances

use serde::{Deserialize, Serialize};

/// Balance of one currency held on the exchange
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Balance {
    /// Currency code (e.g., "JPY", "BTC")
    pub currency_code: String,
    /// Total amount
    pub amount: f64,
    /// Amount not locked by open orders
    pub available: f64,
}

impl Balance {
    pub fn new(currency_code: impl Into<String>, amount: f64, available: f64) -> Self {
        Self {
            currency_code: currency_code.into(),
            amount,
            available,
        }
    }

    /// Check if can afford amount
    pub fn can_afford(&self, amount: f64) -> bool {
        self.available >= amount
    }
}

/// Available amount of `currency_code`, zero when absent
pub fn available_of(balances: &[Balance], currency_code: &str) -> f64 {
    balances
        .iter()
        .find(|b| b.currency_code == currency_code)
        .map_or(0.0, |b| b.available)
}
