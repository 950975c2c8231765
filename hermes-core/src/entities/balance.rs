use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Funds held in one currency
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Balance {
    pub currency: String,
    pub available: Decimal,
    pub locked: Decimal,
}

impl Balance {
    pub fn new(currency: impl Into<String>, available: Decimal, locked: Decimal) -> Self {
        Balance {
            currency: currency.into(),
            available,
            locked,
        }
    }

    pub fn total(&self) -> Decimal {
        self.available + self.locked
    }
}

/// Currency -> balance
pub type BalanceMap = HashMap<String, Balance>;
