//! Session account state

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;

use hermes_core::{Balance, BalanceMap};

use crate::stream::Stream;

/// Balances for one exchange session.
///
/// Seeded from the Init-time REST snapshot, then mutated only by balance
/// events from the session's stream.
#[derive(Default)]
pub struct Account {
    balances: RwLock<BalanceMap>,
}

impl Account {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges an update into the balance map, currency by currency
    pub fn update_balances(&self, update: BalanceMap) {
        let mut balances = self.balances.write();
        for (currency, balance) in update {
            balances.insert(currency, balance);
        }
    }

    pub fn balance(&self, currency: &str) -> Option<Balance> {
        self.balances.read().get(currency).cloned()
    }

    pub fn balances(&self) -> BalanceMap {
        self.balances.read().clone()
    }

    /// Subscribes this account to the stream's balance updates
    pub fn bind_stream(self: &Arc<Self>, stream: &Stream) {
        let account = Arc::clone(self);
        stream.on_balance_update(move |balances| {
            account.update_balances(balances.clone());
        });
    }

    /// Logs the non-zero balances, one line per currency
    pub fn log_balances(&self) {
        for (currency, balance) in self.balances.read().iter() {
            if !balance.total().is_zero() {
                info!(
                    currency = currency.as_str(),
                    available = %balance.available,
                    locked = %balance.locked,
                    "balance"
                );
            }
        }
    }
}
