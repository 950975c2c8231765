//! Strategy registry
//!
//! Strategies register against an Environment-owned registry instead of a
//! process-wide map, so tests and embedders get isolated registries.
//! Strategy execution is out of scope here; the registry carries the
//! surfaces the core needs, an identifier and a subscription hook.

use std::collections::HashMap;

use crate::session::ExchangeSession;

/// Strategy bound to a single exchange session
pub trait SingleExchangeStrategy: Send + Sync {
    fn id(&self) -> &str;

    /// Declares the subscriptions the strategy needs on its session
    fn subscribe(&self, session: &mut ExchangeSession);
}

/// Strategy spanning all sessions of an Environment
pub trait CrossExchangeStrategy: Send + Sync {
    fn id(&self) -> &str;

    fn subscribe(&self, sessions: &mut [ExchangeSession]);
}

#[derive(Default)]
pub struct StrategyRegistry {
    single: HashMap<String, Box<dyn SingleExchangeStrategy>>,
    cross: HashMap<String, Box<dyn CrossExchangeStrategy>>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_single(&mut self, strategy: Box<dyn SingleExchangeStrategy>) {
        self.single.insert(strategy.id().to_string(), strategy);
    }

    pub fn register_cross(&mut self, strategy: Box<dyn CrossExchangeStrategy>) {
        self.cross.insert(strategy.id().to_string(), strategy);
    }

    pub fn single(&self, id: &str) -> Option<&dyn SingleExchangeStrategy> {
        self.single.get(id).map(|s| s.as_ref())
    }

    pub fn cross(&self, id: &str) -> Option<&dyn CrossExchangeStrategy> {
        self.cross.get(id).map(|s| s.as_ref())
    }

    pub fn is_empty(&self) -> bool {
        self.single.is_empty() && self.cross.is_empty()
    }
}
