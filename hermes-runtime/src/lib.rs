//! Hermes runtime
//!
//! The Environment core of the Hermes multi-exchange trading framework:
//! exchange sessions with their streams, accounts and per-symbol market
//! data, trade reconciliation at startup, deterministic event wiring and
//! notification routing. Venue adapters, durable stores and notification
//! transports plug in through the trait seams in `hermes-core` and
//! `hermes-services`.

pub mod account;
pub mod environment;
pub mod errors;
pub mod indicators;
pub mod market_data;
pub mod markets;
pub mod notification;
pub mod registry;
pub mod session;
pub mod stream;

pub use account::Account;
pub use environment::Environment;
pub use errors::EnvironmentError;
pub use indicators::{StandardIndicatorSet, STANDARD_WINDOWS};
pub use market_data::MarketDataStore;
pub use markets::load_exchange_markets_with_cache;
pub use notification::{
    ChannelRouter, LogNotifier, NotifiableEvent, NotificationConfig, Notifiability, Notifier,
    ObjectChannelRouter, RoutingConfig, RoutingMode,
};
pub use registry::{CrossExchangeStrategy, SingleExchangeStrategy, StrategyRegistry};
pub use session::ExchangeSession;
pub use stream::Stream;
