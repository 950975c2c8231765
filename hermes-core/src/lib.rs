//! Hermes core domain
//!
//! Domain types shared by every Hermes crate: trades, candles, balances,
//! market metadata, stream events, the venue adapter capability traits and
//! the incremental statistics used by the standard indicator set.

pub mod entities;
pub mod events;
pub mod exchange;
pub mod stats;

pub use entities::{
    Balance, BalanceMap, Channel, Interval, IntervalParseError, KLine, KLineQueryOptions, Market,
    MarketMap, Order, OrderBook, OrderStatus, OrderType, PnLReport, PriceLevel, Side,
    SubmitOrder, SubscribeOptions, Subscription, Trade, TradeQueryOptions,
};
pub use events::StreamEvent;
pub use exchange::{Exchange, StreamSetup, StreamTransport, TradeHistorySource, VenueError};
