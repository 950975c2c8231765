//! Exchange session
//!
//! One session per venue: the adapter, its stream, the account and all
//! per-symbol derived state. Once the stream is connected, the per-symbol
//! maps are mutated only by the dispatch task; everyone else reads through
//! the guarded accessors, which copy under a read lock.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::RwLock;
use rust_decimal::Decimal;

use hermes_core::{
    Channel, Exchange, Market, MarketMap, SubscribeOptions, Subscription, Trade,
};

use crate::account::Account;
use crate::indicators::StandardIndicatorSet;
use crate::market_data::MarketDataStore;
use crate::stream::Stream;

pub(crate) type SharedPrices = Arc<RwLock<HashMap<String, Decimal>>>;
pub(crate) type SharedTrades = Arc<RwLock<HashMap<String, Vec<Trade>>>>;

pub struct ExchangeSession {
    name: String,
    pub exchange: Arc<dyn Exchange>,
    pub stream: Stream,
    pub account: Arc<Account>,

    pub(crate) markets: MarketMap,
    pub(crate) subscriptions: Vec<Subscription>,
    pub(crate) loaded_symbols: HashSet<String>,

    pub(crate) trades: SharedTrades,
    pub(crate) last_prices: SharedPrices,
    pub(crate) start_prices: SharedPrices,
    pub(crate) market_data_stores: HashMap<String, Arc<MarketDataStore>>,
    pub(crate) standard_indicator_sets: HashMap<String, StandardIndicatorSet>,
}

impl ExchangeSession {
    pub fn new(name: impl Into<String>, exchange: Arc<dyn Exchange>) -> Self {
        let stream = Stream::new(exchange.new_stream());
        ExchangeSession {
            name: name.into(),
            exchange,
            stream,
            account: Arc::new(Account::new()),
            markets: MarketMap::new(),
            subscriptions: Vec::new(),
            loaded_symbols: HashSet::new(),
            trades: Arc::new(RwLock::new(HashMap::new())),
            last_prices: Arc::new(RwLock::new(HashMap::new())),
            start_prices: Arc::new(RwLock::new(HashMap::new())),
            market_data_stores: HashMap::new(),
            standard_indicator_sets: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declares interest in one channel for one symbol.
    ///
    /// The symbol joins `loaded_symbols`, so Init will build its market
    /// data store, indicator set and trade log.
    pub fn subscribe(
        &mut self,
        channel: Channel,
        symbol: impl Into<String>,
        options: SubscribeOptions,
    ) -> &mut Self {
        let symbol = symbol.into();
        self.loaded_symbols.insert(symbol.clone());
        self.subscriptions.push(Subscription {
            channel,
            symbol,
            options,
        });
        self
    }

    pub fn subscriptions(&self) -> &[Subscription] {
        &self.subscriptions
    }

    pub fn loaded_symbols(&self) -> &HashSet<String> {
        &self.loaded_symbols
    }

    pub fn markets(&self) -> &MarketMap {
        &self.markets
    }

    pub fn market(&self, symbol: &str) -> Option<&Market> {
        self.markets.get(symbol)
    }

    /// Close of the most recent closed candle observed for the symbol
    pub fn last_price(&self, symbol: &str) -> Option<Decimal> {
        self.last_prices.read().get(symbol).copied()
    }

    /// Open of the first candle closed after Connect; set at most once
    pub fn start_price(&self, symbol: &str) -> Option<Decimal> {
        self.start_prices.read().get(symbol).copied()
    }

    /// Copy of the session's trade log for one symbol
    pub fn trades(&self, symbol: &str) -> Vec<Trade> {
        self.trades.read().get(symbol).cloned().unwrap_or_default()
    }

    pub fn market_data_store(&self, symbol: &str) -> Option<&Arc<MarketDataStore>> {
        self.market_data_stores.get(symbol)
    }

    pub fn indicators(&self, symbol: &str) -> Option<&StandardIndicatorSet> {
        self.standard_indicator_sets.get(symbol)
    }
}
