//! Shared test doubles: a scriptable mock venue and a recording notifier.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use hermes_core::{
    Balance, BalanceMap, Exchange, Interval, KLine, KLineQueryOptions, Market, MarketMap, Side,
    StreamEvent, StreamSetup, StreamTransport, Trade, TradeHistorySource, TradeQueryOptions,
    VenueError,
};
use hermes_runtime::notification::{NotifiableEvent, Notifier};

/// Transport double that records every connect call
#[derive(Default)]
pub struct MockTransport {
    pub connects: Mutex<Vec<StreamSetup>>,
    pub fail_connect: AtomicBool,
}

impl MockTransport {
    pub fn connect_count(&self) -> usize {
        self.connects.lock().len()
    }
}

#[async_trait]
impl StreamTransport for MockTransport {
    async fn connect(
        &self,
        setup: StreamSetup,
        _events: mpsc::Sender<StreamEvent>,
        _cancel: CancellationToken,
    ) -> Result<(), VenueError> {
        if self.fail_connect.load(Ordering::Relaxed) {
            return Err(VenueError::Network("mock transport refused".to_string()));
        }
        self.connects.lock().push(setup);
        Ok(())
    }
}

/// Scriptable venue adapter
pub struct MockExchange {
    name: String,
    fee_currency: String,
    markets: MarketMap,
    balances: BalanceMap,
    klines: Mutex<HashMap<(String, Interval), Vec<KLine>>>,
    trade_history: Mutex<HashMap<String, Vec<Trade>>>,
    pub kline_queries: Mutex<Vec<(String, Interval, KLineQueryOptions)>>,
    pub market_query_count: AtomicUsize,
    pub transport: Arc<MockTransport>,
}

impl MockExchange {
    pub fn new(name: impl Into<String>) -> Self {
        MockExchange {
            name: name.into(),
            fee_currency: "BNB".to_string(),
            markets: MarketMap::new(),
            balances: BalanceMap::new(),
            klines: Mutex::new(HashMap::new()),
            trade_history: Mutex::new(HashMap::new()),
            kline_queries: Mutex::new(Vec::new()),
            market_query_count: AtomicUsize::new(0),
            transport: Arc::new(MockTransport::default()),
        }
    }

    pub fn with_market(mut self, symbol: &str) -> Self {
        self.markets.insert(symbol.to_string(), market(symbol));
        self
    }

    pub fn with_balance(mut self, currency: &str, available: Decimal) -> Self {
        self.balances.insert(
            currency.to_string(),
            Balance::new(currency, available, Decimal::ZERO),
        );
        self
    }

    pub fn with_klines(self, symbol: &str, interval: Interval, klines: Vec<KLine>) -> Self {
        self.klines
            .lock()
            .insert((symbol.to_string(), interval), klines);
        self
    }

    pub fn with_trade_history(self, symbol: &str, trades: Vec<Trade>) -> Self {
        self.trade_history.lock().insert(symbol.to_string(), trades);
        self
    }
}

#[async_trait]
impl TradeHistorySource for MockExchange {
    fn name(&self) -> &str {
        &self.name
    }

    fn platform_fee_currency(&self) -> &str {
        &self.fee_currency
    }

    async fn query_trades(
        &self,
        symbol: &str,
        options: &TradeQueryOptions,
    ) -> Result<Vec<Trade>, VenueError> {
        let history = self.trade_history.lock();
        let Some(trades) = history.get(symbol) else {
            return Ok(vec![]);
        };
        Ok(trades
            .iter()
            .filter(|t| options.start_time.map_or(true, |start| t.time >= start))
            .filter(|t| options.from_id.map_or(true, |id| t.id > id))
            .take(options.limit)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl Exchange for MockExchange {
    async fn query_markets(&self) -> Result<MarketMap, VenueError> {
        self.market_query_count.fetch_add(1, Ordering::Relaxed);
        Ok(self.markets.clone())
    }

    async fn query_account_balances(&self) -> Result<BalanceMap, VenueError> {
        Ok(self.balances.clone())
    }

    async fn query_klines(
        &self,
        symbol: &str,
        interval: Interval,
        options: &KLineQueryOptions,
    ) -> Result<Vec<KLine>, VenueError> {
        self.kline_queries
            .lock()
            .push((symbol.to_string(), interval, options.clone()));

        let klines = self.klines.lock();
        let Some(window) = klines.get(&(symbol.to_string(), interval)) else {
            return Ok(vec![]);
        };

        let mut matching: Vec<KLine> = window
            .iter()
            .filter(|k| options.end_time.map_or(true, |end| k.end_time <= end))
            .cloned()
            .collect();
        if matching.len() > options.limit && options.limit > 0 {
            matching = matching.split_off(matching.len() - options.limit);
        }
        Ok(matching)
    }

    fn new_stream(&self) -> Arc<dyn StreamTransport> {
        Arc::clone(&self.transport) as Arc<dyn StreamTransport>
    }
}

/// Notifier double that records channel and text of every notification
#[derive(Default)]
pub struct RecordingNotifier {
    pub messages: Mutex<Vec<(Option<String>, String)>>,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<(Option<String>, String)> {
        self.messages.lock().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, channel: Option<&str>, text: &str, _event: &NotifiableEvent) {
        self.messages
            .lock()
            .push((channel.map(str::to_string), text.to_string()));
    }
}

pub fn market(symbol: &str) -> Market {
    Market {
        symbol: symbol.to_string(),
        tick_size: dec!(0.01),
        step_size: dec!(0.0001),
        min_notional: dec!(10),
        base_currency: symbol.trim_end_matches("USDT").to_string(),
        quote_currency: "USDT".to_string(),
    }
}

pub fn kline(
    symbol: &str,
    interval: Interval,
    start_time: DateTime<Utc>,
    open: Decimal,
    close: Decimal,
) -> KLine {
    KLine {
        symbol: symbol.to_string(),
        interval,
        open,
        high: open.max(close),
        low: open.min(close),
        close,
        volume: dec!(1),
        start_time,
        end_time: start_time + interval.duration(),
        closed: true,
    }
}

pub fn trade(exchange: &str, symbol: &str, id: u64, time: DateTime<Utc>) -> Trade {
    Trade {
        id,
        exchange: exchange.to_string(),
        symbol: symbol.to_string(),
        side: Side::Buy,
        is_buyer: true,
        is_maker: false,
        price: dec!(50000),
        quantity: dec!(0.1),
        fee: dec!(0.01),
        fee_currency: "BNB".to_string(),
        time,
    }
}
