//! Environment orchestrator
//!
//! Owns the exchange sessions and runs the two-phase lifecycle: `init`
//! reconciles persisted trades with venue history, seeds indicators from
//! historical candles and wires the default stream handlers; `connect`
//! forwards the recorded subscriptions and opens each session's transport.
//! After `connect` the system is event-driven.

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use hermes_core::{Channel, Exchange, Interval, KLineQueryOptions, VenueError};
use hermes_services::{
    KeyValueStore, PersistenceConfig, PersistenceServiceFacade, TradeStore, TradeSyncService,
};

use crate::errors::EnvironmentError;
use crate::indicators::StandardIndicatorSet;
use crate::market_data::MarketDataStore;
use crate::markets::load_exchange_markets_with_cache;
use crate::notification::{
    render_order_report, render_trade_report, NotifiableEvent, NotificationConfig, Notifiability,
    Notifier, RoutingMode,
};
use crate::registry::StrategyRegistry;
use crate::session::ExchangeSession;

/// Candles requested per (symbol, interval) when seeding history;
/// indicators need at least 100
const KLINE_SEED_LIMIT: usize = 1000;

/// Default trade scan window: sync from seven days ago
const DEFAULT_TRADE_SCAN_DAYS: i64 = 7;

pub struct Environment {
    notifiability: Arc<Notifiability>,
    persistence: PersistenceServiceFacade,
    trade_store: Option<Arc<dyn TradeStore>>,
    trade_sync: Option<TradeSyncService>,
    strategies: StrategyRegistry,
    start_time: Option<DateTime<Utc>>,
    trade_scan_time: DateTime<Utc>,
    sessions: Vec<ExchangeSession>,
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            notifiability: Arc::new(Notifiability::new()),
            persistence: PersistenceServiceFacade::new(),
            trade_store: None,
            trade_sync: None,
            strategies: StrategyRegistry::new(),
            start_time: None,
            trade_scan_time: Utc::now() - Duration::days(DEFAULT_TRADE_SCAN_DAYS),
            sessions: Vec::new(),
        }
    }

    pub fn with_strategies(mut self, strategies: StrategyRegistry) -> Self {
        self.strategies = strategies;
        self
    }

    /// Creates a session for a venue under a unique name.
    ///
    /// Adding a second session under the same name replaces the first; a
    /// session is identified by its name, not its venue.
    pub fn add_exchange(
        &mut self,
        name: impl Into<String>,
        exchange: Arc<dyn Exchange>,
    ) -> &mut ExchangeSession {
        let name = name.into();
        let session = ExchangeSession::new(name.clone(), exchange);
        let index = match self.sessions.iter().position(|s| s.name() == name) {
            Some(index) => {
                self.sessions[index] = session;
                index
            }
            None => {
                self.sessions.push(session);
                self.sessions.len() - 1
            }
        };
        &mut self.sessions[index]
    }

    pub fn sessions(&self) -> &[ExchangeSession] {
        &self.sessions
    }

    pub fn session(&self, name: &str) -> Option<&ExchangeSession> {
        self.sessions.iter().find(|s| s.name() == name)
    }

    pub fn session_mut(&mut self, name: &str) -> Option<&mut ExchangeSession> {
        self.sessions.iter_mut().find(|s| s.name() == name)
    }

    /// Wires a trade store and the sync service over it.
    ///
    /// With this configured, `init` reconciles each loaded symbol against
    /// venue history and inserts observed trades durably at runtime.
    pub fn sync_trades(&mut self, store: Arc<dyn TradeStore>) -> &mut Self {
        self.trade_sync = Some(TradeSyncService::new(Arc::clone(&store)));
        self.trade_store = Some(store);
        self
    }

    /// Fixes the history-seed anchor, e.g. for backtests. When unset,
    /// `init` anchors at the wall clock.
    pub fn set_start_time(&mut self, time: DateTime<Utc>) -> &mut Self {
        self.start_time = Some(time);
        self
    }

    /// Overrides the default trade scan cutoff (seven days ago)
    pub fn sync_trades_from(&mut self, time: DateTime<Utc>) -> &mut Self {
        self.trade_scan_time = time;
        self
    }

    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.start_time
    }

    pub fn trade_scan_time(&self) -> DateTime<Utc> {
        self.trade_scan_time
    }

    pub fn strategies(&self) -> &StrategyRegistry {
        &self.strategies
    }

    pub fn persistence(&self) -> &PersistenceServiceFacade {
        &self.persistence
    }

    pub fn notifiability(&self) -> &Arc<Notifiability> {
        &self.notifiability
    }

    pub fn add_notifier(&self, notifier: Arc<dyn Notifier>) {
        self.notifiability.add_notifier(notifier);
    }

    /// Rebuilds the persistence facade from configuration
    pub fn configure_persistence(
        &mut self,
        config: &PersistenceConfig,
    ) -> Result<(), EnvironmentError> {
        self.persistence = PersistenceServiceFacade::from_config(config)?;
        Ok(())
    }

    /// Attaches an externally built remote key/value backend
    pub fn attach_remote_persistence(&mut self, remote: Arc<dyn KeyValueStore>) {
        self.persistence.attach_remote(remote);
    }

    /// Applies a registered single-exchange strategy's subscriptions to a
    /// named session
    pub fn mount(&mut self, strategy_id: &str, session_name: &str) -> Result<(), EnvironmentError> {
        let strategy = self.strategies.single(strategy_id).ok_or_else(|| {
            EnvironmentError::Config(format!("unknown strategy: {strategy_id}"))
        })?;
        let session = self
            .sessions
            .iter_mut()
            .find(|s| s.name() == session_name)
            .ok_or_else(|| EnvironmentError::Config(format!("unknown session: {session_name}")))?;
        strategy.subscribe(session);
        Ok(())
    }

    /// Applies a registered cross-exchange strategy's subscriptions across
    /// all sessions
    pub fn mount_cross(&mut self, strategy_id: &str) -> Result<(), EnvironmentError> {
        let strategy = self.strategies.cross(strategy_id).ok_or_else(|| {
            EnvironmentError::Config(format!("unknown strategy: {strategy_id}"))
        })?;
        strategy.subscribe(&mut self.sessions);
        Ok(())
    }

    /// Configures notification routing.
    ///
    /// Routing tables and stream handlers are set up here, before
    /// `connect`; they are read-only afterwards.
    pub fn configure_notification(&mut self, config: &NotificationConfig) {
        if !config.symbol_channels.is_empty() {
            self.notifiability
                .symbol_channel_router
                .add_route(&config.symbol_channels);
        }
        if !config.session_channels.is_empty() {
            self.notifiability
                .session_channel_router
                .add_route(&config.session_channels);
        }

        match config.routing.trade {
            RoutingMode::Silent => {}
            RoutingMode::Session => {
                for session in &self.sessions {
                    let channel = self
                        .notifiability
                        .session_channel_router
                        .route(session.name());
                    let notifiability = Arc::clone(&self.notifiability);
                    match channel {
                        Some(channel) => session.stream.on_trade_update(move |trade| {
                            let text = render_trade_report(trade);
                            let event = NotifiableEvent::Trade(trade.clone());
                            notifiability.notify_to(&channel, &text, &event);
                        }),
                        None => session.stream.on_trade_update(move |trade| {
                            let text = render_trade_report(trade);
                            let event = NotifiableEvent::Trade(trade.clone());
                            notifiability.notify(&text, &event);
                        }),
                    }
                }
            }
            RoutingMode::Symbol => {
                let symbols = Arc::clone(&self.notifiability.symbol_channel_router);
                self.notifiability
                    .object_channel_router
                    .add_route(move |event| match event {
                        NotifiableEvent::Trade(trade) => symbols.route(&trade.symbol),
                        _ => None,
                    });

                for session in &self.sessions {
                    let notifiability = Arc::clone(&self.notifiability);
                    session.stream.on_trade_update(move |trade| {
                        let text = render_trade_report(trade);
                        let event = NotifiableEvent::Trade(trade.clone());
                        match notifiability.route_object(&event) {
                            Some(channel) => notifiability.notify_to(&channel, &text, &event),
                            None => notifiability.notify(&text, &event),
                        }
                    });
                }
            }
        }

        match config.routing.order {
            RoutingMode::Silent => {}
            RoutingMode::Session => {
                for session in &self.sessions {
                    let channel = self
                        .notifiability
                        .session_channel_router
                        .route(session.name());
                    let notifiability = Arc::clone(&self.notifiability);
                    match channel {
                        Some(channel) => session.stream.on_order_update(move |order| {
                            let text = render_order_report(order);
                            let event = NotifiableEvent::Order(order.clone());
                            notifiability.notify_to(&channel, &text, &event);
                        }),
                        None => session.stream.on_order_update(move |order| {
                            let text = render_order_report(order);
                            let event = NotifiableEvent::Order(order.clone());
                            notifiability.notify(&text, &event);
                        }),
                    }
                }
            }
            RoutingMode::Symbol => {
                let symbols = Arc::clone(&self.notifiability.symbol_channel_router);
                self.notifiability
                    .object_channel_router
                    .add_route(move |event| match event {
                        NotifiableEvent::Order(order) => symbols.route(&order.symbol),
                        _ => None,
                    });

                for session in &self.sessions {
                    let notifiability = Arc::clone(&self.notifiability);
                    session.stream.on_order_update(move |order| {
                        let text = render_order_report(order);
                        let event = NotifiableEvent::Order(order.clone());
                        match notifiability.route_object(&event) {
                            Some(channel) => notifiability.notify_to(&channel, &text, &event),
                            None => notifiability.notify(&text, &event),
                        }
                    });
                }
            }
        }

        // Submit-order and pnl events are produced by callers, not by
        // streams; only the object route is registered for them.
        if config.routing.submit_order == RoutingMode::Symbol {
            let symbols = Arc::clone(&self.notifiability.symbol_channel_router);
            self.notifiability
                .object_channel_router
                .add_route(move |event| match event {
                    NotifiableEvent::SubmitOrder(order) => symbols.route(&order.symbol),
                    _ => None,
                });
        }

        if config.routing.pnl == RoutingMode::Symbol {
            let symbols = Arc::clone(&self.notifiability.symbol_channel_router);
            self.notifiability
                .object_channel_router
                .add_route(move |event| match event {
                    NotifiableEvent::PnL(report) => symbols.route(&report.symbol),
                    _ => None,
                });
        }
    }

    /// Prepares every session, in insertion order: loads market metadata,
    /// reconciles trades, builds per-symbol stores and indicator sets,
    /// snapshots balances, wires the default handlers and seeds historical
    /// candles.
    pub async fn init(&mut self, cancel: &CancellationToken) -> Result<(), EnvironmentError> {
        let start_time = match self.start_time {
            Some(time) => time,
            None => {
                let now = Utc::now();
                self.start_time = Some(now);
                now
            }
        };

        for session in &mut self.sessions {
            let venue = session.exchange.name().to_string();

            let markets = load_exchange_markets_with_cache(
                cancel,
                session.exchange.as_ref(),
                &self.persistence,
            )
            .await?;
            session.markets = markets;

            // Symbol order is fixed so start prices and indicator seeds are
            // deterministic.
            let mut symbols: Vec<String> = session.loaded_symbols.iter().cloned().collect();
            symbols.sort();

            for symbol in &symbols {
                let mut trades = Vec::new();
                if let Some(sync) = &self.trade_sync {
                    info!(venue = venue.as_str(), symbol = symbol.as_str(), "syncing trades");
                    sync.sync_trades(cancel, &*session.exchange, symbol, self.trade_scan_time)
                        .await?;

                    let fee_currency = session.exchange.platform_fee_currency().to_string();
                    let store = sync.store();
                    trades = if symbol.starts_with(&fee_currency) {
                        store
                            .query_for_trading_fee_currency(&venue, symbol, &fee_currency)
                            .await?
                    } else {
                        store.query(&venue, symbol).await?
                    };
                    info!(symbol = symbol.as_str(), count = trades.len(), "trades loaded");
                }

                session.trades.write().insert(symbol.clone(), trades);
                session
                    .last_prices
                    .write()
                    .insert(symbol.clone(), Decimal::ZERO);

                let store = Arc::new(MarketDataStore::new(symbol.clone()));
                store.bind_stream(&session.stream);
                let indicators = StandardIndicatorSet::new(symbol.clone(), &store);
                session.market_data_stores.insert(symbol.clone(), store);
                session
                    .standard_indicator_sets
                    .insert(symbol.clone(), indicators);
            }

            info!(session = session.name(), "querying account balances");
            let balances =
                cancellable(cancel, session.exchange.query_account_balances()).await?;
            session.account.update_balances(balances);
            session.account.log_balances();
            session.account.bind_stream(&session.stream);

            session.stream.on_balance_update(|balances| {
                info!(currencies = balances.len(), "balance update");
            });

            {
                let last_prices = Arc::clone(&session.last_prices);
                let start_prices = Arc::clone(&session.start_prices);
                session.stream.on_kline_closed(move |kline| {
                    start_prices
                        .write()
                        .entry(kline.symbol.clone())
                        .or_insert(kline.open);
                    last_prices.write().insert(kline.symbol.clone(), kline.close);
                });
            }

            {
                let trades = Arc::clone(&session.trades);
                session.stream.on_trade_update(move |trade| {
                    trades
                        .write()
                        .entry(trade.symbol.clone())
                        .or_default()
                        .push(trade.clone());
                });
            }

            let mut intervals: Vec<Interval> = session
                .subscriptions
                .iter()
                .filter(|s| s.channel == Channel::KLine)
                .filter_map(|s| s.options.interval)
                .collect();
            intervals.sort();
            intervals.dedup();

            for symbol in &symbols {
                let store = session
                    .market_data_stores
                    .get(symbol)
                    .ok_or_else(|| EnvironmentError::SymbolUndefined(symbol.clone()))?;

                let mut last_price_time: Option<DateTime<Utc>> = None;
                for interval in &intervals {
                    // End strictly before the currently-forming candle.
                    let end_time = start_time - interval.duration();
                    let options = KLineQueryOptions {
                        start_time: None,
                        end_time: Some(end_time),
                        limit: KLINE_SEED_LIMIT,
                    };
                    let klines = cancellable(
                        cancel,
                        session.exchange.query_klines(symbol, *interval, &options),
                    )
                    .await?;

                    let Some(last) = klines.last() else {
                        warn!(
                            symbol = symbol.as_str(),
                            interval = %interval,
                            "no historical candles ending before {end_time}"
                        );
                        continue;
                    };

                    if last_price_time.map_or(true, |t| t < last.end_time) {
                        session
                            .last_prices
                            .write()
                            .insert(symbol.clone(), last.close);
                        last_price_time = Some(last.end_time);
                    }

                    // Push through the store so bound indicators warm up.
                    for kline in klines {
                        store.add_kline(kline);
                    }
                }
            }

            if let Some(store) = &self.trade_store {
                let store = Arc::clone(store);
                session.stream.on_trade_update(move |trade| {
                    let store = Arc::clone(&store);
                    let trade = trade.clone();
                    tokio::spawn(async move {
                        if let Err(err) = store.insert(&trade).await {
                            // The in-memory log stays authoritative for the
                            // session; a failed durable insert is not fatal.
                            error!(
                                error = %err,
                                id = trade.id,
                                symbol = trade.symbol.as_str(),
                                "trade insert failed"
                            );
                        }
                    });
                });
            }
        }

        Ok(())
    }

    /// Forwards each session's subscriptions to its stream and opens the
    /// transports, in insertion order.
    ///
    /// The first failure aborts and is returned; sessions connected before
    /// it stay connected, and the caller winds them down by cancelling
    /// `cancel`.
    pub async fn connect(&mut self, cancel: &CancellationToken) -> Result<(), EnvironmentError> {
        for session in &self.sessions {
            if session.subscriptions.is_empty() {
                warn!(
                    session = session.name(),
                    "exchange session has no subscriptions"
                );
            } else {
                for sub in &session.subscriptions {
                    info!(
                        session = session.name(),
                        channel = %sub.channel,
                        symbol = sub.symbol.as_str(),
                        "subscribing"
                    );
                    session
                        .stream
                        .subscribe(sub.channel, sub.symbol.clone(), sub.options.clone());
                }
            }

            info!(session = session.name(), "connecting session");
            session
                .stream
                .connect(cancel)
                .await
                .map_err(EnvironmentError::from)?;
        }

        Ok(())
    }
}

async fn cancellable<T>(
    cancel: &CancellationToken,
    fut: impl Future<Output = Result<T, VenueError>>,
) -> Result<T, EnvironmentError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(EnvironmentError::Cancelled),
        result = fut => result.map_err(EnvironmentError::from),
    }
}
