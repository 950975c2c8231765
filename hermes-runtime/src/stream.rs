//! Stream event fabric
//!
//! One `Stream` per exchange session. Handlers register per event kind and
//! are invoked in registration order; events for one stream are dispatched
//! serially, so a handler always sees the previous event fully handled.
//!
//! Registration is expected to happen before `connect`; events queue in the
//! transport channel until the dispatch task starts, so nothing is lost
//! between registration and the first inbound message.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use hermes_core::{
    BalanceMap, Channel, KLine, Order, OrderBook, StreamEvent, StreamSetup, StreamTransport,
    SubscribeOptions, Subscription, Trade, VenueError,
};

/// Channel capacity between a transport task and the dispatcher
const EVENT_CHANNEL_CAPACITY: usize = 1024;

type BalanceHandler = Box<dyn Fn(&BalanceMap) + Send + Sync>;
type KLineHandler = Box<dyn Fn(&KLine) + Send + Sync>;
type TradeHandler = Box<dyn Fn(&Trade) + Send + Sync>;
type OrderHandler = Box<dyn Fn(&Order) + Send + Sync>;
type BookHandler = Box<dyn Fn(&OrderBook) + Send + Sync>;

#[derive(Default)]
struct StreamEventBus {
    balance_update: RwLock<Vec<BalanceHandler>>,
    kline_closed: RwLock<Vec<KLineHandler>>,
    trade_update: RwLock<Vec<TradeHandler>>,
    order_update: RwLock<Vec<OrderHandler>>,
    book_snapshot: RwLock<Vec<BookHandler>>,
    book_update: RwLock<Vec<BookHandler>>,
}

impl StreamEventBus {
    fn dispatch(&self, event: &StreamEvent) {
        match event {
            StreamEvent::BalanceUpdate(balances) => {
                for handler in self.balance_update.read().iter() {
                    handler(balances);
                }
            }
            StreamEvent::KLineClosed(kline) => {
                for handler in self.kline_closed.read().iter() {
                    handler(kline);
                }
            }
            StreamEvent::TradeUpdate(trade) => {
                for handler in self.trade_update.read().iter() {
                    handler(trade);
                }
            }
            StreamEvent::OrderUpdate(order) => {
                for handler in self.order_update.read().iter() {
                    handler(order);
                }
            }
            StreamEvent::BookSnapshot(book) => {
                for handler in self.book_snapshot.read().iter() {
                    handler(book);
                }
            }
            StreamEvent::BookUpdate(book) => {
                for handler in self.book_update.read().iter() {
                    handler(book);
                }
            }
        }
    }
}

/// Event fabric for one exchange session
pub struct Stream {
    transport: Arc<dyn StreamTransport>,
    bus: Arc<StreamEventBus>,
    subscriptions: Mutex<Vec<Subscription>>,
    public_only: AtomicBool,
}

impl Stream {
    pub fn new(transport: Arc<dyn StreamTransport>) -> Self {
        Stream {
            transport,
            bus: Arc::new(StreamEventBus::default()),
            subscriptions: Mutex::new(Vec::new()),
            public_only: AtomicBool::new(false),
        }
    }

    /// Records a subscription; no network effect until `connect`
    pub fn subscribe(&self, channel: Channel, symbol: impl Into<String>, options: SubscribeOptions) {
        self.subscriptions.lock().push(Subscription {
            channel,
            symbol: symbol.into(),
            options,
        });
    }

    /// Restricts the stream to public channels
    pub fn set_public_only(&self) {
        self.public_only.store(true, Ordering::Relaxed);
    }

    pub fn on_balance_update(&self, handler: impl Fn(&BalanceMap) + Send + Sync + 'static) {
        self.bus.balance_update.write().push(Box::new(handler));
    }

    pub fn on_kline_closed(&self, handler: impl Fn(&KLine) + Send + Sync + 'static) {
        self.bus.kline_closed.write().push(Box::new(handler));
    }

    pub fn on_trade_update(&self, handler: impl Fn(&Trade) + Send + Sync + 'static) {
        self.bus.trade_update.write().push(Box::new(handler));
    }

    pub fn on_order_update(&self, handler: impl Fn(&Order) + Send + Sync + 'static) {
        self.bus.order_update.write().push(Box::new(handler));
    }

    pub fn on_book_snapshot(&self, handler: impl Fn(&OrderBook) + Send + Sync + 'static) {
        self.bus.book_snapshot.write().push(Box::new(handler));
    }

    pub fn on_book_update(&self, handler: impl Fn(&OrderBook) + Send + Sync + 'static) {
        self.bus.book_update.write().push(Box::new(handler));
    }

    /// Dispatches one event synchronously through all registered handlers.
    ///
    /// In-process feeds and tests use this to bypass the transport.
    pub fn emit(&self, event: &StreamEvent) {
        self.bus.dispatch(event);
    }

    /// Opens the transport and starts the dispatch task.
    ///
    /// All handlers registered before this call see every event the venue
    /// delivers after the transport is up.
    pub async fn connect(&self, cancel: &CancellationToken) -> Result<(), VenueError> {
        let setup = StreamSetup {
            subscriptions: self.subscriptions.lock().clone(),
            public_only: self.public_only.load(Ordering::Relaxed),
        };

        let (tx, mut rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        self.transport.connect(setup, tx, cancel.clone()).await?;

        let bus = Arc::clone(&self.bus);
        let cancel = cancel.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    event = rx.recv() => match event {
                        Some(event) => bus.dispatch(&event),
                        None => break,
                    },
                }
            }
        });

        Ok(())
    }

    pub fn subscriptions(&self) -> Vec<Subscription> {
        self.subscriptions.lock().clone()
    }
}
