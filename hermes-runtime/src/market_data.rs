//! Per-symbol market data store

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use hermes_core::{Interval, KLine};

use crate::stream::Stream;

/// Window kept per interval once trimming kicks in
const KLINE_RETENTION: usize = 1000;
/// Window length that triggers a trim back to the retention bound
const KLINE_HIGH_WATER: usize = 1500;

type UpdateHandler = Box<dyn Fn(&KLine) + Send + Sync>;

/// Recent candles for one symbol, indexed by interval.
///
/// Appending a candle fans it out to every bound subscriber in
/// registration order. Within one interval, candles are delivered in
/// non-decreasing end-time order; cross-interval ordering is not
/// guaranteed.
pub struct MarketDataStore {
    symbol: String,
    klines: RwLock<HashMap<Interval, Vec<KLine>>>,
    update_handlers: RwLock<Vec<UpdateHandler>>,
}

impl MarketDataStore {
    pub fn new(symbol: impl Into<String>) -> Self {
        MarketDataStore {
            symbol: symbol.into(),
            klines: RwLock::new(HashMap::new()),
            update_handlers: RwLock::new(Vec::new()),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Appends a candle and notifies subscribers.
    ///
    /// The per-interval window is trimmed back to the retention bound once
    /// it exceeds the high-water mark; indicators need at least the
    /// retained tail.
    pub fn add_kline(&self, kline: KLine) {
        {
            let mut klines = self.klines.write();
            let window = klines.entry(kline.interval).or_default();
            window.push(kline.clone());
            if window.len() > KLINE_HIGH_WATER {
                let excess = window.len() - KLINE_RETENTION;
                window.drain(..excess);
            }
        }

        for handler in self.update_handlers.read().iter() {
            handler(&kline);
        }
    }

    /// Copy of the current window for one interval
    pub fn klines(&self, interval: Interval) -> Option<Vec<KLine>> {
        self.klines.read().get(&interval).cloned()
    }

    pub fn num_klines(&self, interval: Interval) -> usize {
        self.klines.read().get(&interval).map_or(0, |w| w.len())
    }

    /// Registers an update handler; called once per appended candle
    pub fn on_update(&self, handler: impl Fn(&KLine) + Send + Sync + 'static) {
        self.update_handlers.write().push(Box::new(handler));
    }

    /// Feeds this store from the stream's candle-closed events, filtered to
    /// this store's symbol
    pub fn bind_stream(self: &Arc<Self>, stream: &Stream) {
        let store = Arc::clone(self);
        stream.on_kline_closed(move |kline| {
            if kline.symbol == store.symbol {
                store.add_kline(kline.clone());
            }
        });
    }
}
