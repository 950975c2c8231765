//! Standard indicator set
//!
//! The per-symbol indicators every strategy can rely on being warm:
//! moving averages and close-to-close volatility over the standard
//! windows, per interval. Values update incrementally as the bound market
//! data store delivers closed candles, so an indicator's value at any time
//! is a pure function of the candles delivered so far.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use rust_decimal::Decimal;

use hermes_core::stats::{Ewma, RollingVariance, Sma};
use hermes_core::Interval;

use crate::market_data::MarketDataStore;

/// Windows maintained for every interval the store receives
pub const STANDARD_WINDOWS: [usize; 3] = [7, 25, 99];

struct IndicatorCell {
    sma: Sma,
    ewma: Ewma,
    volatility: RollingVariance,
}

impl IndicatorCell {
    fn new(window: usize) -> Self {
        IndicatorCell {
            sma: Sma::new(window),
            ewma: Ewma::from_period(window),
            volatility: RollingVariance::new(window),
        }
    }

    fn push(&mut self, close: Decimal) {
        self.sma.push(close);
        self.ewma.push(close);
        self.volatility.push(close);
    }
}

/// Standard indicators for one symbol, attached to a market data store
pub struct StandardIndicatorSet {
    symbol: String,
    cells: Arc<RwLock<HashMap<(Interval, usize), IndicatorCell>>>,
}

impl StandardIndicatorSet {
    /// Builds the set and subscribes it to the store's updates.
    ///
    /// Cells appear lazily per interval the moment the first closed candle
    /// of that interval arrives.
    pub fn new(symbol: impl Into<String>, store: &Arc<MarketDataStore>) -> Self {
        let cells: Arc<RwLock<HashMap<(Interval, usize), IndicatorCell>>> =
            Arc::new(RwLock::new(HashMap::new()));

        let state = Arc::clone(&cells);
        store.on_update(move |kline| {
            if !kline.closed {
                return;
            }
            let mut cells = state.write();
            for window in STANDARD_WINDOWS {
                cells
                    .entry((kline.interval, window))
                    .or_insert_with(|| IndicatorCell::new(window))
                    .push(kline.close);
            }
        });

        StandardIndicatorSet {
            symbol: symbol.into(),
            cells,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Simple moving average of closes; `None` until the window is full
    pub fn sma(&self, interval: Interval, window: usize) -> Option<Decimal> {
        self.cells
            .read()
            .get(&(interval, window))
            .and_then(|c| c.sma.value())
    }

    /// Exponentially weighted moving average of closes
    pub fn ewma(&self, interval: Interval, window: usize) -> Option<Decimal> {
        self.cells
            .read()
            .get(&(interval, window))
            .and_then(|c| c.ewma.value())
    }

    /// Sample standard deviation of closes over the window
    pub fn volatility(&self, interval: Interval, window: usize) -> Option<Decimal> {
        self.cells
            .read()
            .get(&(interval, window))
            .and_then(|c| c.volatility.std_dev())
    }
}
