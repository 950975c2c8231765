//! Trade store interface and in-memory reference implementation

use std::collections::HashSet;

use async_trait::async_trait;
use parking_lot::Mutex;
use thiserror::Error;

use hermes_core::Trade;

#[derive(Error, Debug, Clone)]
pub enum StoreError {
    #[error("trade store query failed: {0}")]
    Query(String),

    #[error("trade store write failed: {0}")]
    Write(String),
}

/// Durable store of historical trades.
///
/// Implementations enforce the `(venue, id)` dedup key at write time, so
/// at-least-once insertion is safe for callers.
#[async_trait]
pub trait TradeStore: Send + Sync {
    async fn insert(&self, trade: &Trade) -> Result<(), StoreError>;

    /// All trades for one venue and symbol, in venue order
    async fn query(&self, exchange: &str, symbol: &str) -> Result<Vec<Trade>, StoreError>;

    /// Variant used when the symbol trades against the venue's platform fee
    /// currency; fee folding is a storage concern and stays behind this
    /// interface.
    async fn query_for_trading_fee_currency(
        &self,
        exchange: &str,
        symbol: &str,
        fee_currency: &str,
    ) -> Result<Vec<Trade>, StoreError>;

    /// Most recently recorded trade for one venue and symbol
    async fn query_last(&self, exchange: &str, symbol: &str)
        -> Result<Option<Trade>, StoreError>;
}

#[derive(Default)]
struct MemoryRows {
    rows: Vec<Trade>,
    seen: HashSet<(String, u64)>,
}

/// In-memory trade store, the reference implementation and test double.
///
/// Rows are kept in insertion order, which equals venue order because the
/// sync service inserts pages in venue order. A SQL-backed store would fold
/// fees expressed in the quote currency inside the fee-currency query; the
/// memory store returns the same rows for both variants.
#[derive(Default)]
pub struct MemoryTradeStore {
    inner: Mutex<MemoryRows>,
}

impl MemoryTradeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().rows.is_empty()
    }

    fn select(&self, exchange: &str, symbol: &str) -> Vec<Trade> {
        self.inner
            .lock()
            .rows
            .iter()
            .filter(|t| t.exchange == exchange && t.symbol == symbol)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl TradeStore for MemoryTradeStore {
    async fn insert(&self, trade: &Trade) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        if inner.seen.insert((trade.exchange.clone(), trade.id)) {
            inner.rows.push(trade.clone());
        }
        Ok(())
    }

    async fn query(&self, exchange: &str, symbol: &str) -> Result<Vec<Trade>, StoreError> {
        Ok(self.select(exchange, symbol))
    }

    async fn query_for_trading_fee_currency(
        &self,
        exchange: &str,
        symbol: &str,
        _fee_currency: &str,
    ) -> Result<Vec<Trade>, StoreError> {
        Ok(self.select(exchange, symbol))
    }

    async fn query_last(
        &self,
        exchange: &str,
        symbol: &str,
    ) -> Result<Option<Trade>, StoreError> {
        Ok(self
            .select(exchange, symbol)
            .into_iter()
            .max_by_key(|t| (t.time, t.id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use hermes_core::Side;
    use rust_decimal_macros::dec;

    fn trade(exchange: &str, id: u64, minute: u32) -> Trade {
        Trade {
            id,
            exchange: exchange.to_string(),
            symbol: "BTCUSDT".to_string(),
            side: Side::Buy,
            is_buyer: true,
            is_maker: false,
            price: dec!(50000),
            quantity: dec!(0.1),
            fee: dec!(0.01),
            fee_currency: "BNB".to_string(),
            time: Utc.with_ymd_and_hms(2024, 1, 1, 0, minute, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn deduplicates_on_venue_and_id() {
        let store = MemoryTradeStore::new();
        store.insert(&trade("bin", 1, 0)).await.unwrap();
        store.insert(&trade("bin", 1, 0)).await.unwrap();
        store.insert(&trade("max", 1, 0)).await.unwrap();

        assert_eq!(store.len(), 2);
        let rows = store.query("bin", "BTCUSDT").await.unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn preserves_insertion_order() {
        let store = MemoryTradeStore::new();
        for id in [3u64, 1, 2] {
            store.insert(&trade("bin", id, id as u32)).await.unwrap();
        }
        let ids: Vec<u64> = store
            .query("bin", "BTCUSDT")
            .await
            .unwrap()
            .iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[tokio::test]
    async fn query_last_returns_latest_by_time() {
        let store = MemoryTradeStore::new();
        assert!(store.query_last("bin", "BTCUSDT").await.unwrap().is_none());

        store.insert(&trade("bin", 1, 5)).await.unwrap();
        store.insert(&trade("bin", 2, 3)).await.unwrap();

        let last = store.query_last("bin", "BTCUSDT").await.unwrap().unwrap();
        assert_eq!(last.id, 1);
    }
}
