//! Trade sync service
//!
//! Reconciles the local trade store with venue trade history from a cutoff
//! time forward. Each insert is durable on its own, so a failed run leaves
//! partial progress behind and the next run resumes from the last recorded
//! trade.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::info;

use hermes_core::{TradeHistorySource, TradeQueryOptions, VenueError};

use crate::trade_store::{StoreError, TradeStore};

/// Venue page size per history request
const TRADE_PAGE_LIMIT: usize = 500;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error(transparent)]
    Venue(#[from] VenueError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("trade sync cancelled")]
    Cancelled,
}

pub struct TradeSyncService {
    store: Arc<dyn TradeStore>,
}

impl TradeSyncService {
    pub fn new(store: Arc<dyn TradeStore>) -> Self {
        TradeSyncService { store }
    }

    pub fn store(&self) -> &Arc<dyn TradeStore> {
        &self.store
    }

    /// Pull venue trade history for `symbol` into the store, starting at
    /// `since` or at the last locally recorded trade, whichever is later.
    ///
    /// Pages are requested in venue order with a from-id cursor once the
    /// first page has been seen. Re-inserting an already stored trade is a
    /// no-op because the store dedups on `(venue, id)`.
    pub async fn sync_trades<S>(
        &self,
        cancel: &CancellationToken,
        venue: &S,
        symbol: &str,
        since: DateTime<Utc>,
    ) -> Result<(), SyncError>
    where
        S: TradeHistorySource + ?Sized,
    {
        let last = self.store.query_last(venue.name(), symbol).await?;

        let mut options = TradeQueryOptions {
            start_time: Some(match &last {
                Some(t) => t.time.max(since),
                None => since,
            }),
            from_id: None,
            limit: TRADE_PAGE_LIMIT,
        };

        let mut inserted = 0usize;
        loop {
            if cancel.is_cancelled() {
                return Err(SyncError::Cancelled);
            }

            let page = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(SyncError::Cancelled),
                page = venue.query_trades(symbol, &options) => page?,
            };

            let Some(cursor) = page.last().cloned() else {
                break;
            };

            for trade in &page {
                self.store.insert(trade).await?;
            }
            inserted += page.len();

            if page.len() < TRADE_PAGE_LIMIT {
                break;
            }
            options.from_id = Some(cursor.id);
            options.start_time = Some(cursor.time);
        }

        info!(
            venue = venue.name(),
            symbol, inserted, "trade history synced"
        );
        Ok(())
    }
}
