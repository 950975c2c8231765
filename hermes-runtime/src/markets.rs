//! Market metadata cache
//!
//! Symbol metadata rarely changes within a process lifetime, so Init reads
//! it through the persistence facade's memory backend before hitting the
//! venue. An empty metadata map is never cached and never accepted.

use tokio_util::sync::CancellationToken;
use tracing::debug;

use hermes_core::{Exchange, MarketMap};
use hermes_services::{KeyValueStoreExt, PersistenceServiceFacade};

use crate::errors::EnvironmentError;

/// Loads a venue's market metadata, consulting the cache first.
///
/// Cache key is `"{venue}-markets"` on the memory backend.
pub async fn load_exchange_markets_with_cache(
    cancel: &CancellationToken,
    exchange: &dyn Exchange,
    persistence: &PersistenceServiceFacade,
) -> Result<MarketMap, EnvironmentError> {
    let key = format!("{}-markets", exchange.name());
    let cache = persistence.memory();

    if let Some(markets) = cache.get::<MarketMap>(&key)? {
        if !markets.is_empty() {
            debug!(venue = exchange.name(), "market metadata served from cache");
            return Ok(markets);
        }
    }

    let markets = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(EnvironmentError::Cancelled),
        markets = exchange.query_markets() => markets?,
    };

    if markets.is_empty() {
        return Err(EnvironmentError::MetadataEmpty(exchange.name().to_string()));
    }

    cache.set(&key, &markets)?;
    Ok(markets)
}
