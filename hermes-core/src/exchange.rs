//! Venue adapter capability traits
//!
//! Concrete venue adapters (websocket/REST clients) live outside this
//! workspace; the runtime consumes them through these traits.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::entities::{
    BalanceMap, Interval, KLine, KLineQueryOptions, MarketMap, Subscription, Trade,
    TradeQueryOptions,
};
use crate::events::StreamEvent;

/// Failure of an outbound venue call
#[derive(Error, Debug, Clone)]
pub enum VenueError {
    #[error("network error: {0}")]
    Network(String),

    #[error("api error {code}: {message}")]
    Api { code: i32, message: String },

    #[error("malformed venue response: {0}")]
    Parse(String),

    #[error("operation cancelled")]
    Cancelled,
}

/// Trade history capability of a venue.
///
/// The trade sync service depends on this narrow surface only, not on the
/// full adapter.
#[async_trait]
pub trait TradeHistorySource: Send + Sync {
    /// Venue name, unique within one Environment
    fn name(&self) -> &str;

    /// Currency the venue charges platform fees in (e.g. "BNB")
    fn platform_fee_currency(&self) -> &str;

    /// Page of account trade history for one symbol, in venue order
    async fn query_trades(
        &self,
        symbol: &str,
        options: &TradeQueryOptions,
    ) -> Result<Vec<Trade>, VenueError>;
}

/// Full venue adapter capability set consumed by the runtime
#[async_trait]
pub trait Exchange: TradeHistorySource {
    async fn query_markets(&self) -> Result<MarketMap, VenueError>;

    async fn query_account_balances(&self) -> Result<BalanceMap, VenueError>;

    /// Historical candles for one symbol and interval, oldest first
    async fn query_klines(
        &self,
        symbol: &str,
        interval: Interval,
        options: &KLineQueryOptions,
    ) -> Result<Vec<KLine>, VenueError>;

    /// Fresh transport for one stream connection
    fn new_stream(&self) -> std::sync::Arc<dyn StreamTransport>;
}

/// Everything a transport needs to open a connection
#[derive(Debug, Clone)]
pub struct StreamSetup {
    pub subscriptions: Vec<Subscription>,
    /// Restrict to public channels; no account or trade streams
    pub public_only: bool,
}

/// Venue-side half of a stream.
///
/// `connect` opens the venue connection, spawns whatever background tasks
/// decode inbound messages, and emits one `StreamEvent` per message into
/// `events`, in venue order. It returns once the connection is established;
/// a failure to establish it is a connect error. The transport must stop
/// and drop the sender when `cancel` fires.
#[async_trait]
pub trait StreamTransport: Send + Sync {
    async fn connect(
        &self,
        setup: StreamSetup,
        events: mpsc::Sender<StreamEvent>,
        cancel: CancellationToken,
    ) -> Result<(), VenueError>;
}
