use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Side;

/// A single execution reported by a venue.
///
/// Immutable once observed. `id` is unique per venue, so `(exchange, id)` is
/// the durable dedup key used by trade stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    /// Venue-assigned trade identifier
    pub id: u64,
    /// Name of the venue that produced this trade
    pub exchange: String,
    pub symbol: String,
    pub side: Side,
    pub is_buyer: bool,
    pub is_maker: bool,
    pub price: Decimal,
    pub quantity: Decimal,
    pub fee: Decimal,
    pub fee_currency: String,
    /// Venue timestamp of the execution
    pub time: DateTime<Utc>,
}

impl Trade {
    /// Returns the notional value of the trade (price * quantity)
    pub fn notional(&self) -> Decimal {
        self.price * self.quantity
    }
}

/// Cursor options for paging through venue trade history.
///
/// `from_id` takes precedence over `start_time` on venues that support id
/// cursors; trades returned must have `id > from_id`.
#[derive(Debug, Clone, Default)]
pub struct TradeQueryOptions {
    pub start_time: Option<DateTime<Utc>>,
    pub from_id: Option<u64>,
    pub limit: usize,
}
