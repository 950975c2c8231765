use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Immutable per-venue metadata for one symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Market {
    pub symbol: String,
    /// Price increment
    pub tick_size: Decimal,
    /// Quantity increment
    pub step_size: Decimal,
    pub min_notional: Decimal,
    pub base_currency: String,
    pub quote_currency: String,
}

/// Symbol -> market metadata, one snapshot per venue
pub type MarketMap = HashMap<String, Market>;
