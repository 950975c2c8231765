//! Stream events
//!
//! The unified event enum carried from a venue transport task to the
//! session's dispatcher. One value per inbound message, in venue order.

use serde::{Deserialize, Serialize};

use crate::entities::{BalanceMap, KLine, Order, OrderBook, Trade};

/// Any event a venue stream can deliver
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StreamEvent {
    BalanceUpdate(BalanceMap),
    KLineClosed(KLine),
    TradeUpdate(Trade),
    OrderUpdate(Order),
    BookSnapshot(OrderBook),
    BookUpdate(OrderBook),
}

impl StreamEvent {
    /// Symbol the event relates to, if it is symbol-scoped
    pub fn symbol(&self) -> Option<&str> {
        match self {
            StreamEvent::BalanceUpdate(_) => None,
            StreamEvent::KLineClosed(k) => Some(&k.symbol),
            StreamEvent::TradeUpdate(t) => Some(&t.symbol),
            StreamEvent::OrderUpdate(o) => Some(&o.symbol),
            StreamEvent::BookSnapshot(b) => Some(&b.symbol),
            StreamEvent::BookUpdate(b) => Some(&b.symbol),
        }
    }
}
