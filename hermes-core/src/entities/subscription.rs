use std::fmt;

use serde::{Deserialize, Serialize};

use super::Interval;

/// Venue stream topic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    KLine,
    Book,
    Trade,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::KLine => write!(f, "kline"),
            Channel::Book => write!(f, "book"),
            Channel::Trade => write!(f, "trade"),
        }
    }
}

/// Per-channel subscription options
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubscribeOptions {
    /// Candle interval, required for the kline channel
    pub interval: Option<Interval>,
    /// Book depth hint, venue-specific
    pub depth: Option<String>,
}

impl SubscribeOptions {
    pub fn with_interval(interval: Interval) -> Self {
        SubscribeOptions {
            interval: Some(interval),
            depth: None,
        }
    }
}

/// Declared intent to receive one channel of events for one symbol.
///
/// Recording a subscription has no network effect until the stream connects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub channel: Channel,
    pub symbol: String,
    pub options: SubscribeOptions,
}
