//! Notification routing
//!
//! Routes typed events to named channels. Three routers compose: a symbol
//! router and a session router (both plain name -> channel maps) and an
//! object router holding predicates over the event variant, first match
//! wins. Routing tables are written during `ConfigureNotification` and are
//! read-only once streams connect.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::info;

use hermes_core::{Order, PnLReport, SubmitOrder, Trade};

/// Event kinds that can be routed to notification channels
#[derive(Debug, Clone)]
pub enum NotifiableEvent {
    Trade(Trade),
    Order(Order),
    SubmitOrder(SubmitOrder),
    PnL(PnLReport),
}

impl NotifiableEvent {
    pub fn symbol(&self) -> &str {
        match self {
            NotifiableEvent::Trade(t) => &t.symbol,
            NotifiableEvent::Order(o) => &o.symbol,
            NotifiableEvent::SubmitOrder(o) => &o.symbol,
            NotifiableEvent::PnL(r) => &r.symbol,
        }
    }
}

/// Notification transport. `channel = None` means the transport's default
/// channel.
pub trait Notifier: Send + Sync {
    fn notify(&self, channel: Option<&str>, text: &str, event: &NotifiableEvent);
}

/// Transport that writes notifications to the log
#[derive(Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, channel: Option<&str>, text: &str, _event: &NotifiableEvent) {
        info!(channel = channel.unwrap_or("default"), "{text}");
    }
}

/// Name -> channel map used for both symbol and session routing
#[derive(Default)]
pub struct ChannelRouter {
    routes: RwLock<HashMap<String, String>>,
}

impl ChannelRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_route(&self, routes: &HashMap<String, String>) {
        self.routes.write().extend(
            routes
                .iter()
                .map(|(name, channel)| (name.clone(), channel.clone())),
        );
    }

    pub fn route(&self, name: &str) -> Option<String> {
        self.routes.read().get(name).cloned()
    }
}

type ObjectRoute = Box<dyn Fn(&NotifiableEvent) -> Option<String> + Send + Sync>;

/// Ordered predicate list over the event variant; first match wins
#[derive(Default)]
pub struct ObjectChannelRouter {
    routes: RwLock<Vec<ObjectRoute>>,
}

impl ObjectChannelRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_route(
        &self,
        route: impl Fn(&NotifiableEvent) -> Option<String> + Send + Sync + 'static,
    ) {
        self.routes.write().push(Box::new(route));
    }

    pub fn route(&self, event: &NotifiableEvent) -> Option<String> {
        self.routes.read().iter().find_map(|route| route(event))
    }
}

/// Channel routing state plus the notifier fan-out
pub struct Notifiability {
    pub symbol_channel_router: Arc<ChannelRouter>,
    pub session_channel_router: Arc<ChannelRouter>,
    pub object_channel_router: ObjectChannelRouter,
    notifiers: RwLock<Vec<Arc<dyn Notifier>>>,
}

impl Default for Notifiability {
    fn default() -> Self {
        Notifiability {
            symbol_channel_router: Arc::new(ChannelRouter::new()),
            session_channel_router: Arc::new(ChannelRouter::new()),
            object_channel_router: ObjectChannelRouter::new(),
            notifiers: RwLock::new(Vec::new()),
        }
    }
}

impl Notifiability {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_notifier(&self, notifier: Arc<dyn Notifier>) {
        self.notifiers.write().push(notifier);
    }

    /// Resolves a channel for an event through the object router
    pub fn route_object(&self, event: &NotifiableEvent) -> Option<String> {
        self.object_channel_router.route(event)
    }

    /// Sends to every notifier's default channel
    pub fn notify(&self, text: &str, event: &NotifiableEvent) {
        for notifier in self.notifiers.read().iter() {
            notifier.notify(None, text, event);
        }
    }

    /// Sends to a named channel on every notifier
    pub fn notify_to(&self, channel: &str, text: &str, event: &NotifiableEvent) {
        for notifier in self.notifiers.read().iter() {
            notifier.notify(Some(channel), text, event);
        }
    }
}

/// How one event kind is routed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoutingMode {
    /// No notification handler is attached
    #[default]
    Silent,
    /// Route by session name, falling back to the default channel
    Session,
    /// Route by event symbol, falling back to the default channel
    Symbol,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingModeParseError(pub String);

impl fmt::Display for RoutingModeParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown routing mode: {}", self.0)
    }
}

impl std::error::Error for RoutingModeParseError {}

impl FromStr for RoutingMode {
    type Err = RoutingModeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "silent" => Ok(RoutingMode::Silent),
            "session" => Ok(RoutingMode::Session),
            "symbol" => Ok(RoutingMode::Symbol),
            other => Err(RoutingModeParseError(other.to_string())),
        }
    }
}

/// Per-event-kind routing selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingConfig {
    pub trade: RoutingMode,
    pub order: RoutingMode,
    pub submit_order: RoutingMode,
    pub pnl: RoutingMode,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Symbol -> channel name
    pub symbol_channels: HashMap<String, String>,
    /// Session name -> channel name
    pub session_channels: HashMap<String, String>,
    pub routing: RoutingConfig,
}

/// Renders the human-readable trade report
pub fn render_trade_report(trade: &Trade) -> String {
    format!(
        "{} {} {} {} @ {} fee {} {}",
        trade.exchange,
        trade.side,
        trade.quantity,
        trade.symbol,
        trade.price,
        trade.fee,
        trade.fee_currency,
    )
}

/// Renders the human-readable order report
pub fn render_order_report(order: &Order) -> String {
    format!(
        "{} {} {} {:?} {} filled {}/{}",
        order.symbol,
        order.side,
        order.price.map(|p| p.to_string()).unwrap_or_else(|| "market".to_string()),
        order.status,
        order.id,
        order.executed_quantity,
        order.quantity,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use hermes_core::Side;
    use rust_decimal_macros::dec;

    fn trade(symbol: &str) -> Trade {
        Trade {
            id: 9,
            exchange: "bin".to_string(),
            symbol: symbol.to_string(),
            side: Side::Buy,
            is_buyer: true,
            is_maker: false,
            price: dec!(50000),
            quantity: dec!(0.2),
            fee: dec!(0.001),
            fee_currency: "BNB".to_string(),
            time: Utc::now(),
        }
    }

    #[test]
    fn channel_router_reports_missing_keys() {
        let router = ChannelRouter::new();
        router.add_route(&HashMap::from([(
            "BTCUSDT".to_string(),
            "#btc".to_string(),
        )]));

        assert_eq!(router.route("BTCUSDT"), Some("#btc".to_string()));
        assert_eq!(router.route("ETHUSDT"), None);
    }

    #[test]
    fn channel_router_is_idempotent_under_reapply() {
        let router = ChannelRouter::new();
        let routes = HashMap::from([("BTCUSDT".to_string(), "#btc".to_string())]);
        router.add_route(&routes);
        router.add_route(&routes);

        assert_eq!(router.route("BTCUSDT"), Some("#btc".to_string()));
    }

    #[test]
    fn object_router_first_match_wins() {
        let router = ObjectChannelRouter::new();
        router.add_route(|event| match event {
            NotifiableEvent::Trade(_) => Some("#trades".to_string()),
            _ => None,
        });
        router.add_route(|_| Some("#catch-all".to_string()));

        assert_eq!(
            router.route(&NotifiableEvent::Trade(trade("BTCUSDT"))),
            Some("#trades".to_string())
        );
        assert_eq!(
            router.route(&NotifiableEvent::SubmitOrder(SubmitOrder {
                symbol: "BTCUSDT".to_string(),
                side: Side::Sell,
                order_type: hermes_core::OrderType::Market,
                quantity: dec!(1),
                price: None,
            })),
            Some("#catch-all".to_string())
        );
    }

    #[test]
    fn routing_mode_parses_known_values_only() {
        assert_eq!("silent".parse::<RoutingMode>().unwrap(), RoutingMode::Silent);
        assert_eq!(
            "session".parse::<RoutingMode>().unwrap(),
            RoutingMode::Session
        );
        assert_eq!("symbol".parse::<RoutingMode>().unwrap(), RoutingMode::Symbol);
        assert!("shout".parse::<RoutingMode>().is_err());
    }

    #[test]
    fn trade_report_mentions_the_essentials() {
        let text = render_trade_report(&trade("BTCUSDT"));
        assert!(text.contains("BTCUSDT"));
        assert!(text.contains("BUY"));
        assert!(text.contains("50000"));
    }
}
