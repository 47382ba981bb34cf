use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How often the client sends an application-level `ping` frame.
pub const WS_PING_PERIOD: Duration = Duration::from_secs(30);

/// Maximum inbound frame size in bytes (1 MB). Larger frames are dropped.
pub const WS_MAX_MESSAGE_SIZE: usize = 1024 * 1024;

/// Normal closure. Terminal: never retried.
pub const WS_CLOSE_NORMAL: u16 = 1000;

/// Endpoint going away (server restart, page unload). Terminal: never retried.
pub const WS_CLOSE_GOING_AWAY: u16 = 1001;

/// Close frame without a status code.
pub const WS_CLOSE_NO_STATUS: u16 = 1005;

/// Connection dropped without a close frame. Used locally for read errors,
/// failed opens and pong watchdog expiry.
pub const WS_CLOSE_ABNORMAL: u16 = 1006;

/// Returns `true` if a close with this code must not trigger a reconnect.
pub fn is_terminal_close(code: u16) -> bool {
    code == WS_CLOSE_NORMAL || code == WS_CLOSE_GOING_AWAY
}

/// Client type announced in the `identify` frame.
pub const CLIENT_TYPE_ADMIN: &str = "admin";

/// A topic of domain events that can be subscribed to independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Module {
    Bookings,
    Orders,
    Quotes,
}

impl Module {
    /// Every module, in table order.
    pub const ALL: [Module; 3] = [Module::Bookings, Module::Orders, Module::Quotes];

    /// Wire name of the module.
    pub fn as_str(self) -> &'static str {
        match self {
            Module::Bookings => "bookings",
            Module::Orders => "orders",
            Module::Quotes => "quotes",
        }
    }

    /// Position in [`Module::ALL`]; used to index per-module tables.
    pub fn index(self) -> usize {
        match self {
            Module::Bookings => 0,
            Module::Orders => 1,
            Module::Quotes => 2,
        }
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string does not name a known module.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown module: {0}")]
pub struct UnknownModule(pub String);

impl FromStr for Module {
    type Err = UnknownModule;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Module::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| UnknownModule(s.to_string()))
    }
}

/// WebSocket message type identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    // Outbound (client to server)
    Identify,
    Subscribe,
    Unsubscribe,
    Ping,

    // Protocol control (server to client)
    ConnectionEstablished,
    SubscriptionConfirmed,
    IdentificationConfirmed,
    Pong,
    Error,
    ServerShutdown,

    // Bookings
    NewBooking,
    BookingStatusUpdate,
    BookingDeleted,

    // Orders
    NewOrder,
    OrderStatusUpdated,
    OrderUpdated,
    OrderDeleted,

    // Quotes
    NewQuote,
    QuoteStatusUpdated,
    QuoteDeleted,
    QuoteResponseCreated,

    /// Forward compatibility: any type this client does not know.
    Unknown,
}

impl MessageType {
    /// Every known type (excludes [`MessageType::Unknown`]).
    pub const KNOWN: [MessageType; 21] = [
        MessageType::Identify,
        MessageType::Subscribe,
        MessageType::Unsubscribe,
        MessageType::Ping,
        MessageType::ConnectionEstablished,
        MessageType::SubscriptionConfirmed,
        MessageType::IdentificationConfirmed,
        MessageType::Pong,
        MessageType::Error,
        MessageType::ServerShutdown,
        MessageType::NewBooking,
        MessageType::BookingStatusUpdate,
        MessageType::BookingDeleted,
        MessageType::NewOrder,
        MessageType::OrderStatusUpdated,
        MessageType::OrderUpdated,
        MessageType::OrderDeleted,
        MessageType::NewQuote,
        MessageType::QuoteStatusUpdated,
        MessageType::QuoteDeleted,
        MessageType::QuoteResponseCreated,
    ];

    /// Wire name of the type.
    pub fn as_str(self) -> &'static str {
        match self {
            MessageType::Identify => "identify",
            MessageType::Subscribe => "subscribe",
            MessageType::Unsubscribe => "unsubscribe",
            MessageType::Ping => "ping",
            MessageType::ConnectionEstablished => "connection_established",
            MessageType::SubscriptionConfirmed => "subscription_confirmed",
            MessageType::IdentificationConfirmed => "identification_confirmed",
            MessageType::Pong => "pong",
            MessageType::Error => "error",
            MessageType::ServerShutdown => "server_shutdown",
            MessageType::NewBooking => "new_booking",
            MessageType::BookingStatusUpdate => "booking_status_update",
            MessageType::BookingDeleted => "booking_deleted",
            MessageType::NewOrder => "new_order",
            MessageType::OrderStatusUpdated => "order_status_updated",
            MessageType::OrderUpdated => "order_updated",
            MessageType::OrderDeleted => "order_deleted",
            MessageType::NewQuote => "new_quote",
            MessageType::QuoteStatusUpdated => "quote_status_updated",
            MessageType::QuoteDeleted => "quote_deleted",
            MessageType::QuoteResponseCreated => "quote_response_created",
            MessageType::Unknown => "unknown",
        }
    }

    /// Parses a wire type name. Unrecognized names map to [`MessageType::Unknown`].
    pub fn from_wire(s: &str) -> Self {
        MessageType::KNOWN
            .into_iter()
            .find(|t| t.as_str() == s)
            .unwrap_or(MessageType::Unknown)
    }

    /// The module a domain event type belongs to, or `None` for protocol
    /// and unknown types.
    pub fn module(self) -> Option<Module> {
        match self {
            MessageType::NewBooking
            | MessageType::BookingStatusUpdate
            | MessageType::BookingDeleted => Some(Module::Bookings),
            MessageType::NewOrder
            | MessageType::OrderStatusUpdated
            | MessageType::OrderUpdated
            | MessageType::OrderDeleted => Some(Module::Orders),
            MessageType::NewQuote
            | MessageType::QuoteStatusUpdated
            | MessageType::QuoteDeleted
            | MessageType::QuoteResponseCreated => Some(Module::Quotes),
            _ => None,
        }
    }

    /// Server-to-client protocol control frames, handled by the connection
    /// itself and never forwarded to module consumers.
    pub fn is_control(self) -> bool {
        matches!(
            self,
            MessageType::ConnectionEstablished
                | MessageType::SubscriptionConfirmed
                | MessageType::IdentificationConfirmed
                | MessageType::Pong
                | MessageType::Error
                | MessageType::ServerShutdown
        )
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
