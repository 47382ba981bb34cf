//! Resilient WebSocket client for the rentdesk admin real-time channel.
//!
//! One [`Connection`] multiplexes the `bookings`, `orders` and `quotes`
//! event streams over a single socket, reconnects with linear backoff, and
//! fans each domain event out to its module's handlers and an optional
//! observer.

pub mod adapters;
pub mod config;
pub mod connection;
mod driver;
pub mod error;
mod pumps;
pub mod reconnection;
pub mod router;
pub mod subscription;
pub mod types;
mod ws_client;

pub use adapters::{BookingsAdapter, ModuleAdapter, OrdersAdapter, QuotesAdapter};
pub use config::RealtimeConfig;
pub use connection::Connection;
pub use error::RealtimeError;
pub use reconnection::{CloseOutcome, ReconnectPolicy};
pub use router::{HandlerId, MessageRouter, Routed};
pub use subscription::SubscriptionRegistry;
pub use types::{ClientIdentity, CloseInfo, ConnectionHooks, ConnectionState};
