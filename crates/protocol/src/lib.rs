//! Wire protocol types for the rentdesk admin real-time channel.

pub mod constants;
pub mod envelope;
pub mod events;
pub mod messages;
pub mod types;

// Re-export primary types for convenience.
pub use constants::{MessageType, Module};
pub use envelope::InboundEnvelope;
pub use events::{BookingEvent, ModuleEvent, OrderEvent, QuoteEvent};
pub use messages::ClientFrame;
pub use types::{Booking, Customer, CustomerRef, Order, Quote};
