//! Typed per-module views of domain event envelopes.

use crate::constants::{MessageType, Module};
use crate::envelope::InboundEnvelope;
use crate::types::{Booking, Order, Quote};

/// A module's typed event set, decoded from a routed envelope.
pub trait ModuleEvent: Sized + Send + 'static {
    /// The module whose events this type represents.
    const MODULE: Module;

    /// Decodes an envelope. Returns `None` only if the type does not belong
    /// to this module; a `data` payload that is not a record yields an empty
    /// one so the event is still delivered.
    fn from_envelope(envelope: &InboundEnvelope) -> Option<Self>;
}

/// Events of the `bookings` module.
#[derive(Debug, Clone, PartialEq)]
pub enum BookingEvent {
    Created(Booking),
    StatusUpdated(Booking),
    Deleted(Booking),
}

/// Events of the `orders` module.
#[derive(Debug, Clone, PartialEq)]
pub enum OrderEvent {
    Created(Order),
    StatusUpdated(Order),
    Updated(Order),
    Deleted(Order),
}

/// Events of the `quotes` module.
#[derive(Debug, Clone, PartialEq)]
pub enum QuoteEvent {
    Created(Quote),
    StatusUpdated(Quote),
    Deleted(Quote),
    ResponseCreated(Quote),
}

fn record<T: Default + for<'de> serde::Deserialize<'de>>(envelope: &InboundEnvelope) -> T {
    envelope.parse_data::<T>().ok().flatten().unwrap_or_default()
}

impl ModuleEvent for BookingEvent {
    const MODULE: Module = Module::Bookings;

    fn from_envelope(envelope: &InboundEnvelope) -> Option<Self> {
        match envelope.message_type() {
            MessageType::NewBooking => Some(BookingEvent::Created(record(envelope))),
            MessageType::BookingStatusUpdate => Some(BookingEvent::StatusUpdated(record(envelope))),
            MessageType::BookingDeleted => Some(BookingEvent::Deleted(record(envelope))),
            _ => None,
        }
    }
}

impl ModuleEvent for OrderEvent {
    const MODULE: Module = Module::Orders;

    fn from_envelope(envelope: &InboundEnvelope) -> Option<Self> {
        match envelope.message_type() {
            MessageType::NewOrder => Some(OrderEvent::Created(record(envelope))),
            MessageType::OrderStatusUpdated => Some(OrderEvent::StatusUpdated(record(envelope))),
            MessageType::OrderUpdated => Some(OrderEvent::Updated(record(envelope))),
            MessageType::OrderDeleted => Some(OrderEvent::Deleted(record(envelope))),
            _ => None,
        }
    }
}

impl ModuleEvent for QuoteEvent {
    const MODULE: Module = Module::Quotes;

    fn from_envelope(envelope: &InboundEnvelope) -> Option<Self> {
        match envelope.message_type() {
            MessageType::NewQuote => Some(QuoteEvent::Created(record(envelope))),
            MessageType::QuoteStatusUpdated => Some(QuoteEvent::StatusUpdated(record(envelope))),
            MessageType::QuoteDeleted => Some(QuoteEvent::Deleted(record(envelope))),
            MessageType::QuoteResponseCreated => Some(QuoteEvent::ResponseCreated(record(envelope))),
            _ => None,
        }
    }
}
