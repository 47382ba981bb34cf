//! Typed per-module facades over the shared connection.
//!
//! An adapter is the only thing feature code needs for one module: it
//! declares interest while alive, decodes envelopes into the module's event
//! enum, and passes connection status through. Dropping it withdraws the
//! interest and removes the handler.

use std::fmt;
use std::marker::PhantomData;

use tracing::debug;

use rentdesk_protocol::{BookingEvent, InboundEnvelope, Module, ModuleEvent, OrderEvent, QuoteEvent};

use crate::connection::Connection;
use crate::router::HandlerId;
use crate::types::ConnectionState;

/// Interest in one module plus a typed handler, held for the adapter's lifetime.
pub struct ModuleAdapter<E: ModuleEvent> {
    conn: Connection,
    handler: HandlerId,
    _event: PhantomData<fn(E)>,
}

pub type BookingsAdapter = ModuleAdapter<BookingEvent>;
pub type OrdersAdapter = ModuleAdapter<OrderEvent>;
pub type QuotesAdapter = ModuleAdapter<QuoteEvent>;

impl<E: ModuleEvent> ModuleAdapter<E> {
    /// Registers `handler` for the module's events and declares interest.
    ///
    /// Every event type of the module is delivered, with a best-effort
    /// record when `data` is oddly shaped. Types foreign to the module are
    /// logged and skipped.
    pub fn attach(conn: &Connection, handler: impl Fn(E) + Send + Sync + 'static) -> Self {
        let id = conn.on_module_message(E::MODULE, move |envelope: &InboundEnvelope| {
            match E::from_envelope(envelope) {
                Some(event) => handler(event),
                None => debug!(
                    module = %E::MODULE,
                    msg_type = %envelope.msg_type,
                    "event type not part of module, skipping"
                ),
            }
        });
        conn.declare_interest(E::MODULE);
        Self {
            conn: conn.clone(),
            handler: id,
            _event: PhantomData,
        }
    }

    pub fn module(&self) -> Module {
        E::MODULE
    }

    pub fn state(&self) -> ConnectionState {
        self.conn.state()
    }

    pub fn is_connected(&self) -> bool {
        self.conn.is_connected()
    }

    /// Whether the server has confirmed this module on the current socket.
    pub fn is_confirmed(&self) -> bool {
        self.conn.is_confirmed(E::MODULE)
    }
}

impl<E: ModuleEvent> Drop for ModuleAdapter<E> {
    fn drop(&mut self) {
        self.conn.remove_handler(self.handler);
        self.conn.withdraw_interest(E::MODULE);
    }
}

impl<E: ModuleEvent> fmt::Debug for ModuleAdapter<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleAdapter")
            .field("module", &E::MODULE)
            .field("handler", &self.handler)
            .finish()
    }
}

impl Connection {
    /// Typed handler for booking events; see [`ModuleAdapter`].
    pub fn on_bookings_message(
        &self,
        handler: impl Fn(BookingEvent) + Send + Sync + 'static,
    ) -> BookingsAdapter {
        ModuleAdapter::attach(self, handler)
    }

    /// Typed handler for order events; see [`ModuleAdapter`].
    pub fn on_orders_message(
        &self,
        handler: impl Fn(OrderEvent) + Send + Sync + 'static,
    ) -> OrdersAdapter {
        ModuleAdapter::attach(self, handler)
    }

    /// Typed handler for quote events; see [`ModuleAdapter`].
    pub fn on_quotes_message(
        &self,
        handler: impl Fn(QuoteEvent) + Send + Sync + 'static,
    ) -> QuotesAdapter {
        ModuleAdapter::attach(self, handler)
    }
}
