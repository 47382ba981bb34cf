//! Inbound frame routing.
//!
//! Frames are parsed into [`InboundEnvelope`]s and classified. Domain
//! events are fanned out to every handler registered for their module and
//! to the observer, each receiving the full envelope.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use rentdesk_protocol::constants::WS_MAX_MESSAGE_SIZE;
use rentdesk_protocol::{InboundEnvelope, Module};

/// Callback for one module's events.
pub type ModuleHandler = Arc<dyn Fn(&InboundEnvelope) + Send + Sync>;

/// Callback that sees every routed domain event.
pub type Observer = Arc<dyn Fn(Module, &InboundEnvelope) + Send + Sync>;

/// Identifies a registered module handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

/// Classification of one inbound frame.
pub enum Routed {
    /// Protocol control frame for the connection itself.
    Control(InboundEnvelope),
    /// Domain event with its delivery list.
    Domain(Dispatch),
    /// Parsed, but the type is not known to this client.
    Unknown(String),
    /// Not valid JSON or missing `type`.
    Malformed(String),
    /// Larger than the maximum frame size.
    Oversized(usize),
}

/// A domain event together with the consumers it must reach.
///
/// Built under the router lock and delivered after the lock is released, so
/// handlers may register or remove handlers themselves.
pub struct Dispatch {
    pub module: Module,
    pub envelope: InboundEnvelope,
    handlers: Vec<ModuleHandler>,
    observer: Option<Observer>,
}

impl Dispatch {
    /// Invokes every handler, then the observer. Returns how many consumers
    /// received the event.
    pub fn deliver(self) -> usize {
        let mut delivered = 0;
        for handler in &self.handlers {
            handler(&self.envelope);
            delivered += 1;
        }
        if let Some(observer) = &self.observer {
            observer(self.module, &self.envelope);
            delivered += 1;
        }
        delivered
    }
}

impl fmt::Debug for Dispatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatch")
            .field("module", &self.module)
            .field("type", &self.envelope.msg_type)
            .field("handlers", &self.handlers.len())
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

impl fmt::Debug for Routed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Routed::Control(env) => f.debug_tuple("Control").field(&env.msg_type).finish(),
            Routed::Domain(d) => f.debug_tuple("Domain").field(d).finish(),
            Routed::Unknown(t) => f.debug_tuple("Unknown").field(t).finish(),
            Routed::Malformed(e) => f.debug_tuple("Malformed").field(e).finish(),
            Routed::Oversized(n) => f.debug_tuple("Oversized").field(n).finish(),
        }
    }
}

/// Dispatch table indexed by [`Module`].
#[derive(Default)]
pub struct MessageRouter {
    handlers: [Vec<(HandlerId, ModuleHandler)>; 3],
    observer: Option<Observer>,
    next_id: u64,
}

impl MessageRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler for one module's events.
    pub fn register(&mut self, module: Module, handler: ModuleHandler) -> HandlerId {
        let id = HandlerId(self.next_id);
        self.next_id += 1;
        self.slot_mut(module).push((id, handler));
        id
    }

    /// Removes a handler. Returns `true` if it was registered.
    pub fn unregister(&mut self, id: HandlerId) -> bool {
        for slot in &mut self.handlers {
            let before = slot.len();
            slot.retain(|(h, _)| *h != id);
            if slot.len() != before {
                return true;
            }
        }
        false
    }

    pub fn set_observer(&mut self, observer: Option<Observer>) {
        self.observer = observer;
    }

    /// Number of handlers registered for a module.
    pub fn handler_count(&self, module: Module) -> usize {
        self.slot(module).len()
    }

    /// Classifies a raw text frame.
    pub fn route(&self, text: &str) -> Routed {
        if text.len() > WS_MAX_MESSAGE_SIZE {
            return Routed::Oversized(text.len());
        }

        let envelope = match InboundEnvelope::parse(text) {
            Ok(env) => env,
            Err(e) => return Routed::Malformed(e.to_string()),
        };

        let msg_type = envelope.message_type();
        if msg_type.is_control() {
            return Routed::Control(envelope);
        }

        let Some(module) = msg_type.module() else {
            return Routed::Unknown(envelope.msg_type);
        };

        if let Some(declared) = &envelope.module
            && declared != module.as_str()
        {
            debug!(
                msg_type = %msg_type,
                declared = %declared,
                routed = %module,
                "module field disagrees with type table, routing by type"
            );
        }

        Routed::Domain(Dispatch {
            module,
            handlers: self
                .slot(module)
                .iter()
                .map(|(_, h)| Arc::clone(h))
                .collect(),
            observer: self.observer.clone(),
            envelope,
        })
    }

    fn slot(&self, module: Module) -> &Vec<(HandlerId, ModuleHandler)> {
        &self.handlers[module.index()]
    }

    fn slot_mut(&mut self, module: Module) -> &mut Vec<(HandlerId, ModuleHandler)> {
        &mut self.handlers[module.index()]
    }
}

impl fmt::Debug for MessageRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("MessageRouter");
        for module in Module::ALL {
            s.field(module.as_str(), &self.handler_count(module));
        }
        s.field("observer", &self.observer.is_some()).finish()
    }
}
