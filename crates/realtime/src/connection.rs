//! Public handle to the shared real-time connection.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::debug;

use rentdesk_protocol::{InboundEnvelope, Module};

use crate::config::RealtimeConfig;
use crate::driver::{Command, Driver, Shared, lock};
use crate::error::RealtimeError;
use crate::router::{HandlerId, Observer};
use crate::types::{ClientIdentity, ConnectionHooks, ConnectionState};

/// Cloneable handle to one multiplexed WebSocket connection.
///
/// Every method returns immediately; effects are observed through
/// [`Connection::watch_state`] and the [`ConnectionHooks`]. The background
/// task stops after [`Connection::shutdown`] or once every handle is dropped.
#[derive(Clone)]
pub struct Connection {
    commands: mpsc::UnboundedSender<Command>,
    shared: Arc<Shared>,
    state: watch::Receiver<ConnectionState>,
    auto_connect: bool,
}

impl Connection {
    /// Validates the config and spawns the connection task. Must be called
    /// inside a Tokio runtime. Does not connect unless told to.
    pub fn new(config: RealtimeConfig) -> Result<Self, RealtimeError> {
        let url = config.websocket_url()?;
        let shared = Arc::new(Shared::default());
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();

        let driver = Driver::new(&config, url, shared.clone(), state_tx, cmd_rx);
        tokio::spawn(driver.run());

        Ok(Self {
            commands: cmd_tx,
            shared,
            state: state_rx,
            auto_connect: config.auto_connect,
        })
    }

    /// Opens the socket. No-op while a socket is open or opening.
    pub fn connect(&self) {
        self.command(Command::Connect);
    }

    /// Closes the socket with 1000 and cancels any pending retry.
    pub fn disconnect(&self) {
        self.command(Command::Disconnect);
    }

    /// Resets the retry budget, disconnects, then connects again after a
    /// short delay. The way out of [`ConnectionState::Error`].
    pub fn reconnect(&self) {
        self.command(Command::Reconnect);
    }

    /// Disconnects and stops the background task. Further calls are ignored.
    pub fn shutdown(&self) {
        self.command(Command::Shutdown);
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// A receiver that observes every state change.
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }

    pub fn client_identity(&self) -> ClientIdentity {
        lock(&self.shared.identity).clone()
    }

    /// Modules currently desired by at least one consumer.
    pub fn subscribed_modules(&self) -> Vec<Module> {
        lock(&self.shared.registry).desired()
    }

    /// Modules the server has confirmed on the current socket.
    pub fn confirmed_modules(&self) -> Vec<Module> {
        lock(&self.shared.registry).confirmed()
    }

    pub fn is_confirmed(&self, module: Module) -> bool {
        lock(&self.shared.registry).is_confirmed(module)
    }

    /// Adds one interest in `module`. The first interest sends `subscribe`
    /// if the socket is open; otherwise it goes out on the next open.
    pub fn declare_interest(&self, module: Module) {
        let (first, was_idle) = {
            let mut registry = lock(&self.shared.registry);
            let was_idle = registry.is_empty();
            (registry.declare(module), was_idle)
        };
        if !first {
            return;
        }
        debug!(%module, "interest declared");
        if self.auto_connect && was_idle {
            self.command(Command::Connect);
        }
        self.command(Command::Subscribe(module));
    }

    /// Removes one interest in `module`. The last withdrawal sends
    /// `unsubscribe` if the socket is open.
    pub fn withdraw_interest(&self, module: Module) {
        let (last, now_idle) = {
            let mut registry = lock(&self.shared.registry);
            let last = registry.withdraw(module);
            (last, registry.is_empty())
        };
        if !last {
            return;
        }
        debug!(%module, "interest withdrawn");
        self.command(Command::Unsubscribe(module));
        if self.auto_connect && now_idle {
            self.command(Command::Disconnect);
        }
    }

    /// Registers a raw handler for one module's events. Does not declare
    /// interest; see [`ModuleAdapter`](crate::ModuleAdapter) for the pairing.
    pub fn on_module_message(
        &self,
        module: Module,
        handler: impl Fn(&InboundEnvelope) + Send + Sync + 'static,
    ) -> HandlerId {
        lock(&self.shared.router).register(module, Arc::new(handler))
    }

    /// Removes a handler registered with [`Connection::on_module_message`].
    pub fn remove_handler(&self, id: HandlerId) -> bool {
        lock(&self.shared.router).unregister(id)
    }

    /// Sets the callback that sees every domain event, e.g. a notification
    /// feed. Replaces any previous observer.
    pub fn set_observer(&self, observer: impl Fn(Module, &InboundEnvelope) + Send + Sync + 'static) {
        let observer: Observer = Arc::new(observer);
        lock(&self.shared.router).set_observer(Some(observer));
    }

    pub fn clear_observer(&self) {
        lock(&self.shared.router).set_observer(None);
    }

    /// Replaces the lifecycle hooks.
    pub fn set_hooks(&self, hooks: ConnectionHooks) {
        *lock(&self.shared.hooks) = hooks;
    }

    fn command(&self, cmd: Command) {
        if self.commands.send(cmd).is_err() {
            debug!(?cmd, "connection task has stopped, ignoring command");
        }
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("state", &self.state())
            .field("subscribed", &self.subscribed_modules())
            .field("auto_connect", &self.auto_connect)
            .finish()
    }
}
