//! Connection actor.
//!
//! A single task owns the socket, the retry timer and the lifecycle. The
//! public [`Connection`](crate::Connection) handle talks to it through a
//! command channel; sockets talk to it through [`SocketEvent`]s. Every
//! socket gets a fresh epoch, and events from older epochs are dropped, so a
//! late close from a replaced socket can never fire hooks twice.

use std::collections::BTreeSet;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Sleep;
use tracing::{debug, info, trace, warn};

use rentdesk_protocol::constants::{WS_CLOSE_ABNORMAL, WS_CLOSE_NORMAL};
use rentdesk_protocol::{ClientFrame, InboundEnvelope, MessageType, Module};

use crate::config::RealtimeConfig;
use crate::error::RealtimeError;
use crate::reconnection::{CloseOutcome, Lifecycle};
use crate::router::{MessageRouter, Routed};
use crate::subscription::SubscriptionRegistry;
use crate::types::{ClientIdentity, CloseInfo, ConnectionHooks, ConnectionState};
use crate::ws_client::{SocketEvent, WsClient};

/// Locks a std mutex, recovering the data if a callback panicked while
/// holding it.
pub(crate) fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// State shared between the handle and the actor.
#[derive(Debug, Default)]
pub(crate) struct Shared {
    pub(crate) registry: Mutex<SubscriptionRegistry>,
    pub(crate) router: Mutex<MessageRouter>,
    pub(crate) identity: Mutex<ClientIdentity>,
    pub(crate) hooks: Mutex<ConnectionHooks>,
}

/// Requests from the handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Command {
    Connect,
    Disconnect,
    Reconnect,
    Subscribe(Module),
    Unsubscribe(Module),
    Shutdown,
}

pub(crate) struct Driver {
    url: String,
    heartbeat: Duration,
    pong_wait: Option<Duration>,
    manual_reconnect_delay: Duration,
    lifecycle: Lifecycle,
    shared: Arc<Shared>,
    state_tx: watch::Sender<ConnectionState>,
    commands: mpsc::UnboundedReceiver<Command>,
    events_tx: mpsc::UnboundedSender<SocketEvent>,
    events_rx: mpsc::UnboundedReceiver<SocketEvent>,
    epoch: u64,
    client: Option<WsClient>,
    opening: Option<JoinHandle<()>>,
    /// Modules a `subscribe` went out for on the current socket.
    sent: BTreeSet<Module>,
    retry: Option<Pin<Box<Sleep>>>,
}

impl Driver {
    pub(crate) fn new(
        config: &RealtimeConfig,
        url: String,
        shared: Arc<Shared>,
        state_tx: watch::Sender<ConnectionState>,
        commands: mpsc::UnboundedReceiver<Command>,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            url,
            heartbeat: config.heartbeat(),
            pong_wait: config.pong_timeout(),
            manual_reconnect_delay: config.manual_reconnect_delay(),
            lifecycle: Lifecycle::new(config.reconnect_policy()),
            shared,
            state_tx,
            commands,
            events_tx,
            events_rx,
            epoch: 0,
            client: None,
            opening: None,
            sent: BTreeSet::new(),
            retry: None,
        }
    }

    /// Runs until shutdown or until every handle is dropped.
    pub(crate) async fn run(mut self) {
        debug!(url = %self.url, "connection driver started");
        loop {
            tokio::select! {
                cmd = self.commands.recv() => match cmd {
                    Some(Command::Shutdown) | None => break,
                    Some(cmd) => self.handle_command(cmd),
                },
                Some(event) = self.events_rx.recv() => self.handle_event(event),
                () = wait_retry(&mut self.retry) => {
                    self.retry = None;
                    self.open_socket();
                }
            }
        }
        self.force_disconnect("client shutdown");
        debug!("connection driver stopped");
    }

    fn handle_command(&mut self, cmd: Command) {
        trace!(?cmd, "command");
        match cmd {
            Command::Connect => {
                if matches!(
                    self.lifecycle.state(),
                    ConnectionState::Connecting | ConnectionState::Connected
                ) {
                    return;
                }
                if self.lifecycle.state() == ConnectionState::Error {
                    self.lifecycle.reset_attempts();
                }
                self.retry = None;
                self.open_socket();
            }
            Command::Disconnect => {
                info!("disconnect requested");
                self.force_disconnect("client disconnect");
            }
            Command::Reconnect => {
                info!(
                    delay_ms = self.manual_reconnect_delay.as_millis() as u64,
                    "manual reconnect"
                );
                self.lifecycle.reset_attempts();
                self.force_disconnect("client reconnect");
                self.retry = Some(Box::pin(tokio::time::sleep(self.manual_reconnect_delay)));
            }
            Command::Subscribe(module) => {
                let desired = lock(&self.shared.registry).is_desired(module);
                if desired && !self.sent.contains(&module) {
                    self.send_subscribe(module);
                }
            }
            Command::Unsubscribe(module) => {
                let desired = lock(&self.shared.registry).is_desired(module);
                if !desired && self.sent.remove(&module) {
                    self.send(&ClientFrame::Unsubscribe { module });
                }
            }
            Command::Shutdown => {}
        }
    }

    fn handle_event(&mut self, event: SocketEvent) {
        if event.epoch() != self.epoch {
            trace!(
                epoch = event.epoch(),
                current = self.epoch,
                "ignoring event from a stale socket"
            );
            if let SocketEvent::Opened { client, .. } = event {
                client.close(WS_CLOSE_NORMAL, "superseded");
            }
            return;
        }

        match event {
            SocketEvent::Opened { client, .. } => self.on_opened(client),
            SocketEvent::OpenFailed { error, .. } => {
                self.opening = None;
                warn!(epoch = self.epoch, "connection failed: {error}");
                self.on_closed(WS_CLOSE_ABNORMAL, error.to_string());
            }
            SocketEvent::Frame { text, .. } => self.handle_frame(&text),
            SocketEvent::Closed { code, reason, .. } => {
                info!(epoch = self.epoch, code, reason = %reason, "connection closed");
                self.on_closed(code, reason);
            }
        }
    }

    fn open_socket(&mut self) {
        if !self.lifecycle.begin_connect() {
            return;
        }
        self.publish();

        self.epoch += 1;
        let epoch = self.epoch;
        let url = self.url.clone();
        let events = self.events_tx.clone();
        info!(epoch, url = %url, attempt = self.lifecycle.attempt(), "connecting");

        self.opening = Some(tokio::spawn(async move {
            let event = match WsClient::connect(&url, epoch).await {
                Ok(client) => SocketEvent::Opened { epoch, client },
                Err(error) => SocketEvent::OpenFailed { epoch, error },
            };
            let _ = events.send(event);
        }));
    }

    fn on_opened(&mut self, mut client: WsClient) {
        self.opening = None;
        self.lifecycle.opened();
        self.publish();
        client.start(self.events_tx.clone(), self.heartbeat, self.pong_wait);
        self.client = Some(client);
        info!(epoch = self.epoch, "connected");

        self.send(&ClientFrame::identify_admin());
        self.sent.clear();
        let desired = lock(&self.shared.registry).desired();
        for module in desired {
            self.send_subscribe(module);
        }

        let identity = lock(&self.shared.identity).clone();
        if let Some(hook) = self.hooks().on_connected {
            hook(&identity);
        }
    }

    fn on_closed(&mut self, code: u16, reason: String) {
        self.client = None;
        self.clear_session();

        let outcome = self.lifecycle.closed(code);
        self.publish();

        if let Some(hook) = self.hooks().on_disconnected {
            hook(&CloseInfo {
                code,
                reason,
                by_client: false,
            });
        }

        match outcome {
            CloseOutcome::Final => debug!(code, "clean close, not reconnecting"),
            CloseOutcome::Retry { attempt, delay } => {
                info!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "scheduling reconnect"
                );
                self.retry = Some(Box::pin(tokio::time::sleep(delay)));
            }
            CloseOutcome::Exhausted { attempts } => {
                warn!(attempts, "reconnect attempts exhausted");
                self.fire_error(RealtimeError::RetriesExhausted { attempts });
            }
        }
    }

    /// Cancels the retry timer, closes any socket with 1000 and clears
    /// per-connection state. Hooks fire only if a socket was open or opening.
    fn force_disconnect(&mut self, reason: &str) {
        self.retry = None;
        // Any event still in flight for the old socket is now stale.
        self.epoch += 1;
        if let Some(handle) = self.opening.take() {
            handle.abort();
        }
        if let Some(client) = self.client.take() {
            client.close(WS_CLOSE_NORMAL, reason);
        }
        self.clear_session();

        let previous = self.lifecycle.disconnect();
        self.publish();

        if matches!(
            previous,
            ConnectionState::Connected | ConnectionState::Connecting
        ) && let Some(hook) = self.hooks().on_disconnected
        {
            hook(&CloseInfo {
                code: WS_CLOSE_NORMAL,
                reason: reason.to_string(),
                by_client: true,
            });
        }
    }

    fn handle_frame(&mut self, text: &str) {
        let routed = lock(&self.shared.router).route(text);
        match routed {
            Routed::Control(envelope) => self.handle_control(envelope),
            Routed::Domain(dispatch) => {
                let module = dispatch.module;
                let delivered = dispatch.deliver();
                trace!(%module, delivered, "dispatched event");
            }
            Routed::Unknown(msg_type) => {
                debug!(msg_type = %msg_type, "dropping message of unknown type");
            }
            Routed::Malformed(e) => {
                warn!("malformed frame: {e}");
                self.fire_error(RealtimeError::Protocol(e));
            }
            Routed::Oversized(len) => {
                warn!(len, "dropping oversized frame");
                self.fire_error(RealtimeError::Protocol(format!(
                    "frame of {len} bytes exceeds limit"
                )));
            }
        }
    }

    fn handle_control(&mut self, envelope: InboundEnvelope) {
        match envelope.message_type() {
            MessageType::ConnectionEstablished => {
                self.lifecycle.established();
                info!(client_id = ?envelope.client_id, "connection established");
                lock(&self.shared.identity).client_id = envelope.client_id;
            }
            MessageType::SubscriptionConfirmed => match envelope.declared_module() {
                Some(module) => {
                    if lock(&self.shared.registry).confirm(module) {
                        debug!(%module, "subscription confirmed");
                    } else {
                        debug!(%module, "confirmation for a module no longer desired");
                    }
                }
                None => debug!(module = ?envelope.module, "confirmation without a known module"),
            },
            MessageType::IdentificationConfirmed => debug!("identification confirmed"),
            MessageType::Pong => trace!("pong"),
            MessageType::Error => {
                let message = envelope
                    .message
                    .unwrap_or_else(|| "unspecified server error".to_string());
                warn!(message = %message, "server reported an error");
                self.fire_error(RealtimeError::Server(message));
            }
            MessageType::ServerShutdown => info!("server is shutting down"),
            other => debug!(msg_type = %other, "unexpected control frame"),
        }
    }

    fn send_subscribe(&mut self, module: Module) {
        if self.client.is_some() && self.send(&ClientFrame::Subscribe { module }) {
            self.sent.insert(module);
        }
    }

    /// Sends on the open socket. Returns `false` if there is none or the
    /// frame could not be queued.
    fn send(&self, frame: &ClientFrame) -> bool {
        let Some(client) = &self.client else {
            return false;
        };
        match client.send(frame) {
            Ok(()) => true,
            Err(e) => {
                warn!(?frame, "failed to queue frame: {e}");
                false
            }
        }
    }

    fn clear_session(&mut self) {
        self.sent.clear();
        lock(&self.shared.registry).clear_confirmed();
        lock(&self.shared.identity).client_id = None;
    }

    fn publish(&self) {
        self.state_tx.send_replace(self.lifecycle.state());
    }

    fn hooks(&self) -> ConnectionHooks {
        lock(&self.shared.hooks).clone()
    }

    fn fire_error(&self, err: RealtimeError) {
        if let Some(hook) = self.hooks().on_error {
            hook(&err);
        }
    }
}

async fn wait_retry(timer: &mut Option<Pin<Box<Sleep>>>) {
    match timer {
        Some(sleep) => sleep.as_mut().await,
        None => std::future::pending().await,
    }
}
