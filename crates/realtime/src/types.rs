//! Public types for the real-time connection.

use std::fmt;
use std::sync::Arc;

use rentdesk_protocol::constants::CLIENT_TYPE_ADMIN;

use crate::error::RealtimeError;

/// Connection state. Exactly one value at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No socket and no pending automatic retry is running yet.
    #[default]
    Disconnected,
    /// Socket open in progress.
    Connecting,
    /// Socket open; frames flow.
    Connected,
    /// Automatic retries exhausted. Only a manual reconnect leaves this state.
    Error,
}

impl ConnectionState {
    /// Short status label for UI indicators.
    pub fn indicator(self) -> &'static str {
        match self {
            ConnectionState::Connected => "connected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Disconnected | ConnectionState::Error => "offline",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Error => "error",
        };
        f.write_str(s)
    }
}

/// Identity of this client as seen by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentity {
    /// Assigned by the server on `connection_established`; unset while disconnected.
    pub client_id: Option<String>,
    pub client_type: String,
}

impl Default for ClientIdentity {
    fn default() -> Self {
        Self {
            client_id: None,
            client_type: CLIENT_TYPE_ADMIN.to_string(),
        }
    }
}

/// Details of a socket close, passed to the disconnect hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseInfo {
    pub code: u16,
    pub reason: String,
    /// `true` when this client closed the socket on purpose.
    pub by_client: bool,
}

pub type ConnectedHook = Arc<dyn Fn(&ClientIdentity) + Send + Sync>;
pub type DisconnectedHook = Arc<dyn Fn(&CloseInfo) + Send + Sync>;
pub type ErrorHook = Arc<dyn Fn(&RealtimeError) + Send + Sync>;

/// Lifecycle callbacks. Each fires exactly once per state transition.
#[derive(Clone, Default)]
pub struct ConnectionHooks {
    pub on_connected: Option<ConnectedHook>,
    pub on_disconnected: Option<DisconnectedHook>,
    /// Terminal transport failures and non-fatal protocol errors.
    pub on_error: Option<ErrorHook>,
}

impl ConnectionHooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fires when the socket opens, right after `identify` and the
    /// resubscriptions are sent. The server has not assigned a client id
    /// yet, so `client_id` is always `None` here; read it later through
    /// [`Connection::client_identity`](crate::Connection::client_identity).
    pub fn on_connected(mut self, f: impl Fn(&ClientIdentity) + Send + Sync + 'static) -> Self {
        self.on_connected = Some(Arc::new(f));
        self
    }

    pub fn on_disconnected(mut self, f: impl Fn(&CloseInfo) + Send + Sync + 'static) -> Self {
        self.on_disconnected = Some(Arc::new(f));
        self
    }

    pub fn on_error(mut self, f: impl Fn(&RealtimeError) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(f));
        self
    }
}

impl fmt::Debug for ConnectionHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionHooks")
            .field("on_connected", &self.on_connected.is_some())
            .field("on_disconnected", &self.on_disconnected.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}
