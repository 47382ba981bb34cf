//! One WebSocket connection to the notification server.
//!
//! A [`WsClient`] owns the pumps of a single socket. It never reconnects on
//! its own: every frame and the final close are reported to the driver as
//! [`SocketEvent`]s tagged with the socket's epoch, and the driver decides
//! what happens next.

use std::fmt;
use std::time::Duration;

use futures_util::StreamExt;
use futures_util::stream::SplitStream;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use rentdesk_protocol::ClientFrame;
use rentdesk_protocol::constants::WS_MAX_MESSAGE_SIZE;

use crate::error::RealtimeError;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Outbound queue depth per socket.
const WRITE_QUEUE: usize = 256;

/// Everything a socket reports back to the driver.
#[derive(Debug)]
pub(crate) enum SocketEvent {
    /// The handshake finished.
    Opened { epoch: u64, client: WsClient },
    /// The handshake failed.
    OpenFailed { epoch: u64, error: RealtimeError },
    /// One inbound text frame.
    Frame { epoch: u64, text: String },
    /// The socket is gone, with the close code observed.
    Closed { epoch: u64, code: u16, reason: String },
}

impl SocketEvent {
    pub(crate) fn epoch(&self) -> u64 {
        match self {
            SocketEvent::Opened { epoch, .. }
            | SocketEvent::OpenFailed { epoch, .. }
            | SocketEvent::Frame { epoch, .. }
            | SocketEvent::Closed { epoch, .. } => *epoch,
        }
    }
}

/// A single open socket and its pumps.
pub(crate) struct WsClient {
    epoch: u64,
    write_tx: mpsc::Sender<tungstenite::Message>,
    reader: Option<SplitStream<WsStream>>,
    cancel: CancellationToken,
    _write_handle: JoinHandle<()>,
    read_handle: Option<JoinHandle<()>>,
    ping_handle: Option<JoinHandle<()>>,
}

impl WsClient {
    /// Opens a socket and starts its write pump.
    ///
    /// Nothing is read until [`WsClient::start`], so no frame can reach the
    /// driver before it has seen [`SocketEvent::Opened`].
    pub(crate) async fn connect(url: &str, epoch: u64) -> Result<Self, RealtimeError> {
        let mut ws_config = WebSocketConfig::default();
        ws_config.max_message_size = Some(WS_MAX_MESSAGE_SIZE);
        ws_config.max_frame_size = Some(WS_MAX_MESSAGE_SIZE);
        let (ws_stream, _) =
            tokio_tungstenite::connect_async_with_config(url, Some(ws_config), false).await?;
        let (write, read) = ws_stream.split();

        let (write_tx, write_rx) = mpsc::channel::<tungstenite::Message>(WRITE_QUEUE);
        let cancel = CancellationToken::new();

        let write_handle = {
            let cancel = cancel.clone();
            tokio::spawn(crate::pumps::write::write_pump(write, write_rx, cancel))
        };

        debug!(epoch, url, "socket opened");
        Ok(Self {
            epoch,
            write_tx,
            reader: Some(read),
            cancel,
            _write_handle: write_handle,
            read_handle: None,
            ping_handle: None,
        })
    }

    /// Starts the read pump and the heartbeat. Calling it twice is a no-op.
    pub(crate) fn start(
        &mut self,
        events: mpsc::UnboundedSender<SocketEvent>,
        heartbeat: Duration,
        pong_wait: Option<Duration>,
    ) {
        let Some(read) = self.reader.take() else {
            return;
        };

        self.read_handle = Some(tokio::spawn(crate::pumps::read::read_pump(
            read,
            self.epoch,
            events,
            self.write_tx.clone(),
            pong_wait,
            self.cancel.clone(),
        )));

        self.ping_handle = Some(tokio::spawn(crate::pumps::ping::ping_pump(
            heartbeat,
            self.write_tx.clone(),
            self.cancel.clone(),
        )));
    }

    pub(crate) fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Queues a frame without waiting for room.
    pub(crate) fn send(&self, frame: &ClientFrame) -> Result<(), RealtimeError> {
        let json = frame.to_json()?;
        self.write_tx
            .try_send(tungstenite::Message::Text(json.into()))
            .map_err(|e| match e {
                TrySendError::Full(_) => RealtimeError::QueueFull,
                TrySendError::Closed(_) => RealtimeError::Closed,
            })
    }

    /// Sends a close frame with `code` and stops the pumps. The write pump
    /// flushes the close frame before it exits.
    pub(crate) fn close(self, code: u16, reason: &str) {
        let frame = CloseFrame {
            code: code.into(),
            reason: reason.into(),
        };
        let _ = self
            .write_tx
            .try_send(tungstenite::Message::Close(Some(frame)));
        // Drop does the rest.
    }
}

impl Drop for WsClient {
    fn drop(&mut self) {
        self.cancel.cancel();
        if let Some(h) = &self.read_handle {
            h.abort();
        }
        if let Some(h) = &self.ping_handle {
            h.abort();
        }
        // The write pump exits on its own once its queue is drained.
    }
}

impl fmt::Debug for WsClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WsClient")
            .field("epoch", &self.epoch)
            .field("started", &self.reader.is_none())
            .finish()
    }
}
