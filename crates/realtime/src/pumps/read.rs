//! WebSocket read pump: forwards inbound frames to the driver.

use std::time::Duration;

use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use rentdesk_protocol::constants::{WS_CLOSE_ABNORMAL, WS_CLOSE_NO_STATUS};

use crate::ws_client::SocketEvent;

/// Placeholder deadline when the pong watchdog is disabled; the select
/// branch is guarded off so it never fires.
const WATCHDOG_IDLE: Duration = Duration::from_secs(3600);

/// Reads frames until the socket closes, the watchdog expires or `cancel`
/// fires, then reports the close code.
///
/// With `pong_wait` set, any incoming frame resets the deadline; silence for
/// longer than `pong_wait` is treated as a dead connection (1006). A local
/// cancel reports nothing, since the driver already knows.
pub(crate) async fn read_pump<S>(
    mut read: S,
    epoch: u64,
    events: mpsc::UnboundedSender<SocketEvent>,
    write_tx: mpsc::Sender<tungstenite::Message>,
    pong_wait: Option<Duration>,
    cancel: CancellationToken,
) where
    S: StreamExt<Item = Result<tungstenite::Message, tungstenite::Error>> + Unpin,
{
    let watchdog = pong_wait.is_some();
    let wait = pong_wait.unwrap_or(WATCHDOG_IDLE);
    let deadline = tokio::time::sleep(wait);
    tokio::pin!(deadline);

    let (code, reason) = loop {
        tokio::select! {
            _ = cancel.cancelled() => return,

            () = &mut deadline, if watchdog => {
                warn!(epoch, "no frames within pong wait, treating connection as dead");
                break (WS_CLOSE_ABNORMAL, "pong timeout".to_string());
            }

            msg = read.next() => {
                match msg {
                    Some(Ok(msg)) => {
                        if watchdog {
                            deadline.as_mut().reset(tokio::time::Instant::now() + wait);
                        }

                        match msg {
                            tungstenite::Message::Text(text) => {
                                let event = SocketEvent::Frame {
                                    epoch,
                                    text: text.as_str().to_owned(),
                                };
                                if events.send(event).is_err() {
                                    return;
                                }
                            }
                            tungstenite::Message::Ping(data) => {
                                trace!("received ping, sending pong");
                                let _ = write_tx.send(tungstenite::Message::Pong(data)).await;
                            }
                            tungstenite::Message::Pong(_) => {
                                trace!("received transport pong");
                            }
                            tungstenite::Message::Close(frame) => {
                                debug!(epoch, ?frame, "received close frame");
                                break match frame {
                                    Some(f) => (u16::from(f.code), f.reason.as_str().to_owned()),
                                    None => (WS_CLOSE_NO_STATUS, String::new()),
                                };
                            }
                            _ => {} // binary and raw frames
                        }
                    }
                    Some(Err(e)) => {
                        warn!(epoch, "WebSocket read error: {e}");
                        break (WS_CLOSE_ABNORMAL, e.to_string());
                    }
                    None => {
                        debug!(epoch, "WebSocket stream ended");
                        break (WS_CLOSE_ABNORMAL, "stream ended".to_string());
                    }
                }
            }
        }
    };

    let _ = events.send(SocketEvent::Closed {
        epoch,
        code,
        reason,
    });
}
