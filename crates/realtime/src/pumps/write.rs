//! WebSocket write pump: serialises outbound frames.

use futures_util::SinkExt;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite;
use tokio_util::sync::CancellationToken;
use tracing::{error, trace};

/// Writes queued frames to the WebSocket until cancelled or the queue closes.
///
/// Already-queued frames are flushed before a cancel is honoured, so a
/// close frame sent just before cancelling still reaches the server. If no
/// close frame went out, a bare one is sent on the way out.
pub(crate) async fn write_pump<S>(
    mut write: S,
    mut write_rx: mpsc::Receiver<tungstenite::Message>,
    cancel: CancellationToken,
) where
    S: SinkExt<tungstenite::Message, Error = tungstenite::Error> + Unpin,
{
    let mut sent_close = false;

    loop {
        tokio::select! {
            biased;

            msg = write_rx.recv() => {
                match msg {
                    Some(m) => {
                        let is_close = matches!(m, tungstenite::Message::Close(_));
                        if let Err(e) = write.send(m).await {
                            error!("WebSocket write error: {e}");
                            return;
                        }
                        if is_close {
                            trace!("close frame written");
                            sent_close = true;
                            break;
                        }
                    }
                    None => break,
                }
            }
            _ = cancel.cancelled() => break,
        }
    }

    if !sent_close {
        let _ = write.send(tungstenite::Message::Close(None)).await;
    }
}
