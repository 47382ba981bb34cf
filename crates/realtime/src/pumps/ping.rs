//! Heartbeat pump: periodic application-level `ping` frames.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite;
use tokio_util::sync::CancellationToken;
use tracing::{trace, warn};

use rentdesk_protocol::ClientFrame;

/// Sends `{"type":"ping"}` every `period` while the socket is open. A zero
/// period disables the heartbeat.
pub(crate) async fn ping_pump(
    period: Duration,
    write_tx: mpsc::Sender<tungstenite::Message>,
    cancel: CancellationToken,
) {
    if period.is_zero() {
        return;
    }

    let json = match ClientFrame::Ping.to_json() {
        Ok(json) => json,
        Err(e) => {
            warn!("failed to encode heartbeat: {e}");
            return;
        }
    };

    let mut interval = tokio::time::interval(period);
    interval.tick().await; // Skip immediate first tick.

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {
                trace!("sending heartbeat");
                let ping = tungstenite::Message::Text(json.clone().into());
                if write_tx.send(ping).await.is_err() {
                    break;
                }
            }
        }
    }
}
