//! Operator controls: stdin lines and SIGHUP.

use std::ops::ControlFlow;

use rentdesk_realtime::Connection;

/// An operator command typed on stdin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedCommand {
    /// Reset the retry budget and open a fresh socket.
    Reconnect,
    /// Log the connection state and subscriptions.
    Status,
    Quit,
}

impl FeedCommand {
    /// Parses one input line. Blank or unrecognised lines are `None`.
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim().to_ascii_lowercase().as_str() {
            "r" | "reconnect" => Some(Self::Reconnect),
            "s" | "status" => Some(Self::Status),
            "q" | "quit" | "exit" => Some(Self::Quit),
            _ => None,
        }
    }
}

/// Carries out a command against the connection.
pub fn apply(command: FeedCommand, conn: &Connection) -> ControlFlow<()> {
    match command {
        FeedCommand::Reconnect => {
            tracing::info!(state = %conn.state(), "manual reconnect requested");
            conn.reconnect();
        }
        FeedCommand::Status => {
            let identity = conn.client_identity();
            tracing::info!(
                state = %conn.state(),
                client_id = ?identity.client_id,
                subscribed = ?conn.subscribed_modules(),
                confirmed = ?conn.confirmed_modules(),
                "status"
            );
        }
        FeedCommand::Quit => return ControlFlow::Break(()),
    }
    ControlFlow::Continue(())
}

/// SIGHUP as a reconnect trigger. Never fires where the signal is
/// unavailable.
pub struct Hangup {
    #[cfg(unix)]
    signal: Option<tokio::signal::unix::Signal>,
}

impl Hangup {
    pub fn new() -> Self {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};
            let signal = match signal(SignalKind::hangup()) {
                Ok(s) => Some(s),
                Err(e) => {
                    tracing::warn!("failed to listen for SIGHUP: {e}");
                    None
                }
            };
            Self { signal }
        }
        #[cfg(not(unix))]
        Self {}
    }

    /// Resolves on the next SIGHUP.
    pub async fn recv(&mut self) {
        #[cfg(unix)]
        if let Some(signal) = self.signal.as_mut() {
            if signal.recv().await.is_some() {
                return;
            }
            self.signal = None;
        }
        std::future::pending::<()>().await
    }
}
