//! Application orchestrator: wires the connection, module adapters and
//! notification feed together.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rentdesk_notifications::NotificationCenter;
use rentdesk_protocol::{BookingEvent, InboundEnvelope, Module, OrderEvent, QuoteEvent};
use rentdesk_realtime::{
    BookingsAdapter, Connection, ConnectionHooks, ConnectionState, OrdersAdapter, QuotesAdapter,
};

use tokio::io::{AsyncBufReadExt, BufReader};

use crate::alerts::TerminalAlerts;
use crate::commands::{self, FeedCommand, Hangup};
use crate::config::Config;

type SharedCenter = Arc<Mutex<NotificationCenter>>;

fn lock(center: &SharedCenter) -> MutexGuard<'_, NotificationCenter> {
    center.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Runs the feed until Ctrl-C or a `quit` command.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let sink = Arc::new(TerminalAlerts::new(config.notifications.desktop));
    let center: SharedCenter = Arc::new(Mutex::new(NotificationCenter::new(
        config.notifications.clone(),
        sink,
    )));
    if config.notifications.desktop && !lock(&center).request_permission() {
        tracing::info!("desktop notifications not permitted");
    }

    // -- Connection --
    let conn = Connection::new(config.realtime.clone())?;
    conn.set_hooks(
        ConnectionHooks::new()
            .on_connected(|identity| {
                tracing::info!(client_type = %identity.client_type, "real-time channel connected");
            })
            .on_disconnected(|close| {
                tracing::warn!(
                    code = close.code,
                    reason = %close.reason,
                    by_client = close.by_client,
                    "real-time channel closed"
                );
            })
            .on_error(|e| tracing::error!("real-time error: {e}")),
    );

    // -- Notification feed --
    let feed = Arc::clone(&center);
    conn.set_observer(move |module, envelope| ingest(&feed, module, envelope));

    // -- Module adapters --
    let adapters = (
        BookingsAdapter::attach(&conn, |event| match event {
            BookingEvent::Created(b) | BookingEvent::StatusUpdated(b) | BookingEvent::Deleted(b) => {
                tracing::debug!(id = ?b.id(), status = ?b.status, "booking event");
            }
        }),
        OrdersAdapter::attach(&conn, |event| match event {
            OrderEvent::Created(o)
            | OrderEvent::StatusUpdated(o)
            | OrderEvent::Updated(o)
            | OrderEvent::Deleted(o) => {
                tracing::debug!(reference = ?o.reference(), status = ?o.status, "order event");
            }
        }),
        QuotesAdapter::attach(&conn, |event| match event {
            QuoteEvent::Created(q)
            | QuoteEvent::StatusUpdated(q)
            | QuoteEvent::Deleted(q)
            | QuoteEvent::ResponseCreated(q) => {
                tracing::debug!(reference = ?q.reference(), status = ?q.status, "quote event");
            }
        }),
    );

    if !config.realtime.auto_connect {
        conn.connect();
    }

    tracing::info!("admin feed ready, commands: r(econnect) s(tatus) q(uit); SIGHUP reconnects");

    // -- Main loop: follow state and operator input until shutdown --
    let mut state_rx = conn.watch_state();
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut hangup = Hangup::new();
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            res = &mut shutdown => {
                if let Err(e) = res {
                    tracing::warn!("failed to listen for Ctrl-C: {e}");
                }
                tracing::info!("SIGINT received, shutting down");
                break;
            }
            _ = hangup.recv() => {
                tracing::info!("SIGHUP received");
                let _ = commands::apply(FeedCommand::Reconnect, &conn);
            }
            line = stdin.next_line(), if stdin_open => match line {
                Ok(Some(line)) => match FeedCommand::parse(&line) {
                    Some(command) => {
                        if commands::apply(command, &conn).is_break() {
                            tracing::info!("quit requested, shutting down");
                            break;
                        }
                    }
                    None if line.trim().is_empty() => {}
                    None => tracing::warn!(input = %line.trim(), "unknown command"),
                },
                Ok(None) => stdin_open = false,
                Err(e) => {
                    tracing::warn!("stdin unreadable, commands disabled: {e}");
                    stdin_open = false;
                }
            },
            changed = state_rx.changed() => {
                if changed.is_err() {
                    tracing::warn!("connection driver stopped");
                    break;
                }
                let state = *state_rx.borrow_and_update();
                tracing::info!(%state, indicator = state.indicator(), "connection state changed");
                if state == ConnectionState::Error {
                    tracing::error!("automatic reconnects exhausted, enter `r` or send SIGHUP to retry");
                }
            }
        }
    }

    // -- Graceful shutdown --
    drop(adapters);
    conn.shutdown();

    let center = lock(&center);
    let unread = center.unread_counts();
    tracing::info!(
        bookings = unread.bookings,
        orders = unread.orders,
        quotes = unread.quotes,
        total = unread.total,
        "unread at shutdown"
    );

    Ok(())
}

fn ingest(center: &SharedCenter, module: Module, envelope: &InboundEnvelope) {
    let mut center = lock(center);
    let Some(id) = center.ingest(envelope) else {
        return;
    };
    if let Some(n) = center.get(&id) {
        tracing::debug!(
            %module,
            priority = %n.priority,
            unread = center.unread_counts().total,
            "{} {}: {}",
            n.icon,
            n.title,
            n.message
        );
    }
}
