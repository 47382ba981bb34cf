//! Notification feed for the rentdesk admin dashboard.
//!
//! [`NotificationCenter`] turns routed domain events into a bounded,
//! deduplicated, unread-counted history and raises sounds and desktop
//! notifications through an [`AlertSink`].

pub mod alerts;
pub mod center;
pub mod config;
pub mod history;
pub mod templates;
pub mod types;

pub use alerts::{AlertError, AlertSink, DesktopAlert, NoopAlerts, Permission, RecordingAlerts};
pub use center::NotificationCenter;
pub use config::NotificationConfig;
pub use history::NotificationHistory;
pub use types::{Notification, NotificationKind, Priority, UnreadCounters};
