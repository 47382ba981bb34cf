use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use rentdesk_protocol::Module;

/// The visual category of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Info,
    Warning,
    Error,
}

/// How urgent a notification is. Ordered `Low < Medium < High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        })
    }
}

/// One entry of the notification feed.
///
/// Everything but `read` is fixed at creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// UUID v4.
    pub id: String,
    pub kind: NotificationKind,
    pub module: Module,
    /// Wire type of the event that produced it.
    pub event_type: String,
    pub title: String,
    pub message: String,
    /// The event's `data`, untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    pub timestamp: DateTime<Utc>,
    pub icon: String,
    pub priority: Priority,
    pub sound: bool,
    pub read: bool,
}

/// Unread counts per module plus their sum.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnreadCounters {
    pub bookings: u32,
    pub orders: u32,
    pub quotes: u32,
    pub total: u32,
}

impl UnreadCounters {
    pub fn get(&self, module: Module) -> u32 {
        match module {
            Module::Bookings => self.bookings,
            Module::Orders => self.orders,
            Module::Quotes => self.quotes,
        }
    }

    fn slot(&mut self, module: Module) -> &mut u32 {
        match module {
            Module::Bookings => &mut self.bookings,
            Module::Orders => &mut self.orders,
            Module::Quotes => &mut self.quotes,
        }
    }

    pub(crate) fn increment(&mut self, module: Module) {
        *self.slot(module) += 1;
        self.total += 1;
    }

    /// Decrements the module and the total, each floored at zero.
    pub(crate) fn decrement(&mut self, module: Module) {
        let slot = self.slot(module);
        if *slot > 0 {
            *slot -= 1;
            self.total = self.total.saturating_sub(1);
        }
    }

    /// Zeroes one module and removes its share from the total.
    pub(crate) fn reset(&mut self, module: Module) {
        let count = std::mem::take(self.slot(module));
        self.total = self.total.saturating_sub(count);
    }

    pub(crate) fn clear(&mut self) {
        *self = Self::default();
    }

    /// Sum of the per-module counts; always equal to `total`.
    pub fn module_sum(&self) -> u32 {
        Module::ALL.iter().map(|&m| self.get(m)).sum()
    }
}
