use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::history::DEFAULT_HISTORY_LIMIT;

/// Notification feed settings. Every field has a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Most recent notifications kept.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// A repeat of the same event type for the same entity within this
    /// window is dropped. Zero disables deduplication.
    #[serde(default = "default_dedupe_window_ms")]
    pub dedupe_window_ms: u64,

    /// Play a sound for high-priority notifications.
    #[serde(default = "default_true")]
    pub sound: bool,

    /// Raise desktop notifications when permitted.
    #[serde(default = "default_true")]
    pub desktop: bool,
}

fn default_history_limit() -> usize {
    DEFAULT_HISTORY_LIMIT
}

fn default_dedupe_window_ms() -> u64 {
    5000
}

fn default_true() -> bool {
    true
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
            dedupe_window_ms: default_dedupe_window_ms(),
            sound: true,
            desktop: true,
        }
    }
}

impl NotificationConfig {
    pub fn dedupe_window(&self) -> Duration {
        Duration::from_millis(self.dedupe_window_ms)
    }
}
