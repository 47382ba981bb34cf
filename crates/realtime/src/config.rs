//! Connection configuration.
//!
//! All fields have defaults so a partial TOML table deserializes cleanly.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::RealtimeError;
use crate::reconnection::ReconnectPolicy;

/// Configuration for a [`Connection`](crate::Connection).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// API base URL (`http://` or `https://`); upgraded to `ws://`/`wss://`.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Path of the WebSocket endpoint appended to the base URL.
    #[serde(default = "default_ws_path")]
    pub ws_path: String,

    /// Maximum automatic reconnect attempts before giving up.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Base reconnect interval; attempt `n` waits `n` times this long.
    #[serde(default = "default_base_interval_ms")]
    pub base_interval_ms: u64,

    /// Interval between application-level `ping` frames.
    #[serde(default = "default_heartbeat_ms")]
    pub heartbeat_ms: u64,

    /// Delay between the forced disconnect and the new socket on a manual reconnect.
    #[serde(default = "default_manual_reconnect_delay_ms")]
    pub manual_reconnect_delay_ms: u64,

    /// Close the socket as dead if nothing arrives for this long. Off when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pong_timeout_ms: Option<u64>,

    /// Open the socket on the first declared interest and close it when the
    /// last interest is withdrawn.
    #[serde(default)]
    pub auto_connect: bool,
}

fn default_base_url() -> String {
    "http://localhost:5000".into()
}

fn default_ws_path() -> String {
    "/ws".into()
}

fn default_max_attempts() -> u32 {
    5
}

fn default_base_interval_ms() -> u64 {
    3000
}

fn default_heartbeat_ms() -> u64 {
    rentdesk_protocol::constants::WS_PING_PERIOD.as_millis() as u64
}

fn default_manual_reconnect_delay_ms() -> u64 {
    1000
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            ws_path: default_ws_path(),
            max_attempts: default_max_attempts(),
            base_interval_ms: default_base_interval_ms(),
            heartbeat_ms: default_heartbeat_ms(),
            manual_reconnect_delay_ms: default_manual_reconnect_delay_ms(),
            pong_timeout_ms: None,
            auto_connect: false,
        }
    }
}

impl RealtimeConfig {
    /// Config for the given base URL with every other field defaulted.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Derives the WebSocket URL from the base URL and path.
    pub fn websocket_url(&self) -> Result<String, RealtimeError> {
        let base = self.base_url.trim().trim_end_matches('/');
        let (scheme, rest) = if let Some(rest) = base.strip_prefix("https://") {
            ("wss://", rest)
        } else if let Some(rest) = base.strip_prefix("http://") {
            ("ws://", rest)
        } else if let Some(rest) = base.strip_prefix("wss://") {
            ("wss://", rest)
        } else if let Some(rest) = base.strip_prefix("ws://") {
            ("ws://", rest)
        } else {
            return Err(RealtimeError::InvalidUrl(self.base_url.clone()));
        };

        if rest.is_empty() || rest.starts_with('/') {
            return Err(RealtimeError::InvalidUrl(self.base_url.clone()));
        }

        let path = self.ws_path.trim();
        if path.is_empty() {
            Ok(format!("{scheme}{rest}"))
        } else if path.starts_with('/') {
            Ok(format!("{scheme}{rest}{path}"))
        } else {
            Ok(format!("{scheme}{rest}/{path}"))
        }
    }

    /// The retry policy described by this config.
    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        ReconnectPolicy {
            max_attempts: self.max_attempts,
            base_interval: Duration::from_millis(self.base_interval_ms),
        }
    }

    pub fn heartbeat(&self) -> Duration {
        Duration::from_millis(self.heartbeat_ms)
    }

    pub fn manual_reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.manual_reconnect_delay_ms)
    }

    pub fn pong_timeout(&self) -> Option<Duration> {
        self.pong_timeout_ms.map(Duration::from_millis)
    }
}
