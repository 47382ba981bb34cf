use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{CLIENT_TYPE_ADMIN, Module};

/// Client-to-server frames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    /// Announces the client kind right after the socket opens.
    Identify {
        #[serde(rename = "clientType")]
        client_type: String,
        timestamp: DateTime<Utc>,
    },
    /// Requests events for one module.
    Subscribe { module: Module },
    /// Stops events for one module.
    Unsubscribe { module: Module },
    /// Application-level heartbeat.
    Ping,
}

impl ClientFrame {
    /// `identify` frame for the admin dashboard, stamped with the current time.
    pub fn identify_admin() -> Self {
        ClientFrame::Identify {
            client_type: CLIENT_TYPE_ADMIN.to_string(),
            timestamp: Utc::now(),
        }
    }

    /// Serializes the frame to its JSON text form.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
