use serde::{Deserialize, Serialize};

use crate::constants::{MessageType, Module};

/// Parsed shape of one inbound WebSocket frame.
///
/// The `type` field is kept as the raw wire string so that unknown event
/// types can still be logged by name. Unknown extra fields are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundEnvelope {
    #[serde(rename = "type")]
    pub msg_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl InboundEnvelope {
    /// Parses a text frame.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Creates a domain event envelope. Mostly useful for tests and replay.
    pub fn event(msg_type: MessageType, data: serde_json::Value) -> Self {
        Self {
            msg_type: msg_type.as_str().to_string(),
            module: msg_type.module().map(|m| m.as_str().to_string()),
            data: Some(data),
            client_id: None,
            message: None,
        }
    }

    /// The typed message type. Unrecognized names map to [`MessageType::Unknown`].
    pub fn message_type(&self) -> MessageType {
        MessageType::from_wire(&self.msg_type)
    }

    /// The `module` field parsed as a [`Module`], if present and known.
    pub fn declared_module(&self) -> Option<Module> {
        self.module.as_deref().and_then(|m| m.parse().ok())
    }

    /// Deserializes `data` into the given type.
    pub fn parse_data<T: for<'de> Deserialize<'de>>(&self) -> Result<Option<T>, serde_json::Error> {
        match &self.data {
            Some(value) => Ok(Some(T::deserialize(value)?)),
            None => Ok(None),
        }
    }
}
