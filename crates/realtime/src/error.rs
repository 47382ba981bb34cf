use tokio_tungstenite::tungstenite;

/// Errors surfaced by the real-time connection.
#[derive(Debug, thiserror::Error)]
pub enum RealtimeError {
    #[error("WebSocket error: {0}")]
    Ws(#[from] tungstenite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid base URL: {0}")]
    InvalidUrl(String),

    #[error("malformed frame: {0}")]
    Protocol(String),

    #[error("server error: {0}")]
    Server(String),

    #[error("gave up reconnecting after {attempts} attempts")]
    RetriesExhausted { attempts: u32 },

    #[error("outbound queue full, frame dropped")]
    QueueFull,

    #[error("connection closed")]
    Closed,
}
