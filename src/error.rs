use thiserror::Error;

/// Errors that can occur on the control channel
#[derive(Error, Debug)]
pub enum Error {
    /// No matching reply arrived within the configured window
    #[error("request timed out")]
    Timeout,

    /// Channel is closed or the client has already disconnected
    #[error("connection closed")]
    ConnectionClosed,

    /// Transport-level failure outside the WebSocket layer
    #[error("transport error: {0}")]
    Transport(String),

    /// WebSocket connection or protocol error
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// JSON serialization or deserialization failed
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The remote side replied with an application-level error
    #[error("remote error: {0}")]
    Remote(String),

    /// Reply arrived but its structure is not a recognized response shape
    #[error("invalid response format")]
    InvalidResponse,
}

/// Result type alias for control-channel operations
pub type Result<T> = std::result::Result<T, Error>;
