//! Error types for the cursor synchronization engine.
//!
//! None of these escape the sync core to the host: the connection manager and
//! session absorb them into state transitions and log lines. They exist so the
//! individual layers can report what went wrong with enough detail to log.

use thiserror::Error;

/// Errors produced while encoding or decoding wire frames.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The frame was not valid JSON, or a known message shape had bad fields
    #[error("malformed frame: {0}")]
    Malformed(#[source] serde_json::Error),
    /// The frame is a JSON object without a string `type` tag
    #[error("frame has no type tag")]
    MissingType,
    /// The `type` tag names a message this client does not understand
    #[error("unrecognized message type '{0}'")]
    UnknownType(String),
    /// A cursor marked visible arrived without both coordinates
    #[error("visible cursor '{0}' has no position")]
    MissingPosition(String),
    /// Serializing an outbound message failed
    #[error("failed to encode frame: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Errors raised by a transport while opening or using a connection.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid connection request: {0}")]
    InvalidRequest(String),
    #[error("connection is closed")]
    Closed,
    #[error("no async runtime available to drive the connection")]
    NoRuntime,
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}

/// Errors loading client configuration from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} environment variable is not set")]
    Missing(&'static str),
    #[error("invalid value '{value}' for {key}")]
    Invalid { key: &'static str, value: String },
}
