//! Error types for socketio-ws-client.

use thiserror::Error;

/// Main error type for all engine and client operations.
#[derive(Debug, Error)]
pub enum SocketIoError {
    /// I/O error on the raw socket.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Handshake could not be completed (unreachable, timeout, non-2xx).
    #[error("Server connection failure: {0}")]
    ServerConnectionFailure(String),

    /// The server does not advertise the requested transport.
    #[error("Unsupported transport: {0}")]
    UnsupportedTransport(String),

    /// The peer answered something the protocol does not allow.
    #[error("Protocol violation: {0}")]
    ProtocolViolation(String),

    /// A WebSocket frame could not be decoded.
    #[error("Frame decode error: {0}")]
    FrameDecode(String),

    /// Caller passed an out-of-range value (e.g. a packet type code).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The engine variant does not implement this operation.
    #[error("{engine} does not support the action \"{action}\"")]
    UnsupportedAction {
        /// Engine name, e.g. `SocketIO Version 0.X`.
        engine: &'static str,
        /// Operation name.
        action: &'static str,
    },

    /// The server URL could not be parsed.
    #[error("Malformed URL: {0}")]
    MalformedUrl(String),

    /// TLS setup or negotiation failed.
    #[error("TLS error: {0}")]
    Tls(String),

    /// The peer closed the connection.
    #[error("Connection closed")]
    ConnectionClosed,
}

impl From<reqwest::Error> for SocketIoError {
    fn from(err: reqwest::Error) -> Self {
        SocketIoError::ServerConnectionFailure(err.to_string())
    }
}

/// Result type alias using SocketIoError.
pub type Result<T> = std::result::Result<T, SocketIoError>;
