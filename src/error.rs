//! Error types for the policy client.

use thiserror::Error;

/// Policy client error type.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid endpoint or client configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Server refused the TCP connection (retried while waiting for the server)
    #[error("Connection refused by {0}")]
    ConnectionRefused(String),

    /// WebSocket protocol or transport failure
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Metadata handshake failed
    #[error("Handshake failed: {0}")]
    Handshake(String),

    /// Peer closed the connection while a frame was expected
    #[error("Connection closed by server")]
    ConnectionClosed,

    /// The inference server replied with a textual error frame
    #[error("Error in inference server:\n{0}")]
    Server(String),

    /// Payload could not be encoded or decoded
    #[error("Codec error: {0}")]
    Codec(String),

    /// MessagePack encode error
    #[error("MessagePack encode error: {0}")]
    MsgpackEncode(#[from] rmpv::encode::Error),

    /// MessagePack decode error
    #[error("MessagePack decode error: {0}")]
    MsgpackDecode(#[from] rmpv::decode::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP transport error on the fallback path
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Caller-imposed deadline elapsed
    #[error("Request timeout")]
    Timeout,

    /// Blocking task panicked or was cancelled
    #[error("Task join error: {0}")]
    TaskJoin(String),

    /// Policy mutex was poisoned by a panicking call
    #[error("Policy lock poisoned")]
    LockPoisoned,
}

/// Result type alias for policy client operations.
pub type Result<T> = std::result::Result<T, Error>;
