use std::net::SocketAddr;
use std::time::Duration;

/// Errors that can occur in session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] arlink_transport::TransportError),

    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] arlink_frame::FrameError),

    /// Command encoding or decoding error.
    #[error("command error: {0}")]
    Command(#[from] arlink_command::CommandError),

    /// Could not reach the device's control port.
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: SocketAddr,
        source: std::io::Error,
    },

    /// Handshake failed.
    #[error("handshake failed: {0}")]
    HandshakeFailed(String),

    /// The device rejected the connection.
    #[error("device refused connection with status {0}")]
    HandshakeStatus(i32),

    /// JSON serialization/deserialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Handshake timed out.
    #[error("handshake timed out after {0:?}")]
    Timeout(Duration),

    /// Session configuration is unusable.
    #[error("invalid session config: {0}")]
    InvalidConfig(String),

    /// The session has been closed.
    #[error("session closed")]
    Closed,
}

pub type Result<T> = std::result::Result<T, SessionError>;
