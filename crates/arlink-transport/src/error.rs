use std::io::ErrorKind;
use std::net::SocketAddr;

/// Errors that can occur in datagram transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to bind the local socket.
    #[error("failed to bind to {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },

    /// Failed to send a datagram to the remote endpoint.
    #[error("failed to send to {addr}: {source}")]
    Send {
        addr: SocketAddr,
        source: std::io::Error,
    },

    /// Failed to receive a datagram.
    #[error("failed to receive datagram: {0}")]
    Receive(std::io::Error),

    /// An I/O error occurred on the socket.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The datagram does not fit in a single UDP packet.
    #[error("datagram too large ({len} bytes, max {max})")]
    DatagramTooLarge { len: usize, max: usize },
}

impl TransportError {
    /// Whether the error leaves the socket usable.
    ///
    /// ICMP-driven errors such as `ConnectionRefused` surface on UDP sockets
    /// when the device is briefly unreachable; the socket itself is fine.
    pub fn is_transient(&self) -> bool {
        let source = match self {
            TransportError::Send { source, .. } => source,
            TransportError::Receive(source) | TransportError::Io(source) => source,
            TransportError::Bind { .. } | TransportError::DatagramTooLarge { .. } => return false,
        };
        matches!(
            source.kind(),
            ErrorKind::ConnectionRefused
                | ErrorKind::ConnectionReset
                | ErrorKind::Interrupted
                | ErrorKind::WouldBlock
                | ErrorKind::TimedOut
        )
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;
