/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The frame header carries a kind byte outside the known set.
    #[error("unknown frame kind {0:#04x}")]
    UnknownKind(u8),

    /// The declared frame size is smaller than the header itself.
    #[error("invalid frame size {declared} (header alone is 7 bytes)")]
    InvalidSize { declared: u32 },

    /// The payload exceeds the configured maximum size.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// Sending the encoded frame failed.
    #[error("frame transport error: {0}")]
    Transport(#[from] arlink_transport::TransportError),
}

pub type Result<T> = std::result::Result<T, FrameError>;
