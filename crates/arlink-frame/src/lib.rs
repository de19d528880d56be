//! Frame codec with per-channel sequencing for the arlink device protocol.
//!
//! Every packet on the wire is one or more frames, each with a 7-byte header:
//! - 1 byte frame kind (ack, data, low-latency data, data-with-ack)
//! - 1 byte channel (bit 0x80 marks the acknowledgment counterpart)
//! - 1 byte sequence number, wrapping per channel
//! - 4-byte little-endian total frame size (header included)
//!
//! Several frames may be packed into a single datagram; [`DatagramFrames`]
//! walks them in order.

pub mod channel;
pub mod codec;
pub mod error;
pub mod reader;
pub mod sequence;
pub mod writer;

pub use channel::{
    ack_channel, channel_name, data_channel, is_ack_channel, is_command_channel, ACK_FLAG,
    C2D_COMMAND, C2D_COMMAND_WITH_ACK, C2D_EMERGENCY, C2D_STREAM_ACK, D2C_COMMAND,
    D2C_COMMAND_WITH_ACK, D2C_STREAM, PING, PONG,
};
pub use codec::{
    decode_frame, encode_frame, Frame, FrameConfig, FrameKind, DEFAULT_MAX_PAYLOAD, HEADER_SIZE,
};
pub use error::{FrameError, Result};
pub use reader::DatagramFrames;
pub use sequence::SequenceAllocator;
pub use writer::FrameWriter;
