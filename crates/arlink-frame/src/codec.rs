use bytes::{BufMut, Bytes, BytesMut};

use crate::channel::ack_channel;
use crate::error::{FrameError, Result};

/// Frame header: kind (1) + channel (1) + sequence (1) + total size (4) = 7 bytes.
pub const HEADER_SIZE: usize = 7;

/// Default maximum payload size: whatever fits in one UDP datagram.
pub const DEFAULT_MAX_PAYLOAD: usize = arlink_transport::MAX_DATAGRAM_SIZE - HEADER_SIZE;

/// Frame kind byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FrameKind {
    /// Acknowledgment of a `DataWithAck` frame.
    Ack = 1,
    /// Unacknowledged data.
    Data = 2,
    /// Unacknowledged data the device treats as latency-sensitive.
    LowLatencyData = 3,
    /// Data the receiver must acknowledge.
    DataWithAck = 4,
}

impl TryFrom<u8> for FrameKind {
    type Error = FrameError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            1 => Ok(Self::Ack),
            2 => Ok(Self::Data),
            3 => Ok(Self::LowLatencyData),
            4 => Ok(Self::DataWithAck),
            other => Err(FrameError::UnknownKind(other)),
        }
    }
}

/// A single frame on a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub kind: FrameKind,
    /// Channel (buffer) ID.
    pub channel: u8,
    /// Per-channel sequence number.
    pub sequence: u8,
    pub payload: Bytes,
}

impl Frame {
    /// Create a new frame.
    pub fn new(kind: FrameKind, channel: u8, sequence: u8, payload: impl Into<Bytes>) -> Self {
        Self {
            kind,
            channel,
            sequence,
            payload: payload.into(),
        }
    }

    /// The total wire size of this frame (header + payload).
    pub fn wire_size(&self) -> usize {
        HEADER_SIZE + self.payload.len()
    }

    /// Encode into a freshly allocated buffer.
    pub fn encode(&self) -> Bytes {
        let mut dst = BytesMut::with_capacity(self.wire_size());
        encode_frame(self, &mut dst);
        dst.freeze()
    }

    /// The acknowledgment answering this frame, before its own sequence is
    /// assigned.
    ///
    /// Acks travel on the channel with bit 0x80 set and carry the
    /// acknowledged sequence as their single payload byte.
    pub fn ack_reply(&self, sequence: u8) -> Frame {
        Frame::new(
            FrameKind::Ack,
            ack_channel(self.channel),
            sequence,
            Bytes::copy_from_slice(&[self.sequence]),
        )
    }
}

/// Encode a frame into the wire format.
///
/// Wire format:
/// ```text
/// ┌──────────┬──────────┬──────────┬──────────────┬─────────────────┐
/// │ Kind     │ Channel  │ Sequence │ Total size   │ Payload         │
/// │ (1B)     │ (1B)     │ (1B)     │ (4B LE)      │ (size - 7)      │
/// └──────────┴──────────┴──────────┴──────────────┴─────────────────┘
/// ```
pub fn encode_frame(frame: &Frame, dst: &mut BytesMut) {
    let size = frame.wire_size();
    dst.reserve(size);
    dst.put_u8(frame.kind as u8);
    dst.put_u8(frame.channel);
    dst.put_u8(frame.sequence);
    // Payloads are bounded by the datagram size long before u32 overflows.
    dst.put_u32_le(size as u32);
    dst.put_slice(&frame.payload);
}

/// Decode one frame from the front of `src`.
///
/// Returns `Ok(None)` if the buffer doesn't hold a complete frame. On
/// success, returns the frame together with the number of bytes it occupied
/// so the caller can continue at `&src[consumed..]`.
pub fn decode_frame(src: &[u8]) -> Result<Option<(Frame, usize)>> {
    if src.len() < HEADER_SIZE {
        return Ok(None);
    }

    let declared = u32::from_le_bytes([src[3], src[4], src[5], src[6]]);
    if (declared as usize) < HEADER_SIZE {
        return Err(FrameError::InvalidSize { declared });
    }

    let total = declared as usize;
    if src.len() < total {
        return Ok(None);
    }

    let kind = FrameKind::try_from(src[0])?;
    let frame = Frame {
        kind,
        channel: src[1],
        sequence: src[2],
        payload: Bytes::copy_from_slice(&src[HEADER_SIZE..total]),
    };
    Ok(Some((frame, total)))
}

/// Configuration for frame encoding.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum payload size in bytes. Default: one datagram minus the header.
    pub max_payload_size: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_payload_size: DEFAULT_MAX_PAYLOAD,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{C2D_COMMAND_WITH_ACK, D2C_COMMAND_WITH_ACK};

    #[test]
    fn test_encode_decode_roundtrip() {
        let frame = Frame::new(FrameKind::DataWithAck, C2D_COMMAND_WITH_ACK, 42, &b"hello"[..]);
        let bytes = frame.encode();

        assert_eq!(bytes.len(), HEADER_SIZE + 5);
        assert_eq!(&bytes[..HEADER_SIZE], &[4, 11, 42, 12, 0, 0, 0]);

        let (decoded, consumed) = decode_frame(&bytes).unwrap().unwrap();
        assert_eq!(decoded, frame);
        assert_eq!(consumed, bytes.len());
    }

    #[test]
    fn test_empty_payload() {
        let frame = Frame::new(FrameKind::Data, 0, 1, Bytes::new());
        let bytes = frame.encode();
        assert_eq!(&bytes[..], &[2, 0, 1, 7, 0, 0, 0]);

        let (decoded, consumed) = decode_frame(&bytes).unwrap().unwrap();
        assert!(decoded.payload.is_empty());
        assert_eq!(consumed, HEADER_SIZE);
    }

    #[test]
    fn test_decode_incomplete_header() {
        assert!(decode_frame(&[2, 10, 1]).unwrap().is_none());
        assert!(decode_frame(&[]).unwrap().is_none());
    }

    #[test]
    fn test_decode_declared_size_exceeds_buffer() {
        let bytes = Frame::new(FrameKind::Data, 10, 1, &b"hello"[..]).encode();
        let result = decode_frame(&bytes[..HEADER_SIZE + 2]).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_decode_size_below_header() {
        let result = decode_frame(&[2, 10, 1, 3, 0, 0, 0]);
        assert!(matches!(
            result,
            Err(FrameError::InvalidSize { declared: 3 })
        ));
    }

    #[test]
    fn test_decode_unknown_kind() {
        let result = decode_frame(&[9, 10, 1, 7, 0, 0, 0]);
        assert!(matches!(result, Err(FrameError::UnknownKind(9))));
    }

    #[test]
    fn test_decode_consumes_only_first_frame() {
        let mut buf = BytesMut::new();
        encode_frame(&Frame::new(FrameKind::Data, 127, 1, &b"first"[..]), &mut buf);
        encode_frame(&Frame::new(FrameKind::Ack, 0xFE, 3, &[9u8][..]), &mut buf);

        let (first, consumed) = decode_frame(&buf).unwrap().unwrap();
        assert_eq!(first.payload.as_ref(), b"first");

        let (second, rest) = decode_frame(&buf[consumed..]).unwrap().unwrap();
        assert_eq!(second.kind, FrameKind::Ack);
        assert_eq!(consumed + rest, buf.len());
    }

    #[test]
    fn test_ack_reply() {
        let inbound = Frame::new(FrameKind::DataWithAck, D2C_COMMAND_WITH_ACK, 77, &b"x"[..]);
        let ack = inbound.ack_reply(5);
        assert_eq!(ack.kind, FrameKind::Ack);
        assert_eq!(ack.channel, 0xFE);
        assert_eq!(ack.sequence, 5);
        assert_eq!(ack.payload.as_ref(), &[77]);
    }

    #[test]
    fn test_kind_conversion() {
        assert_eq!(FrameKind::try_from(3).unwrap(), FrameKind::LowLatencyData);
        assert!(FrameKind::try_from(0).is_err());
    }
}
