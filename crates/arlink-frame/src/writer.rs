use bytes::{Bytes, BytesMut};
use tracing::trace;

use arlink_transport::DatagramSink;

use crate::channel::channel_name;
use crate::codec::{encode_frame, Frame, FrameConfig, FrameKind};
use crate::error::{FrameError, Result};
use crate::sequence::SequenceAllocator;

/// Encodes frames with freshly allocated sequence numbers and writes each
/// one as a datagram to a [`DatagramSink`].
///
/// The writer owns the session's [`SequenceAllocator`], so every outbound
/// frame, acks included, is numbered in one place.
#[derive(Debug)]
pub struct FrameWriter<S> {
    sink: S,
    sequences: SequenceAllocator,
    config: FrameConfig,
}

impl<S: DatagramSink> FrameWriter<S> {
    /// Create a new frame writer with default configuration.
    pub fn new(sink: S) -> Self {
        Self::with_config(sink, FrameConfig::default())
    }

    /// Create a new frame writer with explicit configuration.
    pub fn with_config(sink: S, config: FrameConfig) -> Self {
        Self {
            sink,
            sequences: SequenceAllocator::new(),
            config,
        }
    }

    /// Allocate a sequence and encode a frame without sending it.
    ///
    /// Returns the frame header fields alongside the encoded bytes so the
    /// caller can track and retransmit the exact same datagram.
    pub fn prepare(&self, kind: FrameKind, channel: u8, payload: &[u8]) -> Result<(Frame, Bytes)> {
        if payload.len() > self.config.max_payload_size {
            return Err(FrameError::PayloadTooLarge {
                size: payload.len(),
                max: self.config.max_payload_size,
            });
        }
        let sequence = self.sequences.next(channel);
        let frame = Frame::new(kind, channel, sequence, Bytes::copy_from_slice(payload));
        let mut buf = BytesMut::with_capacity(frame.wire_size());
        encode_frame(&frame, &mut buf);
        Ok((frame, buf.freeze()))
    }

    /// Send an already encoded frame.
    pub async fn send_encoded(&self, encoded: &[u8]) -> Result<()> {
        self.sink.send_datagram(encoded).await?;
        Ok(())
    }

    /// Encode and send a payload on a channel; returns the sequence used.
    pub async fn send(&self, kind: FrameKind, channel: u8, payload: &[u8]) -> Result<u8> {
        let (frame, encoded) = self.prepare(kind, channel, payload)?;
        trace!(
            channel = channel_name(channel),
            sequence = frame.sequence,
            len = payload.len(),
            "sending frame"
        );
        self.send_encoded(&encoded).await?;
        Ok(frame.sequence)
    }

    /// Send a frame whose sequence was assigned elsewhere.
    pub async fn write_frame(&self, frame: &Frame) -> Result<()> {
        if frame.payload.len() > self.config.max_payload_size {
            return Err(FrameError::PayloadTooLarge {
                size: frame.payload.len(),
                max: self.config.max_payload_size,
            });
        }
        self.send_encoded(&frame.encode()).await
    }

    /// Borrow the underlying sink.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// The sequence counters used for outbound frames.
    pub fn sequences(&self) -> &SequenceAllocator {
        &self.sequences
    }

    /// Current frame writer configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}
