use tracing::debug;

use crate::codec::{decode_frame, Frame};
use crate::error::FrameError;

/// Iterator over every frame packed into one datagram.
///
/// Iteration stops at the first frame that is incomplete or malformed. The
/// remaining bytes are skipped: the cursor moves to the end of the datagram
/// and [`DatagramFrames::skipped`] reports how many bytes were dropped.
pub struct DatagramFrames<'a> {
    buf: &'a [u8],
    offset: usize,
    skipped: usize,
    error: Option<FrameError>,
}

impl<'a> DatagramFrames<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            offset: 0,
            skipped: 0,
            error: None,
        }
    }

    /// Cursor position within the datagram.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Trailing bytes dropped because they did not form a valid frame.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// The decode error that ended iteration, if any.
    pub fn take_error(&mut self) -> Option<FrameError> {
        self.error.take()
    }

    fn skip_rest(&mut self) {
        self.skipped = self.buf.len() - self.offset;
        self.offset = self.buf.len();
    }
}

impl Iterator for DatagramFrames<'_> {
    type Item = Frame;

    fn next(&mut self) -> Option<Frame> {
        if self.offset >= self.buf.len() {
            return None;
        }
        match decode_frame(&self.buf[self.offset..]) {
            Ok(Some((frame, consumed))) => {
                self.offset += consumed;
                Some(frame)
            }
            Ok(None) => {
                debug!(
                    offset = self.offset,
                    remaining = self.buf.len() - self.offset,
                    "incomplete frame at end of datagram"
                );
                self.skip_rest();
                None
            }
            Err(err) => {
                debug!(offset = self.offset, error = %err, "malformed frame");
                self.skip_rest();
                self.error = Some(err);
                None
            }
        }
    }
}
