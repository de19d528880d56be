//! Acknowledged delivery over the unreliable link.
//!
//! A `DataWithAck` frame is retransmitted unchanged until the device answers
//! with an `Ack` on the channel's 0x80 counterpart carrying the frame's
//! sequence, or the retry budget runs out.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use arlink_frame::{channel_name, data_channel, is_ack_channel, Frame, FrameError, FrameKind, FrameWriter};
use arlink_transport::DatagramSink;

/// Retransmission policy for acknowledged sends.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total transmissions, the first one included.
    pub max_attempts: u32,
    /// How long to wait for an ack after each transmission.
    pub ack_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            ack_timeout: Duration::from_millis(500),
        }
    }
}

type AckKey = (u8, u8);

#[derive(Debug)]
struct Waiter {
    /// Distinguishes a reused (channel, sequence) from the entry it replaced.
    generation: u64,
    tx: oneshot::Sender<()>,
}

/// Table of sends waiting for an acknowledgment, keyed by
/// (data channel, sequence).
#[derive(Debug, Default)]
pub struct AckTracker {
    pending: Mutex<HashMap<AckKey, Waiter>>,
    generations: AtomicU64,
}

impl AckTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start waiting for the ack of `sequence` on `channel`.
    ///
    /// The entry is removed when the returned guard is dropped.
    pub fn track(&self, channel: u8, sequence: u8) -> PendingAck<'_> {
        let (tx, rx) = oneshot::channel();
        let key = (channel, sequence);
        let generation = self.generations.fetch_add(1, Ordering::Relaxed);
        if self.lock().insert(key, Waiter { generation, tx }).is_some() {
            debug!(
                channel = channel_name(channel),
                sequence, "replaced stale pending ack"
            );
        }
        PendingAck {
            tracker: self,
            key,
            generation,
            rx,
        }
    }

    /// Resolve the pending send acknowledged by `frame`.
    ///
    /// Returns false for anything that is not a well-formed ack of a tracked
    /// send; duplicates and late acks land here.
    pub fn resolve(&self, frame: &Frame) -> bool {
        if frame.kind != FrameKind::Ack
            || !is_ack_channel(frame.channel)
            || frame.payload.len() != 1
        {
            return false;
        }
        let key = (data_channel(frame.channel), frame.payload[0]);
        match self.lock().remove(&key) {
            Some(waiter) => {
                trace!(channel = key.0, sequence = key.1, "ack received");
                // The waiter may have given up already.
                let _ = waiter.tx.send(());
                true
            }
            None => {
                trace!(channel = key.0, sequence = key.1, "ignoring unmatched ack");
                false
            }
        }
    }

    /// Number of sends currently waiting.
    pub fn pending(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<AckKey, Waiter>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A tracked send; dropping it removes the tracker entry if the entry is
/// still its own.
#[derive(Debug)]
pub struct PendingAck<'a> {
    tracker: &'a AckTracker,
    key: AckKey,
    generation: u64,
    rx: oneshot::Receiver<()>,
}

impl Drop for PendingAck<'_> {
    fn drop(&mut self) {
        let mut pending = self.tracker.lock();
        if pending
            .get(&self.key)
            .is_some_and(|waiter| waiter.generation == self.generation)
        {
            pending.remove(&self.key);
        }
    }
}

/// Sends frames that must be acknowledged.
#[derive(Debug)]
pub struct ReliableSender<'a, S> {
    writer: &'a FrameWriter<S>,
    tracker: &'a AckTracker,
    policy: &'a RetryPolicy,
}

impl<'a, S: DatagramSink> ReliableSender<'a, S> {
    pub fn new(writer: &'a FrameWriter<S>, tracker: &'a AckTracker, policy: &'a RetryPolicy) -> Self {
        Self {
            writer,
            tracker,
            policy,
        }
    }

    /// Send `payload` on `channel` and wait for its acknowledgment.
    ///
    /// Returns `Ok(true)` once acknowledged and `Ok(false)` when the retry
    /// budget is exhausted or `cancel` fires. Transient socket errors count
    /// as a lost transmission; other send errors are returned.
    pub async fn send(
        &self,
        channel: u8,
        payload: &[u8],
        cancel: &CancellationToken,
    ) -> Result<bool, FrameError> {
        let (frame, encoded) = self
            .writer
            .prepare(FrameKind::DataWithAck, channel, payload)?;
        let mut pending = self.tracker.track(channel, frame.sequence);

        for attempt in 1..=self.policy.max_attempts {
            trace!(
                channel = channel_name(channel),
                sequence = frame.sequence,
                attempt,
                "sending acknowledged frame"
            );
            match self.writer.send_encoded(&encoded).await {
                Ok(()) => {}
                Err(FrameError::Transport(err)) if err.is_transient() => {
                    debug!(error = %err, attempt, "transient send failure");
                }
                Err(err) => return Err(err),
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(false),
                acked = &mut pending.rx => return Ok(acked.is_ok()),
                _ = tokio::time::sleep(self.policy.ack_timeout) => {}
            }
        }

        warn!(
            channel = channel_name(channel),
            sequence = frame.sequence,
            attempts = self.policy.max_attempts,
            "no acknowledgment, giving up"
        );
        Ok(false)
    }
}
