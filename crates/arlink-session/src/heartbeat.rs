//! Round-trip-time measurement.
//!
//! Pings carry an 8-byte little-endian timestamp: nanoseconds since the
//! session's epoch. The device echoes the payload unchanged on the pong
//! channel, so the round trip is the difference to the current clock.

use std::time::{Duration, Instant};

/// Size of a ping payload.
pub const PING_SIZE: usize = 8;

/// Monotonic clock shared by the ping sender and the pong handler.
#[derive(Debug, Clone, Copy)]
pub struct HeartbeatClock {
    epoch: Instant,
}

impl HeartbeatClock {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }

    /// Nanoseconds since the clock was created.
    pub fn timestamp(&self) -> u64 {
        u64::try_from(self.epoch.elapsed().as_nanos()).unwrap_or(u64::MAX)
    }

    /// Ping payload for the current instant.
    pub fn ping_payload(&self) -> [u8; PING_SIZE] {
        self.timestamp().to_le_bytes()
    }

    /// Round trip for an echoed ping payload.
    ///
    /// Returns `None` for payloads too short to hold a timestamp or carrying
    /// a timestamp from the future, which is what a pong from another
    /// session looks like.
    pub fn round_trip(&self, payload: &[u8]) -> Option<Duration> {
        let sent = u64::from_le_bytes(*payload.first_chunk::<PING_SIZE>()?);
        self.timestamp().checked_sub(sent).map(Duration::from_nanos)
    }
}

impl Default for HeartbeatClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether heartbeat tick `tick` (counting from 0) also requests a full
/// settings and state refresh.
pub fn is_resync_tick(tick: u64, resync_every: u32) -> bool {
    resync_every != 0 && tick % u64::from(resync_every) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn echoed_ping_measures_elapsed_time() {
        let clock = HeartbeatClock::new();
        let ping = clock.ping_payload();
        std::thread::sleep(Duration::from_millis(5));

        let rtt = clock.round_trip(&ping).unwrap();
        assert!(rtt >= Duration::from_millis(5));
        assert!(rtt < Duration::from_secs(5));
    }

    #[test]
    fn future_timestamp_is_ignored() {
        let clock = HeartbeatClock::new();
        let future = (clock.timestamp() + 60_000_000_000).to_le_bytes();
        assert_eq!(clock.round_trip(&future), None);
    }

    #[test]
    fn short_payload_is_ignored() {
        let clock = HeartbeatClock::new();
        assert_eq!(clock.round_trip(&[1, 2, 3]), None);
    }

    #[test]
    fn resync_schedule() {
        let ticks: Vec<u64> = (0..25).filter(|&t| is_resync_tick(t, 10)).collect();
        assert_eq!(ticks, vec![0, 10, 20]);
        assert!(!is_resync_tick(0, 0));
        assert!(is_resync_tick(7, 1));
    }
}
