use std::sync::atomic::{AtomicU8, Ordering};

/// Per-channel sequence counters for one session.
///
/// Each of the 256 channels counts independently and wraps 255 → 0.
#[derive(Debug)]
pub struct SequenceAllocator {
    counters: [AtomicU8; 256],
}

impl SequenceAllocator {
    pub fn new() -> Self {
        Self {
            counters: std::array::from_fn(|_| AtomicU8::new(0)),
        }
    }

    /// Allocate the next sequence number for `channel`.
    ///
    /// The first call for a channel returns 1.
    pub fn next(&self, channel: u8) -> u8 {
        self.counters[channel as usize]
            .fetch_add(1, Ordering::Relaxed)
            .wrapping_add(1)
    }

    /// Last sequence number handed out on `channel` (0 if none yet).
    pub fn current(&self, channel: u8) -> u8 {
        self.counters[channel as usize].load(Ordering::Relaxed)
    }
}

impl Default for SequenceAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn first_is_one() {
        let seq = SequenceAllocator::new();
        assert_eq!(seq.next(10), 1);
        assert_eq!(seq.next(10), 2);
        assert_eq!(seq.current(10), 2);
    }

    #[test]
    fn wraps_through_zero() {
        let seq = SequenceAllocator::new();
        let values: Vec<u8> = (0..258).map(|_| seq.next(11)).collect();
        assert_eq!(values[0], 1);
        assert_eq!(values[254], 255);
        assert_eq!(values[255], 0);
        assert_eq!(values[256], 1);
        assert_eq!(values[257], 2);
    }

    #[test]
    fn channels_are_independent() {
        let seq = SequenceAllocator::new();
        seq.next(10);
        seq.next(10);
        assert_eq!(seq.next(11), 1);
        assert_eq!(seq.next(0x8B), 1);
        assert_eq!(seq.next(10), 3);
    }

    #[test]
    fn concurrent_allocation_is_unique() {
        let seq = Arc::new(SequenceAllocator::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let seq = Arc::clone(&seq);
                std::thread::spawn(move || (0..50).map(|_| seq.next(12)).collect::<Vec<_>>())
            })
            .collect();

        let mut all: Vec<u8> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len(), 200);
    }
}
