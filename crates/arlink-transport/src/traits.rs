use std::future::Future;
use std::sync::Arc;

use crate::error::Result;

/// Something that can put one datagram on the wire.
///
/// Each call is treated as atomic: concurrent writers (heartbeat, acks,
/// reliable sends) may interleave calls without extra locking.
pub trait DatagramSink: Send + Sync {
    /// Send a single datagram to the remote endpoint.
    fn send_datagram(&self, datagram: &[u8]) -> impl Future<Output = Result<()>> + Send;
}

impl<T: DatagramSink> DatagramSink for Arc<T> {
    fn send_datagram(&self, datagram: &[u8]) -> impl Future<Output = Result<()>> + Send {
        (**self).send_datagram(datagram)
    }
}
