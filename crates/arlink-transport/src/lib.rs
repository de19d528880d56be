//! UDP datagram transport for the arlink device protocol.
//!
//! This is the lowest layer of arlink. A session binds a [`UdpEndpoint`] on an
//! ephemeral port, advertises that port during the handshake, and then turns
//! it into a [`UdpLink`] aimed at the device's data port.
//!
//! Everything above this layer writes through the [`DatagramSink`] trait so
//! that retry and framing logic can be exercised without a socket.

pub mod error;
pub mod traits;
pub mod udp;

pub use error::{Result, TransportError};
pub use traits::DatagramSink;
pub use udp::{UdpEndpoint, UdpLink, MAX_DATAGRAM_SIZE};
