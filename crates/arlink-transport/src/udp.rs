use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;

use tokio::net::UdpSocket;
use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::traits::DatagramSink;

/// Largest payload a single UDP datagram can carry.
pub const MAX_DATAGRAM_SIZE: usize = 65_507;

/// A bound UDP socket that has no remote endpoint yet.
///
/// The device tells us where to send only after the handshake, but it needs
/// our receive port inside the handshake request. Binding happens first, the
/// link is completed with [`UdpEndpoint::into_link`].
#[derive(Debug)]
pub struct UdpEndpoint {
    socket: UdpSocket,
}

impl UdpEndpoint {
    /// Bind to an explicit local address.
    pub async fn bind(addr: SocketAddr) -> Result<Self> {
        let socket = UdpSocket::bind(addr)
            .await
            .map_err(|source| TransportError::Bind { addr, source })?;
        debug!(local = ?socket.local_addr().ok(), "bound udp endpoint");
        Ok(Self { socket })
    }

    /// Bind an ephemeral port on the wildcard address matching the family of
    /// `remote`.
    pub async fn bind_for(remote: IpAddr) -> Result<Self> {
        let wildcard = match remote {
            IpAddr::V4(_) => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            IpAddr::V6(_) => IpAddr::V6(Ipv6Addr::UNSPECIFIED),
        };
        Self::bind(SocketAddr::new(wildcard, 0)).await
    }

    /// Local address the socket is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Local port the device should send to.
    pub fn local_port(&self) -> Result<u16> {
        Ok(self.local_addr()?.port())
    }

    /// Complete the endpoint into a link aimed at `remote`.
    pub fn into_link(self, remote: SocketAddr) -> UdpLink {
        info!(local = ?self.socket.local_addr().ok(), %remote, "udp link established");
        UdpLink {
            socket: Arc::new(self.socket),
            remote,
        }
    }
}

/// A UDP socket paired with the device's data endpoint.
///
/// The socket is deliberately not `connect`ed: devices reply from their own
/// source port, which need not match the port we send to.
#[derive(Debug, Clone)]
pub struct UdpLink {
    socket: Arc<UdpSocket>,
    remote: SocketAddr,
}

impl UdpLink {
    /// Remote data endpoint.
    pub fn remote(&self) -> SocketAddr {
        self.remote
    }

    /// Local address the socket is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Send one datagram to the remote endpoint.
    pub async fn send(&self, datagram: &[u8]) -> Result<()> {
        if datagram.len() > MAX_DATAGRAM_SIZE {
            return Err(TransportError::DatagramTooLarge {
                len: datagram.len(),
                max: MAX_DATAGRAM_SIZE,
            });
        }
        self.socket
            .send_to(datagram, self.remote)
            .await
            .map_err(|source| TransportError::Send {
                addr: self.remote,
                source,
            })?;
        Ok(())
    }

    /// Wait for the next datagram from any source.
    pub async fn recv(&self, buf: &mut [u8]) -> Result<(usize, SocketAddr)> {
        self.socket
            .recv_from(buf)
            .await
            .map_err(TransportError::Receive)
    }

    /// Whether a datagram source belongs to the remote device.
    pub fn is_from_remote(&self, source: &SocketAddr) -> bool {
        source.ip() == self.remote.ip()
    }
}

impl DatagramSink for UdpLink {
    async fn send_datagram(&self, datagram: &[u8]) -> Result<()> {
        self.send(datagram).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOOPBACK: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

    #[tokio::test]
    async fn bind_reports_ephemeral_port() {
        let endpoint = UdpEndpoint::bind_for(LOOPBACK).await.unwrap();
        assert_ne!(endpoint.local_port().unwrap(), 0);
    }

    #[tokio::test]
    async fn link_roundtrip_over_loopback() {
        let device = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let device_addr = device.local_addr().unwrap();

        let endpoint = UdpEndpoint::bind(SocketAddr::new(LOOPBACK, 0)).await.unwrap();
        let local_port = endpoint.local_port().unwrap();
        let link = endpoint.into_link(device_addr);

        link.send(b"ping").await.unwrap();
        let mut buf = [0u8; 16];
        let (n, from) = device.recv_from(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"ping");
        assert_eq!(from.port(), local_port);

        // Reply from a different device port; the link still accepts it.
        let other = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        other.send_to(b"pong", from).await.unwrap();
        let (n, source) = link.recv(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"pong");
        assert!(link.is_from_remote(&source));
    }

    #[tokio::test]
    async fn oversized_datagram_rejected() {
        let endpoint = UdpEndpoint::bind_for(LOOPBACK).await.unwrap();
        let link = endpoint.into_link("127.0.0.1:9".parse().unwrap());
        let payload = vec![0u8; MAX_DATAGRAM_SIZE + 1];
        let err = link.send(&payload).await.unwrap_err();
        assert!(matches!(err, TransportError::DatagramTooLarge { .. }));
    }

    #[tokio::test]
    async fn sink_through_arc() {
        let device = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let endpoint = UdpEndpoint::bind_for(LOOPBACK).await.unwrap();
        let link = Arc::new(endpoint.into_link(device.local_addr().unwrap()));

        link.send_datagram(b"via-arc").await.unwrap();
        let mut buf = [0u8; 16];
        let (n, _) = device.recv_from(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"via-arc");
    }
}
