//! TCP/JSON connection negotiation.
//!
//! Before any UDP traffic the controller opens a TCP connection to the
//! device's advertised port and announces the UDP port it listens on. The
//! device answers with a status and the UDP port it listens on in turn.

use std::net::SocketAddr;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, info};

use crate::error::{Result, SessionError};

const READ_CHUNK_SIZE: usize = 512;

/// Request sent by the controller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HandshakeRequest {
    pub controller_name: String,
    pub controller_type: String,
    /// UDP port the controller receives on.
    pub d2c_port: u16,
}

/// Response sent by the device.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct HandshakeResponse {
    /// 0 on success.
    pub status: i32,
    /// UDP port the device receives on. Required when `status` is 0.
    #[serde(default)]
    pub c2d_port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub c2d_update_port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub c2d_user_port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arstream_fragment_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arstream_fragment_maximum_number: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arstream_max_ack_interval: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skycontroller_version: Option<String>,
}

/// Result of a successful handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakeResult {
    /// Device endpoint all UDP traffic is sent to.
    pub data_addr: SocketAddr,
    /// Local UDP port announced to the device.
    pub d2c_port: u16,
    /// Full device response.
    pub response: HandshakeResponse,
}

/// Configuration for handshake negotiation.
#[derive(Debug, Clone)]
pub struct HandshakeConfig {
    /// Name the controller announces itself with.
    pub controller_name: String,
    pub controller_type: String,
    /// Bound on the whole exchange, connect included.
    pub timeout: Duration,
    /// Maximum response size in bytes.
    pub max_response_size: usize,
}

impl Default for HandshakeConfig {
    fn default() -> Self {
        Self {
            controller_name: "arlink".to_string(),
            controller_type: "PC".to_string(),
            timeout: Duration::from_secs(5),
            max_response_size: 4096,
        }
    }
}

/// Negotiate the UDP data ports with the device listening at `control_addr`.
///
/// `d2c_port` is the local UDP port the device should send to; bind it first.
pub async fn handshake(
    control_addr: SocketAddr,
    d2c_port: u16,
    config: &HandshakeConfig,
) -> Result<HandshakeResult> {
    tokio::time::timeout(config.timeout, exchange(control_addr, d2c_port, config))
        .await
        .map_err(|_| SessionError::Timeout(config.timeout))?
}

async fn exchange(
    control_addr: SocketAddr,
    d2c_port: u16,
    config: &HandshakeConfig,
) -> Result<HandshakeResult> {
    let mut stream = TcpStream::connect(control_addr)
        .await
        .map_err(|source| SessionError::Connect {
            addr: control_addr,
            source,
        })?;

    let request = HandshakeRequest {
        controller_name: config.controller_name.clone(),
        controller_type: config.controller_type.clone(),
        d2c_port,
    };
    debug!(addr = %control_addr, ?request, "sending handshake request");
    stream
        .write_all(&serde_json::to_vec(&request)?)
        .await
        .map_err(|source| SessionError::Connect {
            addr: control_addr,
            source,
        })?;

    let response: HandshakeResponse = read_json(&mut stream, config.max_response_size).await?;
    debug!(addr = %control_addr, ?response, "received handshake response");

    let c2d_port = validate_response(&response)?;
    let data_addr = SocketAddr::new(control_addr.ip(), c2d_port);
    info!(addr = %control_addr, %data_addr, d2c_port, "handshake complete");

    Ok(HandshakeResult {
        data_addr,
        d2c_port,
        response,
    })
}

fn validate_response(response: &HandshakeResponse) -> Result<u16> {
    if response.status != 0 {
        return Err(SessionError::HandshakeStatus(response.status));
    }
    match response.c2d_port {
        Some(port) if port != 0 => Ok(port),
        _ => Err(SessionError::HandshakeFailed(
            "response is missing c2d_port".to_string(),
        )),
    }
}

/// Devices terminate the JSON body with NUL and sometimes a newline.
fn trim_body(buf: &[u8]) -> &[u8] {
    let end = buf
        .iter()
        .rposition(|&b| b != 0 && !b.is_ascii_whitespace())
        .map_or(0, |i| i + 1);
    &buf[..end]
}

/// Read until the buffer holds one complete JSON value.
async fn read_json<T, R>(reader: &mut R, max_size: usize) -> Result<T>
where
    T: DeserializeOwned,
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::with_capacity(READ_CHUNK_SIZE);
    let mut chunk = [0u8; READ_CHUNK_SIZE];

    loop {
        let read = reader
            .read(&mut chunk)
            .await
            .map_err(|e| SessionError::HandshakeFailed(format!("read failed: {e}")))?;

        if read == 0 {
            let body = trim_body(&buf);
            if body.is_empty() {
                return Err(SessionError::HandshakeFailed(
                    "connection closed before response".to_string(),
                ));
            }
            return Ok(serde_json::from_slice(body)?);
        }

        buf.extend_from_slice(&chunk[..read]);
        if buf.len() > max_size {
            return Err(SessionError::HandshakeFailed(format!(
                "response exceeds {max_size} bytes"
            )));
        }

        let body = trim_body(&buf);
        if body.is_empty() {
            continue;
        }
        match serde_json::from_slice(body) {
            Ok(value) => return Ok(value),
            Err(err) if err.is_eof() => continue,
            Err(err) => return Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    /// Accept one connection, check the request, answer with `reply` in
    /// the given pieces.
    async fn fake_device(replies: Vec<&'static [u8]>) -> (SocketAddr, tokio::task::JoinHandle<HandshakeRequest>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 1024];
            let n = stream.read(&mut buf).await.unwrap();
            let request: HandshakeRequest = serde_json::from_slice(&buf[..n]).unwrap();
            for piece in replies {
                stream.write_all(piece).await.unwrap();
                stream.flush().await.unwrap();
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
            request
        });
        (addr, handle)
    }

    #[tokio::test]
    async fn success_returns_data_endpoint() {
        let (addr, device) = fake_device(vec![
            b"{\"status\":0,\"c2d_port\":54321,\"arstream_fragment_size\":65000,".as_slice(),
            b"\"arstream_fragment_maximum_number\":4,\"c2d_update_port\":51,\"c2d_user_port\":21}\0",
        ])
        .await;

        let result = handshake(addr, 43210, &HandshakeConfig::default())
            .await
            .unwrap();
        assert_eq!(result.data_addr, SocketAddr::new(addr.ip(), 54321));
        assert_eq!(result.d2c_port, 43210);
        assert_eq!(result.response.arstream_fragment_size, Some(65000));
        assert_eq!(result.response.c2d_user_port, Some(21));
        assert_eq!(result.response.skycontroller_version, None);

        let request = device.await.unwrap();
        assert_eq!(request.controller_type, "PC");
        assert_eq!(request.controller_name, "arlink");
        assert_eq!(request.d2c_port, 43210);
    }

    #[tokio::test]
    async fn nonzero_status_is_rejected() {
        let (addr, _device) = fake_device(vec![b"{\"status\":1}\0".as_slice()]).await;
        let err = handshake(addr, 1, &HandshakeConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::HandshakeStatus(1)));
    }

    #[tokio::test]
    async fn missing_port_is_rejected() {
        let (addr, _device) = fake_device(vec![b"{\"status\":0}\n".as_slice()]).await;
        let err = handshake(addr, 1, &HandshakeConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::HandshakeFailed(_)));
    }

    #[tokio::test]
    async fn malformed_response_is_json_error() {
        let (addr, _device) = fake_device(vec![b"not json at all".as_slice()]).await;
        let err = handshake(addr, 1, &HandshakeConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Json(_)));
    }

    #[tokio::test]
    async fn closed_without_response() {
        let (addr, _device) = fake_device(Vec::new()).await;
        let err = handshake(addr, 1, &HandshakeConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::HandshakeFailed(_)));
    }

    #[tokio::test]
    async fn silent_device_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let _device = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
            drop(stream);
        });

        let config = HandshakeConfig {
            timeout: Duration::from_millis(100),
            ..HandshakeConfig::default()
        };
        let err = handshake(addr, 1, &config).await.unwrap_err();
        assert!(matches!(err, SessionError::Timeout(_)));
    }

    #[tokio::test]
    async fn oversized_response_is_rejected() {
        let (addr, _device) = fake_device(vec![b"{\"status\":0,\"skycontroller_version\":\"aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa".as_slice()]).await;
        let config = HandshakeConfig {
            max_response_size: 32,
            ..HandshakeConfig::default()
        };
        let err = handshake(addr, 1, &config).await.unwrap_err();
        assert!(matches!(err, SessionError::HandshakeFailed(_)));
    }

    #[tokio::test]
    async fn refused_connection() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = handshake(addr, 1, &HandshakeConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Connect { .. }));
    }

    #[test]
    fn trim_body_strips_nul_and_whitespace() {
        assert_eq!(trim_body(b"{}\0\n"), b"{}");
        assert_eq!(trim_body(b"\0\0"), b"");
        assert_eq!(trim_body(b"{\"a\":1}"), b"{\"a\":1}");
    }
}
