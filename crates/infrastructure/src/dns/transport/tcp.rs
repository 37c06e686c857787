//! TCP transport (RFC 1035 §4.2.2), one connection per query.
//!
//! Every message is preceded by its length as a big-endian `u16`.

use super::{
    malformed, unreachable, with_deadline, DnsTransport, TransportResponse, MAX_DNS_MESSAGE_SIZE,
};
use async_trait::async_trait;
use bytes::Bytes;
use sieve_dns_domain::DomainError;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

pub struct TcpTransport {
    server_addr: SocketAddr,
}

impl TcpTransport {
    pub fn new(server_addr: SocketAddr) -> Self {
        Self { server_addr }
    }

    pub fn server_addr(&self) -> SocketAddr {
        self.server_addr
    }

    async fn exchange(&self, message_bytes: &[u8]) -> Result<Bytes, DomainError> {
        let server = self.server_addr;

        let mut stream = TcpStream::connect(server)
            .await
            .map_err(|e| unreachable(server, "connect", e))?;

        if let Err(e) = stream.set_nodelay(true) {
            debug!(server = %server, error = %e, "Failed to set TCP_NODELAY");
        }

        send_with_length_prefix(&mut stream, message_bytes)
            .await
            .map_err(|e| unreachable(server, "send", e))?;

        debug!(server = %server, message_len = message_bytes.len(), "TCP query sent");

        let response = read_with_length_prefix(&mut stream)
            .await
            .map_err(|e| match e.kind() {
                io::ErrorKind::UnexpectedEof => {
                    malformed(server, "connection closed before a complete reply")
                }
                _ => unreachable(server, "receive", e),
            })?;

        debug!(server = %server, response_len = response.len(), "TCP response received");

        Ok(Bytes::from(response))
    }
}

#[async_trait]
impl DnsTransport for TcpTransport {
    async fn send(
        &self,
        message_bytes: &[u8],
        timeout: Duration,
    ) -> Result<TransportResponse, DomainError> {
        let bytes = with_deadline(self.server_addr, timeout, self.exchange(message_bytes)).await?;

        Ok(TransportResponse {
            bytes,
            protocol_used: "TCP",
        })
    }

    fn protocol_name(&self) -> &'static str {
        "TCP"
    }
}

/// Writes one length-prefixed DNS message and flushes the stream.
pub async fn send_with_length_prefix<S>(stream: &mut S, message_bytes: &[u8]) -> io::Result<()>
where
    S: AsyncWrite + Unpin,
{
    let length = u16::try_from(message_bytes.len()).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!(
                "message of {} bytes exceeds {} bytes",
                message_bytes.len(),
                MAX_DNS_MESSAGE_SIZE
            ),
        )
    })?;

    let mut framed = Vec::with_capacity(2 + message_bytes.len());
    framed.extend_from_slice(&length.to_be_bytes());
    framed.extend_from_slice(message_bytes);

    stream.write_all(&framed).await?;
    stream.flush().await
}

/// Reads one length-prefixed DNS message.
///
/// A clean EOF before the length prefix surfaces as `UnexpectedEof`, which
/// the listener treats as the client closing the connection.
pub async fn read_with_length_prefix<S>(stream: &mut S) -> io::Result<Vec<u8>>
where
    S: AsyncRead + Unpin,
{
    let mut len_buf = [0u8; 2];
    stream.read_exact(&mut len_buf).await?;

    let message_len = u16::from_be_bytes(len_buf) as usize;
    let mut message = vec![0u8; message_len];
    stream.read_exact(&mut message).await?;

    Ok(message)
}
