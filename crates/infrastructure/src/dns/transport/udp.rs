//! UDP transport with one ephemeral socket per query (RFC 1035 §4.2.1)
//!
//! The socket is connected to the upstream, so the kernel filters out
//! datagrams from anyone else and an ICMP port-unreachable comes back as
//! `ConnectionRefused` on the next receive. A reply with the TC bit set is
//! returned as-is; the client retries over TCP on its own.

use super::{
    ephemeral_bind_addr, unreachable, with_deadline, DnsTransport, TransportResponse,
    MAX_DNS_MESSAGE_SIZE,
};
use async_trait::async_trait;
use bytes::Bytes;
use sieve_dns_domain::DomainError;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;
use tracing::debug;

pub struct UdpTransport {
    server_addr: SocketAddr,
}

impl UdpTransport {
    pub fn new(server_addr: SocketAddr) -> Self {
        Self { server_addr }
    }

    pub fn server_addr(&self) -> SocketAddr {
        self.server_addr
    }

    pub(super) async fn exchange(&self, message_bytes: &[u8]) -> Result<Bytes, DomainError> {
        let server = self.server_addr;

        let socket = UdpSocket::bind(ephemeral_bind_addr(server))
            .await
            .map_err(|e| unreachable(server, "bind", e))?;
        socket
            .connect(server)
            .await
            .map_err(|e| unreachable(server, "connect", e))?;

        let bytes_sent = socket
            .send(message_bytes)
            .await
            .map_err(|e| unreachable(server, "send", e))?;

        debug!(server = %server, bytes_sent, "UDP query sent");

        let mut recv_buf = vec![0u8; MAX_DNS_MESSAGE_SIZE];
        let bytes_received = socket
            .recv(&mut recv_buf)
            .await
            .map_err(|e| unreachable(server, "receive", e))?;
        recv_buf.truncate(bytes_received);

        debug!(server = %server, bytes_received, "UDP response received");

        Ok(Bytes::from(recv_buf))
    }
}

#[async_trait]
impl DnsTransport for UdpTransport {
    async fn send(
        &self,
        message_bytes: &[u8],
        timeout: Duration,
    ) -> Result<TransportResponse, DomainError> {
        let bytes = with_deadline(self.server_addr, timeout, self.exchange(message_bytes)).await?;

        Ok(TransportResponse {
            bytes,
            protocol_used: "UDP",
        })
    }

    fn protocol_name(&self) -> &'static str {
        "UDP"
    }
}
