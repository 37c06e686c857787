pub mod tcp;
pub mod udp;
pub mod udp_mux;

use async_trait::async_trait;
use bytes::Bytes;
use sieve_dns_domain::DomainError;
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;

pub use tcp::TcpTransport;
pub use udp::UdpTransport;
pub use udp_mux::MultiplexedUdpTransport;

/// Largest DNS message either transport can carry.
pub const MAX_DNS_MESSAGE_SIZE: usize = 65_535;

#[derive(Debug)]
pub struct TransportResponse {
    pub bytes: Bytes,

    pub protocol_used: &'static str,
}

#[async_trait]
pub trait DnsTransport: Send + Sync {
    /// One request/response exchange with the upstream, bounded by `timeout`
    /// as a whole. The bytes are sent and returned unmodified.
    async fn send(
        &self,
        message_bytes: &[u8],
        timeout: Duration,
    ) -> Result<TransportResponse, DomainError>;

    fn protocol_name(&self) -> &'static str;
}

pub enum Transport {
    Udp(UdpTransport),
    SharedUdp(MultiplexedUdpTransport),
    Tcp(TcpTransport),
}

impl Transport {
    pub async fn send(
        &self,
        message_bytes: &[u8],
        timeout: Duration,
    ) -> Result<TransportResponse, DomainError> {
        match self {
            Self::Udp(t) => DnsTransport::send(t, message_bytes, timeout).await,
            Self::SharedUdp(t) => DnsTransport::send(t, message_bytes, timeout).await,
            Self::Tcp(t) => DnsTransport::send(t, message_bytes, timeout).await,
        }
    }
}

/// Runs `exchange` under a single deadline covering connect, send and receive.
pub(crate) async fn with_deadline<F>(
    server: SocketAddr,
    timeout: Duration,
    exchange: F,
) -> Result<Bytes, DomainError>
where
    F: Future<Output = Result<Bytes, DomainError>>,
{
    tokio::time::timeout(timeout, exchange)
        .await
        .map_err(|_| DomainError::UpstreamTimeout {
            server: server.to_string(),
            timeout_ms: timeout.as_millis() as u64,
        })?
}

pub(crate) fn unreachable(server: SocketAddr, context: &str, e: io::Error) -> DomainError {
    DomainError::UpstreamUnreachable {
        server: server.to_string(),
        reason: format!("{}: {}", context, e),
    }
}

pub(crate) fn malformed(server: SocketAddr, reason: impl Into<String>) -> DomainError {
    DomainError::UpstreamMalformedReply {
        server: server.to_string(),
        reason: reason.into(),
    }
}

/// Wildcard local address of the same family as `server`.
pub(crate) fn ephemeral_bind_addr(server: SocketAddr) -> SocketAddr {
    let ip = match server {
        SocketAddr::V4(_) => std::net::Ipv4Addr::UNSPECIFIED.into(),
        SocketAddr::V6(_) => std::net::Ipv6Addr::UNSPECIFIED.into(),
    };
    SocketAddr::new(ip, 0)
}
