use super::response_validator::ResponseValidator;
use crate::dns::transport::{MultiplexedUdpTransport, TcpTransport, Transport, UdpTransport};
use async_trait::async_trait;
use sieve_dns_application::ports::QueryForwarder;
use sieve_dns_application::{DnsQuery, DnsReply, InboundTransport};
use sieve_dns_domain::{DomainError, UpstreamTarget};
use std::time::Instant;
use tracing::{debug, info};

/// Relays queries to a single upstream over the transport they arrived on.
pub struct DnsForwarder {
    target: UpstreamTarget,
    udp: Transport,
    tcp: Transport,
}

impl DnsForwarder {
    /// Builds the forwarder; with `shared_socket` set this binds the shared
    /// UDP socket and starts its reader task.
    pub async fn connect(target: UpstreamTarget) -> Result<Self, DomainError> {
        let udp = if target.shared_socket {
            Transport::SharedUdp(MultiplexedUdpTransport::connect(target.addr).await?)
        } else {
            Transport::Udp(UdpTransport::new(target.addr))
        };

        info!(
            upstream = %target,
            timeout_ms = target.timeout_ms(),
            shared_socket = target.shared_socket,
            "Upstream forwarder ready"
        );

        Ok(Self {
            target,
            udp,
            tcp: Transport::Tcp(TcpTransport::new(target.addr)),
        })
    }

    fn transport_for(&self, inbound: InboundTransport) -> &Transport {
        match inbound {
            InboundTransport::Udp => &self.udp,
            InboundTransport::Tcp => &self.tcp,
        }
    }
}

#[async_trait]
impl QueryForwarder for DnsForwarder {
    async fn forward(&self, query: &DnsQuery) -> Result<DnsReply, DomainError> {
        let start = Instant::now();
        let transport = self.transport_for(query.transport());

        let response = transport.send(query.wire(), self.target.timeout).await?;

        debug!(
            upstream = %self.target,
            id = query.id(),
            protocol = response.protocol_used,
            response_len = response.bytes.len(),
            elapsed_us = start.elapsed().as_micros() as u64,
            "Upstream replied"
        );

        ResponseValidator::validate(query, response.bytes, self.target.addr)
    }
}
