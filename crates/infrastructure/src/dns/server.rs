use bytes::Bytes;
use sieve_dns_application::use_cases::HandleDnsQueryUseCase;
use sieve_dns_application::{DnsQuery, DnsReply, InboundTransport};
use sieve_dns_domain::UpstreamFailurePolicy;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, warn};

/// Turns raw datagrams or TCP frames into reply bytes.
///
/// Returning `None` means nothing is sent back to the client.
#[derive(Clone)]
pub struct DnsServerHandler {
    use_case: Arc<HandleDnsQueryUseCase>,
    failure_policy: UpstreamFailurePolicy,
}

impl DnsServerHandler {
    pub fn new(use_case: Arc<HandleDnsQueryUseCase>, failure_policy: UpstreamFailurePolicy) -> Self {
        Self {
            use_case,
            failure_policy,
        }
    }

    pub fn use_case(&self) -> &Arc<HandleDnsQueryUseCase> {
        &self.use_case
    }

    pub async fn handle_raw(
        &self,
        packet: Bytes,
        transport: InboundTransport,
        client: SocketAddr,
    ) -> Option<Bytes> {
        let query = match DnsQuery::decode(packet, transport) {
            Ok(query) => query,
            Err(e) => {
                debug!(client = %client, transport = transport.as_str(), error = %e, "Dropping undecodable packet");
                return None;
            }
        };

        debug!(
            client = %client,
            id = query.id(),
            domain = query.question_name().unwrap_or_default(),
            transport = transport.as_str(),
            "DNS query received"
        );

        let reply = match self.use_case.execute(&query).await {
            Ok(reply) => reply,
            Err(e) => match self.failure_policy {
                UpstreamFailurePolicy::Drop => {
                    debug!(client = %client, id = query.id(), error = %e, "No reply sent for failed query");
                    return None;
                }
                UpstreamFailurePolicy::ServFail => DnsReply::server_failure(&query),
            },
        };

        match reply.to_wire() {
            Ok(wire) => Some(wire),
            Err(e) => {
                warn!(client = %client, id = query.id(), error = %e, "Failed to encode reply");
                None
            }
        }
    }
}
