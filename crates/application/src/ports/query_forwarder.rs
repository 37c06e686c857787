use crate::dns_message::{DnsQuery, DnsReply};
use async_trait::async_trait;
use sieve_dns_domain::DomainError;

#[async_trait]
pub trait QueryForwarder: Send + Sync {
    /// Send the query to the upstream unchanged and return its reply verbatim.
    ///
    /// Fails with `UpstreamTimeout`, `UpstreamUnreachable` or
    /// `UpstreamMalformedReply`. Implementations never retry.
    async fn forward(&self, query: &DnsQuery) -> Result<DnsReply, DomainError>;
}
