use crate::dns::transport::malformed;
use bytes::Bytes;
use hickory_proto::op::Message;
use sieve_dns_application::dns_message::DNS_HEADER_LEN;
use sieve_dns_application::{DnsQuery, DnsReply};
use sieve_dns_domain::DomainError;
use std::net::SocketAddr;
use tracing::debug;

const QR_BIT: u8 = 0x80;

/// Checks that upstream bytes answer the query they were sent for.
pub struct ResponseValidator;

impl ResponseValidator {
    /// Header checks run on the raw bytes first so a mismatched reply is
    /// rejected without decoding it. The decoded question must equal the
    /// query's, compared case-insensitively. On success the bytes are kept
    /// verbatim.
    pub fn validate(
        query: &DnsQuery,
        response_bytes: Bytes,
        server: SocketAddr,
    ) -> Result<DnsReply, DomainError> {
        if response_bytes.len() < DNS_HEADER_LEN {
            return Err(malformed(
                server,
                format!("reply of {} bytes is shorter than a DNS header", response_bytes.len()),
            ));
        }

        let reply_id = u16::from_be_bytes([response_bytes[0], response_bytes[1]]);
        if reply_id != query.id() {
            return Err(malformed(
                server,
                format!(
                    "transaction ID {} does not match query ID {}",
                    reply_id,
                    query.id()
                ),
            ));
        }

        if response_bytes[2] & QR_BIT == 0 {
            return Err(malformed(server, "QR bit not set"));
        }

        let message = Message::from_vec(&response_bytes)
            .map_err(|e| malformed(server, format!("failed to parse reply: {}", e)))?;

        if message.queries() != query.message().queries() {
            return Err(malformed(server, "question section does not match the query"));
        }

        if message.truncated() {
            debug!(server = %server, id = reply_id, "Upstream reply truncated, relaying as-is");
        }

        Ok(DnsReply::from_upstream(message, response_bytes))
    }
}
