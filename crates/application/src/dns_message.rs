//! Decoded DNS queries and replies.
//!
//! Both types keep the `hickory-proto` [`Message`] they were decoded into.
//! A query also keeps its raw bytes so the forwarder can send them upstream
//! untouched; a reply received from upstream keeps the bytes it arrived as,
//! so relaying it to the client never re-encodes anything.

use bytes::Bytes;
use hickory_proto::op::{Message, MessageType, Query, ResponseCode};
use hickory_proto::serialize::binary::{BinEncodable, BinEncoder};
use sieve_dns_domain::DomainError;

/// DNS header length (RFC 1035 §4.1.1).
pub const DNS_HEADER_LEN: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InboundTransport {
    Udp,
    Tcp,
}

impl InboundTransport {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Udp => "UDP",
            Self::Tcp => "TCP",
        }
    }
}

#[derive(Debug, Clone)]
pub struct DnsQuery {
    message: Message,
    wire: Bytes,
    question_name: Option<String>,
    transport: InboundTransport,
}

impl DnsQuery {
    /// Decode a request received from a client.
    ///
    /// Anything that is not a well-formed DNS message with QR=0 is rejected
    /// with `DomainError::Decode`.
    pub fn decode(
        wire: impl Into<Bytes>,
        transport: InboundTransport,
    ) -> Result<Self, DomainError> {
        let wire = wire.into();
        if wire.len() < DNS_HEADER_LEN {
            return Err(DomainError::Decode(format!(
                "packet too short: {} bytes",
                wire.len()
            )));
        }

        let message = Message::from_vec(&wire).map_err(|e| DomainError::Decode(e.to_string()))?;

        if message.message_type() != MessageType::Query {
            return Err(DomainError::Decode(
                "expected a query, got a response".to_string(),
            ));
        }

        let question_name = message.queries().first().map(|q| q.name().to_ascii());

        Ok(Self {
            message,
            wire,
            question_name,
            transport,
        })
    }

    #[inline]
    pub fn id(&self) -> u16 {
        self.message.id()
    }

    pub fn question(&self) -> Option<&Query> {
        self.message.queries().first()
    }

    /// Question name in presentation form, as sent by the client.
    /// Rendered once at decode time.
    pub fn question_name(&self) -> Option<&str> {
        self.question_name.as_deref()
    }

    pub fn message(&self) -> &Message {
        &self.message
    }

    pub fn wire(&self) -> &Bytes {
        &self.wire
    }

    pub fn transport(&self) -> InboundTransport {
        self.transport
    }
}

#[derive(Debug, Clone)]
pub struct DnsReply {
    message: Message,
    wire: Option<Bytes>,
}

impl DnsReply {
    /// A reply received from upstream; `wire` is what goes back to the client.
    pub fn from_upstream(message: Message, wire: Bytes) -> Self {
        Self {
            message,
            wire: Some(wire),
        }
    }

    /// A reply built locally, encoded when the listener asks for it.
    pub fn synthesized(message: Message) -> Self {
        Self {
            message,
            wire: None,
        }
    }

    /// SERVFAIL answer echoing the query's header and question.
    pub fn server_failure(query: &DnsQuery) -> Self {
        let mut message = response_skeleton(query.message());
        message.set_response_code(ResponseCode::ServFail);
        Self::synthesized(message)
    }

    #[inline]
    pub fn id(&self) -> u16 {
        self.message.id()
    }

    pub fn message(&self) -> &Message {
        &self.message
    }

    pub fn is_synthesized(&self) -> bool {
        self.wire.is_none()
    }

    /// Wire form of the reply: upstream bytes untouched, or a fresh encoding.
    pub fn to_wire(&self) -> Result<Bytes, DomainError> {
        match &self.wire {
            Some(wire) => Ok(wire.clone()),
            None => encode_message(&self.message).map(Bytes::from),
        }
    }
}

/// Response header mirroring `request`: same ID, opcode, RD flag and question.
pub(crate) fn response_skeleton(request: &Message) -> Message {
    let mut message = Message::new(request.id(), MessageType::Response, request.op_code());
    message.set_recursion_desired(request.recursion_desired());
    message.set_recursion_available(true);
    for query in request.queries() {
        message.add_query(query.clone());
    }
    message
}

/// Serialize a Message to wire format bytes
pub fn encode_message(message: &Message) -> Result<Vec<u8>, DomainError> {
    let mut buf = Vec::with_capacity(512);
    let mut encoder = BinEncoder::new(&mut buf);

    message
        .emit(&mut encoder)
        .map_err(|e| DomainError::Encode(e.to_string()))?;

    Ok(buf)
}
