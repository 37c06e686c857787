use bytes::Bytes;
use hickory_proto::op::{Message, MessageType, OpCode, Query, ResponseCode};
use hickory_proto::rr::rdata::A;
use hickory_proto::rr::{DNSClass, Name, RData, Record, RecordType};
use sieve_dns_application::dns_message::encode_message;
use sieve_dns_application::{DnsQuery, DnsReply, InboundTransport};
use std::net::Ipv4Addr;
use std::str::FromStr;

pub fn query_message(id: u16, name: &str, record_type: RecordType) -> Message {
    let mut query = Query::new();
    query.set_name(Name::from_str(name).unwrap());
    query.set_query_type(record_type);
    query.set_query_class(DNSClass::IN);

    let mut message = Message::new(id, MessageType::Query, OpCode::Query);
    message.set_recursion_desired(true);
    message.add_query(query);
    message
}

pub fn query_wire(id: u16, name: &str, record_type: RecordType) -> Vec<u8> {
    encode_message(&query_message(id, name, record_type)).unwrap()
}

/// A-record query whose question labels are written byte for byte, so the
/// name reaches the decoder in exactly the case given here.
pub fn raw_query_wire(id: u16, name: &str) -> Vec<u8> {
    let mut wire = Vec::with_capacity(32 + name.len());
    wire.extend_from_slice(&id.to_be_bytes());
    wire.extend_from_slice(&[0x01, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]);
    for label in name.split('.').filter(|label| !label.is_empty()) {
        wire.push(label.len() as u8);
        wire.extend_from_slice(label.as_bytes());
    }
    wire.push(0);
    wire.extend_from_slice(&[0x00, 0x01, 0x00, 0x01]);
    wire
}

pub fn raw_udp_query(id: u16, name: &str) -> DnsQuery {
    DnsQuery::decode(raw_query_wire(id, name), InboundTransport::Udp).unwrap()
}

pub fn udp_query(id: u16, name: &str) -> DnsQuery {
    DnsQuery::decode(query_wire(id, name, RecordType::A), InboundTransport::Udp).unwrap()
}

pub fn typed_query(id: u16, name: &str, record_type: RecordType) -> DnsQuery {
    DnsQuery::decode(query_wire(id, name, record_type), InboundTransport::Udp).unwrap()
}

/// A header-only query with no question section.
pub fn empty_query(id: u16) -> DnsQuery {
    let message = Message::new(id, MessageType::Query, OpCode::Query);
    DnsQuery::decode(encode_message(&message).unwrap(), InboundTransport::Udp).unwrap()
}

/// Upstream-style answer for `query` carrying one A record.
pub fn upstream_reply(query: &DnsQuery, address: Ipv4Addr) -> DnsReply {
    let mut message = Message::new(query.id(), MessageType::Response, OpCode::Query);
    message.set_recursion_desired(true);
    message.set_recursion_available(true);
    message.set_response_code(ResponseCode::NoError);
    if let Some(question) = query.question() {
        message.add_query(question.clone());
        message.add_answer(Record::from_rdata(
            question.name().clone(),
            300,
            RData::A(A(address)),
        ));
    }
    let wire = Bytes::from(encode_message(&message).unwrap());
    DnsReply::from_upstream(message, wire)
}

pub fn answer_addresses(message: &Message) -> Vec<Ipv4Addr> {
    message
        .answers()
        .iter()
        .filter_map(|record| match record.data() {
            RData::A(a) => Some(a.0),
            _ => None,
        })
        .collect()
}
