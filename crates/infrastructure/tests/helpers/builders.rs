use hickory_proto::op::{Message, MessageType, OpCode, Query};
use hickory_proto::rr::{DNSClass, Name, RData, RecordType};
use sieve_dns_application::dns_message::encode_message;
use sieve_dns_application::{DnsQuery, InboundTransport};
use sieve_dns_domain::UpstreamTarget;
use std::net::{Ipv4Addr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

pub fn query_wire(id: u16, name: &str) -> Vec<u8> {
    let mut query = Query::new();
    query.set_name(Name::from_str(name).unwrap());
    query.set_query_type(RecordType::A);
    query.set_query_class(DNSClass::IN);

    let mut message = Message::new(id, MessageType::Query, OpCode::Query);
    message.set_recursion_desired(true);
    message.add_query(query);
    encode_message(&message).unwrap()
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

pub fn udp_query(id: u16, name: &str) -> DnsQuery {
    DnsQuery::decode(query_wire(id, name), InboundTransport::Udp).unwrap()
}

pub fn tcp_query(id: u16, name: &str) -> DnsQuery {
    DnsQuery::decode(query_wire(id, name), InboundTransport::Tcp).unwrap()
}

pub fn target(addr: SocketAddr, timeout: Duration) -> UpstreamTarget {
    UpstreamTarget::new(addr, timeout)
}

pub fn shared_target(addr: SocketAddr, timeout: Duration) -> UpstreamTarget {
    UpstreamTarget::new(addr, timeout).with_shared_socket(true)
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

/// A local address nothing listens on: bind, read the port, release it.
pub async fn closed_udp_addr() -> SocketAddr {
    let socket = tokio::net::UdpSocket::bind("127.0.0.1:0").await.unwrap();
    socket.local_addr().unwrap()
}

pub async fn closed_tcp_addr() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}
