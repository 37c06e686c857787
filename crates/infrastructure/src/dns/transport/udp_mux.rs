//! UDP transport multiplexing every in-flight query over one socket.
//!
//! Replies are routed back to their waiter by transaction ID through a
//! [`DashMap`] owned jointly by the senders and a single reader task. A reply
//! is only handed over when its question section matches the waiter's, so a
//! late answer to a timed-out query cannot satisfy a newer query that reused
//! the ID. Query bytes are never rewritten: when a client-chosen ID is
//! already in flight the query is sent on its own socket instead.
//!
//! ICMP errors on the shared socket cannot be tied to a particular query,
//! so an unreachable upstream shows up here as timeouts.

use super::udp::UdpTransport;
use super::{
    ephemeral_bind_addr, unreachable, with_deadline, DnsTransport, TransportResponse,
    MAX_DNS_MESSAGE_SIZE,
};
use async_trait::async_trait;
use bytes::Bytes;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use hickory_proto::op::{Message, Query};
use sieve_dns_domain::DomainError;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

const SOCKET_RECV_BUFFER: usize = 1024 * 1024;
const SOCKET_SEND_BUFFER: usize = 256 * 1024;

type PendingTable = DashMap<u16, Waiter>;

/// Table entry: the question the reply must echo and where to deliver it.
struct Waiter {
    question: Vec<Query>,
    tx: oneshot::Sender<Bytes>,
}

impl Waiter {
    /// Replies that do not decode are delivered so the validator can report
    /// them as malformed.
    fn accepts(&self, reply_question: Option<&[Query]>) -> bool {
        reply_question.map_or(true, |question| question == self.question.as_slice())
    }
}

pub struct MultiplexedUdpTransport {
    server_addr: SocketAddr,
    socket: Arc<UdpSocket>,
    pending: Arc<PendingTable>,
    fallback: UdpTransport,
    reader: JoinHandle<()>,
}

impl MultiplexedUdpTransport {
    /// Binds the shared socket, connects it to `server_addr` and starts the
    /// reader task. Must be called from within a Tokio runtime.
    pub async fn connect(server_addr: SocketAddr) -> Result<Self, DomainError> {
        let socket = create_socket(server_addr)
            .map_err(|e| unreachable(server_addr, "bind shared socket", e))?;
        socket
            .connect(server_addr)
            .await
            .map_err(|e| unreachable(server_addr, "connect shared socket", e))?;

        let socket = Arc::new(socket);
        let pending: Arc<PendingTable> = Arc::new(DashMap::new());
        let reader = tokio::spawn(read_replies(
            Arc::clone(&socket),
            Arc::clone(&pending),
            server_addr,
        ));

        debug!(server = %server_addr, "Shared UDP upstream socket ready");

        Ok(Self {
            server_addr,
            socket,
            pending,
            fallback: UdpTransport::new(server_addr),
            reader,
        })
    }

    pub fn server_addr(&self) -> SocketAddr {
        self.server_addr
    }

    /// Number of queries currently waiting for a reply.
    pub fn in_flight(&self) -> usize {
        self.pending.len()
    }

    async fn exchange(&self, message_bytes: &[u8]) -> Result<Bytes, DomainError> {
        let server = self.server_addr;
        let id = match message_bytes {
            [hi, lo, ..] => u16::from_be_bytes([*hi, *lo]),
            _ => {
                return Err(DomainError::Encode(
                    "query shorter than a transaction ID".to_string(),
                ))
            }
        };

        let question = Message::from_vec(message_bytes)
            .map_err(|e| DomainError::Encode(format!("query does not decode: {}", e)))?
            .take_queries();

        let rx = match self.pending.entry(id) {
            Entry::Occupied(_) => None,
            Entry::Vacant(slot) => {
                let (tx, rx) = oneshot::channel();
                slot.insert(Waiter { question, tx });
                Some(rx)
            }
        };

        let Some(rx) = rx else {
            debug!(server = %server, id, "Transaction ID already in flight, using a dedicated socket");
            return self.fallback.exchange(message_bytes).await;
        };

        let mut waiter = PendingReply {
            id,
            rx,
            pending: Arc::clone(&self.pending),
        };

        self.socket
            .send(message_bytes)
            .await
            .map_err(|e| unreachable(server, "send", e))?;

        (&mut waiter.rx).await.map_err(|_| DomainError::UpstreamUnreachable {
            server: server.to_string(),
            reason: "shared socket reader stopped".to_string(),
        })
    }
}

impl Drop for MultiplexedUdpTransport {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

#[async_trait]
impl DnsTransport for MultiplexedUdpTransport {
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

/// Correlation-table slot for one outstanding query.
///
/// Dropping it removes the slot unless the reader already took it or another
/// query now owns the ID.
struct PendingReply {
    id: u16,
    rx: oneshot::Receiver<Bytes>,
    pending: Arc<PendingTable>,
}

impl Drop for PendingReply {
    fn drop(&mut self) {
        self.rx.close();
        self.pending.remove_if(&self.id, |_, waiter| waiter.tx.is_closed());
    }
}

async fn read_replies(socket: Arc<UdpSocket>, pending: Arc<PendingTable>, server: SocketAddr) {
    let mut recv_buf = vec![0u8; MAX_DNS_MESSAGE_SIZE];

    loop {
        match socket.recv(&mut recv_buf).await {
            Ok(len) if len < 2 => {
                warn!(server = %server, len, "Discarding runt datagram from upstream");
            }
            Ok(len) => {
                let id = u16::from_be_bytes([recv_buf[0], recv_buf[1]]);
                let reply = Bytes::copy_from_slice(&recv_buf[..len]);
                let reply_question = Message::from_vec(&reply).ok().map(|mut m| m.take_queries());

                match pending.remove_if(&id, |_, waiter| waiter.accepts(reply_question.as_deref())) {
                    Some((_, waiter)) => {
                        if waiter.tx.send(reply).is_err() {
                            debug!(server = %server, id, "Waiter gone before reply arrived");
                        }
                    }
                    None if pending.contains_key(&id) => {
                        warn!(
                            server = %server,
                            id,
                            "Discarding upstream reply whose question does not match the pending query"
                        );
                    }
                    None => {
                        warn!(
                            server = %server,
                            id,
                            "Discarding upstream reply with unexpected transaction ID"
                        );
                    }
                }
            }
            Err(e) if e.kind() == io::ErrorKind::ConnectionRefused => {
                debug!(server = %server, "Upstream refused a datagram on the shared socket");
            }
            Err(e) => {
                warn!(server = %server, error = %e, "Shared UDP socket receive error");
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
        }
    }
}

fn create_socket(server: SocketAddr) -> io::Result<UdpSocket> {
    use socket2::{Domain, Protocol, Socket, Type};

    let domain = if server.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };

    let socket = Socket::new(domain, Type::DGRAM, Some(Protocol::UDP))?;

    if let Err(e) = socket.set_recv_buffer_size(SOCKET_RECV_BUFFER) {
        warn!(error = %e, "Failed to set shared UDP recv buffer size");
    }
    if let Err(e) = socket.set_send_buffer_size(SOCKET_SEND_BUFFER) {
        warn!(error = %e, "Failed to set shared UDP send buffer size");
    }

    socket.bind(&ephemeral_bind_addr(server).into())?;
    socket.set_nonblocking(true)?;

    let std_socket: std::net::UdpSocket = socket.into();
    UdpSocket::from_std(std_socket)
}
