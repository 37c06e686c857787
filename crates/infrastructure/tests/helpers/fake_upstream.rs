use hickory_proto::op::{Message, MessageType, ResponseCode};
use hickory_proto::rr::rdata::A;
use hickory_proto::rr::{RData, Record};
use sieve_dns_application::dns_message::encode_message;
use sieve_dns_infrastructure::dns::transport::tcp::{
    read_with_length_prefix, send_with_length_prefix,
};
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::{TcpListener, UdpSocket};
use tokio::sync::oneshot;

/// How the fake upstream reacts to each query.
#[derive(Debug, Clone, Copy)]
pub enum Behavior {
    /// Answer with one A record.
    Answer(Ipv4Addr),
    /// Answer after a pause; queries are served concurrently.
    Delayed(Duration, Ipv4Addr),
    /// Never reply.
    Silent,
    /// Reply with the query's ID plus one.
    WrongId,
    /// Reply with bytes that are not a DNS message.
    Garbage,
    /// Reply with TC set and no answers.
    Truncated,
    /// Send a reply carrying an unrelated ID, then the real answer.
    StrayThenAnswer(Ipv4Addr),
}

pub struct FakeUpstream {
    addr: SocketAddr,
    hits: Arc<AtomicUsize>,
    sent: Arc<Mutex<Vec<Vec<u8>>>>,
    _shutdown_tx: oneshot::Sender<()>,
}

impl FakeUpstream {
    pub async fn udp(behavior: Behavior) -> Self {
        let socket = Arc::new(UdpSocket::bind("127.0.0.1:0").await.unwrap());
        let addr = socket.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let sent = Arc::new(Mutex::new(Vec::new()));
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

        let (hits_task, sent_task) = (hits.clone(), sent.clone());
        tokio::spawn(async move {
            let mut buf = vec![0u8; 4096];
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    result = socket.recv_from(&mut buf) => {
                        let Ok((len, peer)) = result else { continue };
                        hits_task.fetch_add(1, Ordering::SeqCst);
                        let query = buf[..len].to_vec();
                        let socket = socket.clone();
                        let sent = sent_task.clone();
                        tokio::spawn(async move {
                            for reply in replies_for(&query, behavior).await {
                                sent.lock().unwrap().push(reply.clone());
                                let _ = socket.send_to(&reply, peer).await;
                            }
                        });
                    }
                }
            }
        });

        Self {
            addr,
            hits,
            sent,
            _shutdown_tx: shutdown_tx,
        }
    }

    pub async fn tcp(behavior: Behavior) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let sent = Arc::new(Mutex::new(Vec::new()));
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

        let (hits_task, sent_task) = (hits.clone(), sent.clone());
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    result = listener.accept() => {
                        let Ok((mut stream, _)) = result else { continue };
                        let hits = hits_task.clone();
                        let sent = sent_task.clone();
                        tokio::spawn(async move {
                            while let Ok(query) = read_with_length_prefix(&mut stream).await {
                                hits.fetch_add(1, Ordering::SeqCst);
                                for reply in replies_for(&query, behavior).await {
                                    sent.lock().unwrap().push(reply.clone());
                                    if send_with_length_prefix(&mut stream, &reply).await.is_err() {
                                        return;
                                    }
                                }
                            }
                        });
                    }
                }
            }
        });

        Self {
            addr,
            hits,
            sent,
            _shutdown_tx: shutdown_tx,
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    /// Every reply written so far, in order.
    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.sent.lock().unwrap().clone()
    }
}

async fn replies_for(query: &[u8], behavior: Behavior) -> Vec<Vec<u8>> {
    let Ok(request) = Message::from_vec(query) else {
        return vec![];
    };

    match behavior {
        Behavior::Answer(address) => vec![answer(&request, request.id(), address, false)],
        Behavior::Delayed(pause, address) => {
            tokio::time::sleep(pause).await;
            vec![answer(&request, request.id(), address, false)]
        }
        Behavior::Silent => vec![],
        Behavior::WrongId => vec![answer(
            &request,
            request.id().wrapping_add(1),
            Ipv4Addr::LOCALHOST,
            false,
        )],
        Behavior::Garbage => {
            let mut bytes = query[..2].to_vec();
            bytes.extend_from_slice(&[0x81, 0x80, 0xFF, 0xFF, 0xFF]);
            vec![bytes]
        }
        Behavior::Truncated => vec![answer(&request, request.id(), Ipv4Addr::LOCALHOST, true)],
        Behavior::StrayThenAnswer(address) => vec![
            answer(&request, request.id().wrapping_add(0x5A5A), address, false),
            answer(&request, request.id(), address, false),
        ],
    }
}

fn answer(request: &Message, id: u16, address: Ipv4Addr, truncated: bool) -> Vec<u8> {
    let mut message = Message::new(id, MessageType::Response, request.op_code());
    message.set_recursion_desired(request.recursion_desired());
    message.set_recursion_available(true);
    message.set_response_code(ResponseCode::NoError);
    message.set_truncated(truncated);
    for query in request.queries() {
        message.add_query(query.clone());
        if !truncated {
            message.add_answer(Record::from_rdata(
                query.name().clone(),
                120,
                RData::A(A(address)),
            ));
        }
    }
    encode_message(&message).unwrap()
}
