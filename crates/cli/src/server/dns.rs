use bytes::Bytes;
use sieve_dns_application::InboundTransport;
use sieve_dns_domain::Config;
use sieve_dns_infrastructure::dns::transport::tcp::{
    read_with_length_prefix, send_with_length_prefix,
};
use sieve_dns_infrastructure::dns::transport::MAX_DNS_MESSAGE_SIZE;
use sieve_dns_infrastructure::dns::DnsServerHandler;
use socket2::{Domain, Protocol, Socket, Type};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream, UdpSocket};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

const TCP_IDLE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy)]
pub struct DnsServerSettings {
    pub listen_addr: SocketAddr,
    pub tcp_enabled: bool,
    pub shutdown_grace: Duration,
}

impl DnsServerSettings {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            listen_addr: config.listen_addr()?,
            tcp_enabled: config.server.tcp_enabled,
            shutdown_grace: config.shutdown_grace(),
        })
    }
}

/// Bound listening sockets, ready to serve.
pub struct DnsServer {
    udp: Arc<UdpSocket>,
    tcp: Option<TcpListener>,
    shutdown_grace: Duration,
}

impl DnsServer {
    /// Binds UDP first; TCP reuses the UDP port so `:0` yields one port for both.
    pub fn bind(settings: &DnsServerSettings) -> anyhow::Result<Self> {
        let domain = if settings.listen_addr.is_ipv4() {
            Domain::IPV4
        } else {
            Domain::IPV6
        };

        let udp = create_udp_socket(domain, settings.listen_addr)?;
        let udp_addr = udp.local_addr()?;

        let tcp = if settings.tcp_enabled {
            Some(create_tcp_listener(domain, udp_addr)?)
        } else {
            None
        };

        Ok(Self {
            udp: Arc::new(udp),
            tcp,
            shutdown_grace: settings.shutdown_grace,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.udp.local_addr()
    }

    /// Serve until `shutdown` fires, then drain in-flight queries.
    pub async fn run(self, handler: DnsServerHandler, shutdown: CancellationToken) {
        let handler = Arc::new(handler);
        let mut listeners: JoinSet<()> = JoinSet::new();

        listeners.spawn(run_udp_listener(
            self.udp,
            handler.clone(),
            shutdown.clone(),
            self.shutdown_grace,
        ));

        if let Some(tcp) = self.tcp {
            listeners.spawn(run_tcp_listener(
                tcp,
                handler,
                shutdown,
                self.shutdown_grace,
            ));
        }

        while let Some(result) = listeners.join_next().await {
            if let Err(e) = result {
                error!(error = %e, "DNS listener task failed");
            }
        }
    }
}

pub async fn start_dns_server(
    settings: DnsServerSettings,
    handler: DnsServerHandler,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    let server = DnsServer::bind(&settings)?;

    info!(
        bind_address = %server.local_addr()?,
        tcp = settings.tcp_enabled,
        "DNS server ready"
    );

    server.run(handler, shutdown).await;
    Ok(())
}

async fn run_udp_listener(
    socket: Arc<UdpSocket>,
    handler: Arc<DnsServerHandler>,
    shutdown: CancellationToken,
    grace: Duration,
) {
    let mut tasks: JoinSet<()> = JoinSet::new();
    let mut recv_buf = vec![0u8; MAX_DNS_MESSAGE_SIZE];

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            result = socket.recv_from(&mut recv_buf) => match result {
                Ok((len, client)) => {
                    let packet = Bytes::copy_from_slice(&recv_buf[..len]);
                    let handler = handler.clone();
                    let socket = socket.clone();
                    tasks.spawn(async move {
                        if let Some(reply) = handler
                            .handle_raw(packet, InboundTransport::Udp, client)
                            .await
                        {
                            if let Err(e) = socket.send_to(&reply, client).await {
                                debug!(client = %client, error = %e, "Failed to send UDP reply");
                            }
                        }
                    });
                }
                Err(e) => {
                    debug!(error = %e, "UDP recv error");
                }
            }
        }
    }

    drain_in_flight(tasks, grace, "UDP").await;
}

async fn run_tcp_listener(
    listener: TcpListener,
    handler: Arc<DnsServerHandler>,
    shutdown: CancellationToken,
    grace: Duration,
) {
    let mut tasks: JoinSet<()> = JoinSet::new();

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            result = listener.accept() => match result {
                Ok((stream, client)) => {
                    tasks.spawn(serve_tcp_connection(
                        stream,
                        client,
                        handler.clone(),
                        shutdown.clone(),
                    ));
                }
                Err(e) => {
                    warn!(error = %e, "TCP accept error");
                }
            }
        }
    }

    drain_in_flight(tasks, grace, "TCP").await;
}

/// Serves length-prefixed queries one after another until the client closes,
/// goes idle, or the server shuts down between queries.
///
/// Queries on one connection are answered strictly in order: a pipelining
/// client (RFC 7766 §6.2.1.1) waits for each forwarded reply, slow upstream
/// included, before the next query is read. Concurrency comes from opening
/// more connections.
async fn serve_tcp_connection(
    mut stream: TcpStream,
    client: SocketAddr,
    handler: Arc<DnsServerHandler>,
    shutdown: CancellationToken,
) {
    if let Err(e) = stream.set_nodelay(true) {
        debug!(client = %client, error = %e, "Failed to set TCP_NODELAY");
    }

    loop {
        let packet = tokio::select! {
            _ = shutdown.cancelled() => return,
            result = tokio::time::timeout(TCP_IDLE_TIMEOUT, read_with_length_prefix(&mut stream)) => {
                match result {
                    Ok(Ok(packet)) => packet,
                    Ok(Err(e)) if e.kind() == io::ErrorKind::UnexpectedEof => return,
                    Ok(Err(e)) => {
                        debug!(client = %client, error = %e, "TCP read error");
                        return;
                    }
                    Err(_) => {
                        debug!(client = %client, "Closing idle TCP connection");
                        return;
                    }
                }
            }
        };

        let Some(reply) = handler
            .handle_raw(Bytes::from(packet), InboundTransport::Tcp, client)
            .await
        else {
            continue;
        };

        if let Err(e) = send_with_length_prefix(&mut stream, &reply).await {
            debug!(client = %client, error = %e, "Failed to send TCP reply");
            return;
        }
    }
}

async fn drain_in_flight(mut tasks: JoinSet<()>, grace: Duration, listener: &'static str) {
    if tasks.is_empty() {
        return;
    }

    info!(listener, in_flight = tasks.len(), "Waiting for in-flight queries");

    let drained = tokio::time::timeout(grace, async {
        while tasks.join_next().await.is_some() {}
    })
    .await;

    if drained.is_err() {
        warn!(
            listener,
            abandoned = tasks.len(),
            "Shutdown grace period elapsed, abandoning in-flight queries"
        );
        tasks.abort_all();
        while tasks.join_next().await.is_some() {}
    }
}

fn create_udp_socket(domain: Domain, socket_addr: SocketAddr) -> anyhow::Result<UdpSocket> {
    let socket = Socket::new(domain, Type::DGRAM, Some(Protocol::UDP))?;
    if socket_addr.is_ipv6() {
        socket.set_only_v6(false)?;
    }
    socket.set_reuse_address(true)?;
    socket.set_recv_buffer_size(512 * 1024)?;
    socket.set_send_buffer_size(512 * 1024)?;
    socket.bind(&socket_addr.into())?;
    socket.set_nonblocking(true)?;
    let std_socket: std::net::UdpSocket = socket.into();
    Ok(UdpSocket::from_std(std_socket)?)
}

fn create_tcp_listener(domain: Domain, socket_addr: SocketAddr) -> anyhow::Result<TcpListener> {
    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;
    if socket_addr.is_ipv6() {
        socket.set_only_v6(false)?;
    }
    socket.set_reuse_address(true)?;
    socket.bind(&socket_addr.into())?;
    socket.listen(1024)?;
    socket.set_nonblocking(true)?;
    let std_listener: std::net::TcpListener = socket.into();
    Ok(TcpListener::from_std(std_listener)?)
}
