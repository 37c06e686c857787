use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

/// The real resolver that non-blocked queries are forwarded to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpstreamTarget {
    pub addr: SocketAddr,
    pub timeout: Duration,
    /// Multiplex all UDP queries over one socket instead of one socket per query.
    pub shared_socket: bool,
}

impl UpstreamTarget {
    pub fn new(addr: SocketAddr, timeout: Duration) -> Self {
        Self {
            addr,
            timeout,
            shared_socket: false,
        }
    }

    pub fn with_shared_socket(mut self, shared: bool) -> Self {
        self.shared_socket = shared;
        self
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout.as_millis() as u64
    }
}

impl fmt::Display for UpstreamTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.addr)
    }
}
