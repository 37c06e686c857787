use std::net::Ipv4Addr;

/// Answer used for every blocked query: one A record pointing at `address`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockResponse {
    pub address: Ipv4Addr,
    pub ttl: u32,
}

impl BlockResponse {
    pub fn new(address: Ipv4Addr, ttl: u32) -> Self {
        Self { address, ttl }
    }
}

impl Default for BlockResponse {
    fn default() -> Self {
        Self {
            address: Ipv4Addr::UNSPECIFIED,
            ttl: 0,
        }
    }
}
