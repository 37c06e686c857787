pub mod forwarding;
pub mod server;
pub mod transport;

pub use forwarding::{DnsForwarder, ResponseValidator};
pub use server::DnsServerHandler;
