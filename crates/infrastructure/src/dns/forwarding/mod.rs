pub mod forwarder;
pub mod response_validator;

pub use forwarder::DnsForwarder;
pub use response_validator::ResponseValidator;
