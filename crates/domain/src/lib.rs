//! Sieve DNS Domain Layer
pub mod block_response;
pub mod blocked_set;
pub mod config;
pub mod errors;
pub mod upstream_target;

pub use block_response::BlockResponse;
pub use blocked_set::{normalize_domain, BlockedSet};
pub use config::{CliOverrides, Config, ConfigError, UpstreamFailurePolicy};
pub use errors::DomainError;
pub use upstream_target::UpstreamTarget;
