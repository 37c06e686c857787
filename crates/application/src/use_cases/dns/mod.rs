mod handle_dns_query;
mod stats;

pub use handle_dns_query::{HandleDnsQueryUseCase, Route};
pub use stats::{DispatchStats, DispatchStatsSnapshot};
