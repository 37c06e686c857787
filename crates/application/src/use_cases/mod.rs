pub mod dns;

pub use dns::{DispatchStats, DispatchStatsSnapshot, HandleDnsQueryUseCase, Route};
