pub mod blocking;
pub mod errors;
pub mod legacy;
pub mod logging;
pub mod root;
pub mod server;
pub mod upstream;

pub use blocking::BlockingConfig;
pub use errors::ConfigError;
pub use legacy::LegacyConfig;
pub use logging::LoggingConfig;
pub use root::{CliOverrides, Config};
pub use server::{ServerConfig, UpstreamFailurePolicy};
pub use upstream::UpstreamConfig;
