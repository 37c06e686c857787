//! Reader for the flat `conf.json` layout used by earlier deployments.
//!
//! ```json
//! {
//!     "upper_dns": "8.8.8.8",
//!     "port": 53,
//!     "host": "127.0.0.1",
//!     "blacklist": ["ads.example.com"],
//!     "answer": "blocked.local",
//!     "socket_timeout": 5
//! }
//! ```
//!
//! `port` is both the listen port and the upstream port, and `host` is both
//! the listen address and the address handed out for blocked names. The
//! `answer` key named the owner of the blocked record; replies now always use
//! the question name, so the key is accepted and ignored.

use serde::Deserialize;

use super::blocking::BlockingConfig;
use super::logging::LoggingConfig;
use super::root::Config;
use super::server::ServerConfig;
use super::upstream::UpstreamConfig;

#[derive(Debug, Clone, Deserialize)]
pub struct LegacyConfig {
    pub upper_dns: String,

    pub port: u16,

    pub host: String,

    #[serde(default)]
    pub blacklist: Vec<String>,

    #[serde(default)]
    pub answer: Option<String>,

    /// Seconds; zero or absent keeps the default upstream timeout.
    #[serde(default)]
    pub socket_timeout: Option<f64>,
}

impl LegacyConfig {
    pub fn from_json(contents: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(contents)
    }
}

impl From<LegacyConfig> for Config {
    fn from(legacy: LegacyConfig) -> Self {
        let mut upstream = UpstreamConfig {
            address: legacy.upper_dns,
            port: legacy.port,
            ..UpstreamConfig::default()
        };
        if let Some(secs) = legacy.socket_timeout.filter(|s| s.is_finite() && *s > 0.0) {
            upstream.timeout_ms = (secs * 1000.0).round() as u64;
        }

        Config {
            server: ServerConfig {
                bind_address: legacy.host.clone(),
                dns_port: legacy.port,
                ..ServerConfig::default()
            },
            upstream,
            blocking: BlockingConfig {
                domains: legacy.blacklist,
                response_address: legacy.host,
                ..BlockingConfig::default()
            },
            logging: LoggingConfig::default(),
        }
    }
}
