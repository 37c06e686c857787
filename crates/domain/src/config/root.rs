use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use super::blocking::BlockingConfig;
use super::errors::ConfigError;
use super::legacy::LegacyConfig;
use super::logging::LoggingConfig;
use super::server::ServerConfig;
use super::upstream::UpstreamConfig;
use crate::{BlockResponse, BlockedSet, UpstreamTarget};

const LOCAL_CONFIG_PATH: &str = "sieve-dns.toml";
const SYSTEM_CONFIG_PATH: &str = "/etc/sieve-dns/config.toml";

/// Main configuration structure for Sieve DNS
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Listener configuration (address, port, failure policy)
    #[serde(default)]
    pub server: ServerConfig,

    /// The resolver queries are forwarded to
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// Blocked names and the answer handed out for them
    #[serde(default)]
    pub blocking: BlockingConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from file or use defaults
    ///
    /// Priority order:
    /// 1. Explicitly provided path
    /// 2. sieve-dns.toml in current directory
    /// 3. /etc/sieve-dns/config.toml
    /// 4. Default configuration
    pub fn load(path: Option<&str>, cli_overrides: CliOverrides) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = path {
            Self::from_file(path)?
        } else if std::path::Path::new(LOCAL_CONFIG_PATH).exists() {
            Self::from_file(LOCAL_CONFIG_PATH)?
        } else if std::path::Path::new(SYSTEM_CONFIG_PATH).exists() {
            Self::from_file(SYSTEM_CONFIG_PATH)?
        } else {
            Self::default()
        };

        config.apply_cli_overrides(cli_overrides);
        Ok(config)
    }

    /// Load configuration from a specific file; `.json` files use the legacy layout
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.to_string(), e.to_string()))?;

        if path.ends_with(".json") {
            return LegacyConfig::from_json(&contents)
                .map(Config::from)
                .map_err(|e| ConfigError::Parse(e.to_string()));
        }

        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Apply command-line overrides to configuration
    fn apply_cli_overrides(&mut self, overrides: CliOverrides) {
        if let Some(port) = overrides.dns_port {
            self.server.dns_port = port;
        }
        if let Some(bind) = overrides.bind_address {
            self.server.bind_address = bind;
        }
        if let Some(upstream) = overrides.upstream {
            match upstream.parse::<SocketAddr>() {
                Ok(addr) => {
                    self.upstream.address = addr.ip().to_string();
                    self.upstream.port = addr.port();
                }
                Err(_) => self.upstream.address = upstream,
            }
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.dns_port == 0 {
            return Err(ConfigError::Validation("DNS port cannot be 0".to_string()));
        }

        self.listen_addr()?;
        self.upstream_target()?;
        self.block_response()?;

        for entry in &self.blocking.domains {
            let mut probe = BlockedSet::new();
            if !probe.insert(entry) {
                return Err(ConfigError::Validation(format!(
                    "Blocked domain entry '{}' is empty",
                    entry
                )));
            }
        }

        Ok(())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr = self.server.bind_address.parse().map_err(|_| {
            ConfigError::Validation(format!(
                "Invalid bind address '{}'",
                self.server.bind_address
            ))
        })?;
        Ok(SocketAddr::new(ip, self.server.dns_port))
    }

    pub fn upstream_target(&self) -> Result<UpstreamTarget, ConfigError> {
        let ip: IpAddr = self.upstream.address.parse().map_err(|_| {
            ConfigError::Validation(format!(
                "Invalid upstream address '{}'",
                self.upstream.address
            ))
        })?;

        if self.upstream.port == 0 {
            return Err(ConfigError::Validation(
                "Upstream port cannot be 0".to_string(),
            ));
        }

        if self.upstream.timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "Upstream timeout must be greater than 0".to_string(),
            ));
        }

        Ok(UpstreamTarget::new(
            SocketAddr::new(ip, self.upstream.port),
            Duration::from_millis(self.upstream.timeout_ms),
        )
        .with_shared_socket(self.upstream.shared_socket))
    }

    pub fn block_response(&self) -> Result<BlockResponse, ConfigError> {
        let address: Ipv4Addr = self.blocking.response_address.parse().map_err(|_| {
            ConfigError::Validation(format!(
                "Block response address '{}' is not an IPv4 address",
                self.blocking.response_address
            ))
        })?;
        Ok(BlockResponse::new(address, self.blocking.response_ttl))
    }

    pub fn blocked_set(&self) -> BlockedSet {
        BlockedSet::from_entries(&self.blocking.domains)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.server.shutdown_grace_ms)
    }
}

/// Command-line overrides for configuration
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub dns_port: Option<u16>,
    pub bind_address: Option<String>,
    /// `ip` or `ip:port`
    pub upstream: Option<String>,
    pub log_level: Option<String>,
}
