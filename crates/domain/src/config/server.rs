use serde::{Deserialize, Serialize};

/// What the listener sends back when forwarding a query fails.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum UpstreamFailurePolicy {
    /// Send nothing; the client's resolver retries or times out.
    #[default]
    Drop,

    /// Answer with the query's header and question and RCODE SERVFAIL.
    ServFail,
}

impl UpstreamFailurePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Drop => "drop",
            Self::ServFail => "servfail",
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    #[serde(default = "default_dns_port")]
    pub dns_port: u16,

    #[serde(default = "default_true")]
    pub tcp_enabled: bool,

    #[serde(default)]
    pub upstream_failure: UpstreamFailurePolicy,

    /// How long in-flight queries may run after a shutdown signal.
    #[serde(default = "default_shutdown_grace_ms")]
    pub shutdown_grace_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            dns_port: default_dns_port(),
            tcp_enabled: true,
            upstream_failure: UpstreamFailurePolicy::default(),
            shutdown_grace_ms: default_shutdown_grace_ms(),
        }
    }
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_dns_port() -> u16 {
    53
}

fn default_true() -> bool {
    true
}

fn default_shutdown_grace_ms() -> u64 {
    2000
}
