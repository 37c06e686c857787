use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BlockingConfig {
    /// Exact names, or `*.example.com` to block every subdomain.
    #[serde(default)]
    pub domains: Vec<String>,

    #[serde(default = "default_response_address")]
    pub response_address: String,

    #[serde(default)]
    pub response_ttl: u32,
}

impl Default for BlockingConfig {
    fn default() -> Self {
        Self {
            domains: vec![],
            response_address: default_response_address(),
            response_ttl: 0,
        }
    }
}

fn default_response_address() -> String {
    "0.0.0.0".to_string()
}
