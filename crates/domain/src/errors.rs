use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Failed to decode DNS message: {0}")]
    Decode(String),

    #[error("Failed to encode DNS message: {0}")]
    Encode(String),

    #[error("Upstream {server} did not reply within {timeout_ms} ms")]
    UpstreamTimeout { server: String, timeout_ms: u64 },

    #[error("Upstream {server} unreachable: {reason}")]
    UpstreamUnreachable { server: String, reason: String },

    #[error("Malformed reply from upstream {server}: {reason}")]
    UpstreamMalformedReply { server: String, reason: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl DomainError {
    /// True for the three failures the forwarder can surface.
    pub fn is_upstream_failure(&self) -> bool {
        matches!(
            self,
            Self::UpstreamTimeout { .. }
                | Self::UpstreamUnreachable { .. }
                | Self::UpstreamMalformedReply { .. }
        )
    }

    /// Short status label used in query logs.
    pub fn status(&self) -> &'static str {
        match self {
            Self::Decode(_) => "FORMERR",
            Self::Encode(_) => "ENCODE_ERROR",
            Self::UpstreamTimeout { .. } => "TIMEOUT",
            Self::UpstreamUnreachable { .. } => "UNREACHABLE",
            Self::UpstreamMalformedReply { .. } => "MALFORMED",
            Self::ConfigError(_) => "CONFIG_ERROR",
        }
    }
}
