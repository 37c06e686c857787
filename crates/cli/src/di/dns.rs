use sieve_dns_application::services::{BlacklistMatcher, ResponseSynthesizer};
use sieve_dns_application::use_cases::HandleDnsQueryUseCase;
use sieve_dns_domain::Config;
use sieve_dns_infrastructure::dns::DnsForwarder;
use std::sync::Arc;
use tracing::info;

pub struct DnsServices {
    pub use_case: Arc<HandleDnsQueryUseCase>,
}

impl DnsServices {
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        let blocked = Arc::new(config.blocked_set());
        info!(
            entries = blocked.len(),
            wildcards = blocked.wildcard_count(),
            "Blacklist loaded"
        );

        let matcher = BlacklistMatcher::new(blocked);
        let synthesizer = ResponseSynthesizer::new(config.block_response()?);
        let forwarder = DnsForwarder::connect(config.upstream_target()?).await?;

        Ok(Self {
            use_case: Arc::new(HandleDnsQueryUseCase::new(
                matcher,
                synthesizer,
                Arc::new(forwarder),
            )),
        })
    }
}
