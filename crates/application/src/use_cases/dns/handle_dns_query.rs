use super::stats::DispatchStats;
use crate::dns_message::{DnsQuery, DnsReply};
use crate::ports::QueryForwarder;
use crate::services::{BlacklistMatcher, ResponseSynthesizer};
use sieve_dns_domain::DomainError;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, warn};

/// Which path a query takes. Chosen once per query, never revisited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Blocked,
    Forwarded,
}

impl Route {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blocked => "BLOCKED",
            Self::Forwarded => "FORWARDED",
        }
    }
}

pub struct HandleDnsQueryUseCase {
    matcher: BlacklistMatcher,
    synthesizer: ResponseSynthesizer,
    forwarder: Arc<dyn QueryForwarder>,
    stats: Arc<DispatchStats>,
}

impl HandleDnsQueryUseCase {
    pub fn new(
        matcher: BlacklistMatcher,
        synthesizer: ResponseSynthesizer,
        forwarder: Arc<dyn QueryForwarder>,
    ) -> Self {
        Self {
            matcher,
            synthesizer,
            forwarder,
            stats: Arc::new(DispatchStats::default()),
        }
    }

    pub fn stats(&self) -> Arc<DispatchStats> {
        Arc::clone(&self.stats)
    }

    /// Queries without a question have no name to match and are forwarded.
    pub fn route(&self, query: &DnsQuery) -> Route {
        match query.question_name() {
            Some(name) if self.matcher.is_blocked(name) => Route::Blocked,
            _ => Route::Forwarded,
        }
    }

    /// Answer a blocked query locally or relay it upstream.
    ///
    /// Forwarding failures are returned as-is; deciding what the client sees
    /// belongs to the listener.
    pub async fn execute(&self, query: &DnsQuery) -> Result<DnsReply, DomainError> {
        let start = Instant::now();
        let route = self.route(query);

        match route {
            Route::Blocked => {
                let reply = self.synthesizer.synthesize(query);
                self.stats.record_blocked();
                debug!(
                    id = query.id(),
                    domain = query.question_name().unwrap_or_default(),
                    status = route.as_str(),
                    elapsed_us = start.elapsed().as_micros() as u64,
                    "Query answered locally"
                );
                Ok(reply)
            }
            Route::Forwarded => match self.forwarder.forward(query).await {
                Ok(reply) => {
                    self.stats.record_forwarded();
                    debug!(
                        id = query.id(),
                        domain = query.question_name().unwrap_or_default(),
                        status = route.as_str(),
                        transport = query.transport().as_str(),
                        elapsed_us = start.elapsed().as_micros() as u64,
                        "Query forwarded"
                    );
                    Ok(reply)
                }
                Err(e) if e.is_upstream_failure() => {
                    self.stats.record_failed();
                    warn!(
                        id = query.id(),
                        domain = query.question_name().unwrap_or_default(),
                        status = e.status(),
                        error = %e,
                        "Forwarding failed"
                    );
                    Err(e)
                }
                Err(e) => {
                    self.stats.record_failed();
                    error!(id = query.id(), error = %e, "Forwarder returned an unexpected error");
                    Err(e)
                }
            },
        }
    }
}
