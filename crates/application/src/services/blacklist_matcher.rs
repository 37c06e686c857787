use sieve_dns_domain::BlockedSet;
use std::sync::Arc;
use tracing::trace;

/// Read-only membership check against the configured [`BlockedSet`].
///
/// The set is built once at startup and shared; lookups take no lock.
#[derive(Debug, Clone)]
pub struct BlacklistMatcher {
    blocked: Arc<BlockedSet>,
}

impl BlacklistMatcher {
    pub fn new(blocked: Arc<BlockedSet>) -> Self {
        Self { blocked }
    }

    #[inline]
    pub fn is_blocked(&self, name: &str) -> bool {
        let blocked = self.blocked.contains(name);
        trace!(domain = %name, blocked, "Blacklist lookup");
        blocked
    }

    pub fn blocked_count(&self) -> usize {
        self.blocked.len()
    }
}
