use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

/// Lock-free per-route counters, updated on every handled query.
#[derive(Debug, Default)]
pub struct DispatchStats {
    pub blocked: AtomicU64,
    pub forwarded: AtomicU64,
    pub failed: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DispatchStatsSnapshot {
    pub blocked: u64,
    pub forwarded: u64,
    pub failed: u64,
}

impl DispatchStats {
    pub fn snapshot(&self) -> DispatchStatsSnapshot {
        DispatchStatsSnapshot {
            blocked: self.blocked.load(AtomicOrdering::Relaxed),
            forwarded: self.forwarded.load(AtomicOrdering::Relaxed),
            failed: self.failed.load(AtomicOrdering::Relaxed),
        }
    }

    pub(crate) fn record_blocked(&self) {
        self.blocked.fetch_add(1, AtomicOrdering::Relaxed);
    }

    pub(crate) fn record_forwarded(&self) {
        self.forwarded.fetch_add(1, AtomicOrdering::Relaxed);
    }

    pub(crate) fn record_failed(&self) {
        self.failed.fetch_add(1, AtomicOrdering::Relaxed);
    }
}

impl DispatchStatsSnapshot {
    pub fn total(&self) -> u64 {
        self.blocked + self.forwarded + self.failed
    }
}
