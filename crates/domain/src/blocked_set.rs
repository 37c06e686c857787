use compact_str::CompactString;
use rustc_hash::FxHashSet;

const WILDCARD_PREFIX: &str = "*.";

/// Lowercases ASCII letters and strips a single trailing dot.
///
/// Both blocklist entries and incoming question names go through this, so
/// `ADS.Example.com.` and `ads.example.com` compare equal.
pub fn normalize_domain(name: &str) -> CompactString {
    let trimmed = name.strip_suffix('.').unwrap_or(name);
    let mut normalized = CompactString::new(trimmed);
    normalized.make_ascii_lowercase();
    normalized
}

/// Immutable set of blocked domain names.
///
/// Exact entries match only the name itself. Entries written as
/// `*.example.com` match every strict subdomain of `example.com`.
#[derive(Debug, Clone, Default)]
pub struct BlockedSet {
    exact: FxHashSet<CompactString>,
    wildcard: FxHashSet<CompactString>,
}

impl BlockedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::new();
        for entry in entries {
            set.insert(entry.as_ref());
        }
        set
    }

    /// Adds an entry; returns false for entries that normalize to nothing.
    pub fn insert(&mut self, entry: &str) -> bool {
        let entry = entry.trim();
        if let Some(suffix) = entry.strip_prefix(WILDCARD_PREFIX) {
            let suffix = normalize_domain(suffix);
            if suffix.is_empty() {
                return false;
            }
            self.wildcard.insert(suffix);
            return true;
        }

        let name = normalize_domain(entry);
        if name.is_empty() {
            return false;
        }
        self.exact.insert(name);
        true
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        let name = normalize_domain(name);
        if name.is_empty() {
            return false;
        }
        if self.exact.contains(name.as_str()) {
            return true;
        }
        if self.wildcard.is_empty() {
            return false;
        }

        let mut rest = name.as_str();
        while let Some((_, parent)) = rest.split_once('.') {
            if self.wildcard.contains(parent) {
                return true;
            }
            rest = parent;
        }
        false
    }

    pub fn len(&self) -> usize {
        self.exact.len() + self.wildcard.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exact.is_empty() && self.wildcard.is_empty()
    }

    pub fn wildcard_count(&self) -> usize {
        self.wildcard.len()
    }
}
