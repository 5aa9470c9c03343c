use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

/// Canonical URLs claimed during one crawl invocation
///
/// `insert` is the only way to claim a URL: presence check and insertion
/// happen under one lock acquisition, so exactly one caller wins each URL.
/// The lock is never held across an await point.
#[derive(Debug, Default)]
pub struct VisitedSet {
    inner: Mutex<HashSet<String>>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims `url`. Returns true if this call inserted it.
    pub fn insert(&self, url: &str) -> bool {
        let mut set = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if set.contains(url) {
            return false;
        }
        set.insert(url.to_string())
    }

    /// Non-claiming lookup, only good as a pre-filter before spawning work
    pub fn contains(&self, url: &str) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(url)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
