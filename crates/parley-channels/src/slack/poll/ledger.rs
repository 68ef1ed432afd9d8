//! [`DedupLedger`] -- message ids already delivered or suppressed.

use std::collections::HashSet;

/// The set of message ids a polling session has already decided on.
///
/// History fetches return overlapping windows (no cursor is kept), so
/// every fetched message is checked here first. Ids are never evicted:
/// one ledger lives exactly as long as its poller.
#[derive(Debug, Default)]
pub struct DedupLedger {
    seen: HashSet<String>,
}

impl DedupLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has(&self, id: &str) -> bool {
        self.seen.contains(id)
    }

    /// Record `id`. Returns `false` if it was already present or is empty.
    pub fn add(&mut self, id: &str) -> bool {
        if id.is_empty() || self.seen.contains(id) {
            return false;
        }
        self.seen.insert(id.to_owned())
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn clear(&mut self) {
        self.seen.clear();
    }
}
