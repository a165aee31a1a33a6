//! Redirect chain tracking.
//!
//! # Responsibilities
//! - Correlate an in-flight outbound dispatch with the final URL its
//!   redirect chain reached
//! - Clean up each entry exactly once per relay, on every exit path
//! - Warn when live entries pile up (a sign relays are not completing)

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use url::Url;
use uuid::Uuid;

/// Identity of one outbound dispatch.
///
/// Assigned per inbound request and used as the tracker key for the whole
/// redirect chain, so at most one entry exists per logical relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RelayId(Uuid);

impl RelayId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RelayId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RelayId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A concurrency-safe map from dispatch identity to final redirect target.
///
/// The whole table is guarded by one mutex. Entries are short-lived and
/// per-request, so contention is negligible.
pub struct RedirectTracker {
    entries: Mutex<HashMap<RelayId, Url>>,
    leak_threshold: usize,
}

impl RedirectTracker {
    pub fn new(leak_threshold: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            leak_threshold,
        }
    }

    /// Record the latest hop of a chain. Upserts, so only the last hop
    /// survives for each relay.
    pub fn record(&self, id: RelayId, final_url: Url) {
        self.entries
            .lock()
            .expect("redirect tracker mutex poisoned")
            .insert(id, final_url);
    }

    /// Non-destructive read of the final URL a dispatch was redirected to.
    pub fn resolve(&self, id: RelayId) -> Option<Url> {
        self.entries
            .lock()
            .expect("redirect tracker mutex poisoned")
            .get(&id)
            .cloned()
    }

    /// Idempotent delete.
    pub fn forget(&self, id: RelayId) {
        self.entries
            .lock()
            .expect("redirect tracker mutex poisoned")
            .remove(&id);
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .expect("redirect tracker mutex poisoned")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A guard that forgets `id` when dropped, so cleanup runs on every
    /// handler exit path.
    pub fn cleanup_guard(self: &Arc<Self>, id: RelayId) -> TrackerCleanup {
        TrackerCleanup {
            tracker: Arc::clone(self),
            id,
        }
    }
}

/// Scope guard for a tracker entry.
pub struct TrackerCleanup {
    tracker: Arc<RedirectTracker>,
    id: RelayId,
}

impl Drop for TrackerCleanup {
    fn drop(&mut self) {
        self.tracker.forget(self.id);
        let live = self.tracker.len();
        if live > self.tracker.leak_threshold {
            tracing::warn!(
                live_entries = live,
                "redirect tracker still holds entries after cleanup, are relays leaking?"
            );
        }
    }
}
