//! Process-wide captured-stream cache
//!
//! Capturing the same constraints twice must not open the device twice: the
//! cache holds one reference-counted entry per distinct normalized
//! constraint set, and the entry leaves the cache exactly when its count
//! reaches zero. All mutations happen under one mutex so that concurrent
//! `start()`/`stop()` calls on different instances observe a consistent
//! count, in particular the decrement-and-remove on release is a single
//! critical section.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::constraints::{CaptureConstraints, ConstraintKey};
use crate::engine::MediaStreamHandle;

struct CacheEntry {
    #[allow(dead_code)]
    constraints: CaptureConstraints,
    stream: Arc<dyn MediaStreamHandle>,
    ref_count: usize,
}

/// Result of releasing one reference
pub enum ReleaseOutcome {
    /// Other instances still hold the stream
    Retained {
        /// References remaining after the decrement
        remaining: usize,
    },
    /// The last reference was released; the caller must stop this stream
    Removed {
        /// The evicted stream
        stream: Arc<dyn MediaStreamHandle>,
    },
    /// No entry exists for the key
    Missing,
}

/// Registry of shared captured streams keyed by normalized constraints
///
/// Owned once per process (by the [`crate::LocalMediaManager`]) and injected
/// into every instance; reset only at process teardown.
pub struct StreamCache {
    entries: Mutex<HashMap<ConstraintKey, CacheEntry>>,
}

impl StreamCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Take one reference on an existing entry
    pub fn checkout(&self, key: &ConstraintKey) -> Option<Arc<dyn MediaStreamHandle>> {
        let mut entries = self.entries.lock();
        let entry = entries.get_mut(key)?;
        entry.ref_count += 1;
        tracing::debug!(%key, ref_count = entry.ref_count, "reusing cached stream");
        Some(entry.stream.clone())
    }

    /// Insert a freshly captured stream, or join an entry that won a race
    ///
    /// Returns the canonical stream for the key. When the returned handle is
    /// not the one passed in, another capture completed first and the caller
    /// should stop its own stream and adopt the returned one.
    pub fn insert(
        &self,
        key: ConstraintKey,
        constraints: CaptureConstraints,
        stream: Arc<dyn MediaStreamHandle>,
    ) -> Arc<dyn MediaStreamHandle> {
        let mut entries = self.entries.lock();
        match entries.entry(key) {
            std::collections::hash_map::Entry::Occupied(mut occupied) => {
                let entry = occupied.get_mut();
                entry.ref_count += 1;
                entry.stream.clone()
            }
            std::collections::hash_map::Entry::Vacant(vacant) => {
                vacant.insert(CacheEntry {
                    constraints,
                    stream: stream.clone(),
                    ref_count: 1,
                });
                stream
            }
        }
    }

    /// Drop one reference; removes the entry at zero
    pub fn release(&self, key: &ConstraintKey) -> ReleaseOutcome {
        let mut entries = self.entries.lock();
        let remaining = {
            let Some(entry) = entries.get_mut(key) else {
                return ReleaseOutcome::Missing;
            };
            entry.ref_count -= 1;
            entry.ref_count
        };
        if remaining == 0 {
            tracing::debug!(%key, "last reference released, evicting stream");
            match entries.remove(key) {
                Some(entry) => ReleaseOutcome::Removed {
                    stream: entry.stream,
                },
                None => ReleaseOutcome::Missing,
            }
        } else {
            ReleaseOutcome::Retained { remaining }
        }
    }

    /// Current reference count for a key, if cached
    pub fn ref_count(&self, key: &ConstraintKey) -> Option<usize> {
        self.entries.lock().get(key).map(|entry| entry.ref_count)
    }

    /// Number of cached entries
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl Default for StreamCache {
    fn default() -> Self {
        Self::new()
    }
}
