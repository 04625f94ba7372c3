//! Process-lifetime resolution cache in front of a parameter store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use errpage_core::ParameterRecord;
use parking_lot::RwLock;

use crate::error::StoreError;
use crate::store::ParameterStore;

/// Outcome of a cache lookup.
#[derive(Debug, Clone)]
pub enum Lookup {
    /// Served from memory, no store I/O.
    Hit(Arc<ParameterRecord>),
    /// Loaded from the store and inserted into the cache.
    Loaded(Arc<ParameterRecord>),
    /// The store had no usable document. Nothing was cached.
    NotFound,
}

impl Lookup {
    /// The resolved record, if any.
    pub fn record(self) -> Option<Arc<ParameterRecord>> {
        match self {
            Self::Hit(record) | Self::Loaded(record) => Some(record),
            Self::NotFound => None,
        }
    }

    /// Whether the lookup was served from memory.
    pub fn is_hit(&self) -> bool {
        matches!(self, Self::Hit(_))
    }

    /// Whether the lookup found nothing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}

/// Counters describing cache behavior.
#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU64,
    loads: AtomicU64,
    misses: AtomicU64,
}

impl CacheStats {
    /// Lookups served from memory.
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Successful store loads.
    pub fn loads(&self) -> u64 {
        self.loads.load(Ordering::Relaxed)
    }

    /// Lookups that ended in not-found.
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }
}

/// In-memory map from canonical name to parsed parameters.
///
/// Entries are created on first successful load and never evicted or
/// refreshed. Failed loads are not cached, so every request for a missing
/// name goes back to the store. The lock is only held for the map lookup and
/// the insert, never across store I/O; two concurrent first loads of the same
/// name both hit the store and the last insert wins.
pub struct ResolutionCache<S: ParameterStore> {
    store: S,
    entries: RwLock<HashMap<String, Arc<ParameterRecord>>>,
    stats: CacheStats,
}

impl<S: ParameterStore> ResolutionCache<S> {
    /// Create an empty cache over `store`.
    pub fn new(store: S) -> Self {
        Self {
            store,
            entries: RwLock::new(HashMap::new()),
            stats: CacheStats::default(),
        }
    }

    /// Get the record for `key`, loading it from the store on a miss.
    pub fn get_or_load(&self, key: &str) -> Lookup {
        if let Some(record) = self.get(key) {
            self.stats.hits.fetch_add(1, Ordering::Relaxed);
            return Lookup::Hit(record);
        }

        match self.store.load(key) {
            Ok(record) => {
                let record = Arc::new(record);
                self.entries.write().insert(key.to_string(), Arc::clone(&record));
                self.stats.loads.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(key, params = record.len(), "cached example parameters");
                Lookup::Loaded(record)
            }
            Err(e) => {
                self.stats.misses.fetch_add(1, Ordering::Relaxed);
                match &e {
                    StoreError::Io { .. } | StoreError::Malformed { .. } => {
                        tracing::warn!(key, kind = e.kind(), error = %e, "example parameters unreadable")
                    }
                    _ => {
                        tracing::debug!(key, kind = e.kind(), error = %e, "example parameters unavailable")
                    }
                }
                Lookup::NotFound
            }
        }
    }

    /// Get a cached record without touching the store.
    pub fn get(&self, key: &str) -> Option<Arc<ParameterRecord>> {
        self.entries.read().get(key).cloned()
    }

    /// Whether `key` has been cached.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.read().contains_key(key)
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Cache counters.
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }
}
