//! Derived-entity store (C4): a deduplicated, concurrent map from a
//! composite key to a derived entity, with two-level locking. A
//! top-level lock guards presence/insertion, and a per-entry lock lets
//! an existing entry be mutated without holding the top-level lock
//! across the mutation.
//!
//! `dashmap` supplies the top-level, shard-locked map (the same choice
//! used for the rate-limiter and cache quota tables elsewhere in this
//! codebase); each entry additionally wraps its value in a
//! `parking_lot::Mutex` so an in-place update never blocks unrelated
//! keys.

use std::hash::Hash;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;

/// A process-wide, deduplicated mapping from `K` to `V`.
///
/// `upsert` is the only write path: on a fresh key it inserts via
/// `factory` and bumps the insert counter under the stats lock; on an
/// existing key it runs `update` under that entry's own lock and leaves
/// the stats counter untouched.
pub struct DerivedEntityStore<K, V> {
    entries: DashMap<K, Arc<Mutex<V>>>,
    inserted: Mutex<u64>,
}

impl<K, V> DerivedEntityStore<K, V>
where
    K: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            inserted: Mutex::new(0),
        }
    }

    /// Inserts `factory()` if `key` is absent, else runs `update` against
    /// the existing value under its entry lock. Returns `true` if this
    /// call performed the insert, `false` if it updated an existing entry.
    pub fn upsert(
        &self,
        key: K,
        factory: impl FnOnce() -> V,
        update: impl FnOnce(&mut V),
    ) -> bool {
        match self.entries.entry(key) {
            Entry::Occupied(occupied) => {
                let existing = Arc::clone(occupied.get());
                drop(occupied);
                update(&mut existing.lock());
                false
            }
            Entry::Vacant(vacant) => {
                // Keep the shard guard alive across the counter bump so
                // a concurrent reader never observes the entry present
                // without `inserted` reflecting it.
                let _guard = vacant.insert(Arc::new(Mutex::new(factory())));
                *self.inserted.lock() += 1;
                true
            }
        }
    }

    /// Number of entries currently stored.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of distinct keys ever inserted (the `numSoftware`-style
    /// statistic, generalized to any entity kind this store holds).
    pub fn inserted_count(&self) -> u64 {
        *self.inserted.lock()
    }

    /// Returns a clone of the value stored under `key`, if present.
    pub fn get_cloned(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        self.entries.get(key).map(|entry| entry.lock().clone())
    }

    /// Snapshots every stored value. The store promises no iteration
    /// snapshot semantics beyond "consistent at the moment each entry is
    /// read": callers needing a frozen view should treat concurrent
    /// inserts during iteration as a race they must tolerate.
    pub fn snapshot(&self) -> Vec<V>
    where
        V: Clone,
    {
        self.entries.iter().map(|entry| entry.lock().clone()).collect()
    }
}

impl<K, V> Default for DerivedEntityStore<K, V>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
