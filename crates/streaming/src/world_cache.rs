use std::collections::BTreeMap;

use tracing::debug;

use crate::store::FragmentStore;

pub const DEFAULT_WORLD_CACHE_CAPACITY: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorldCacheError {
    ZeroCapacity,
}

impl std::fmt::Display for WorldCacheError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorldCacheError::ZeroCapacity => write!(f, "world cache capacity must be at least 1"),
        }
    }
}

impl std::error::Error for WorldCacheError {}

#[derive(Debug)]
struct CacheSlot {
    store: FragmentStore,
    last_used_tick: u64,
}

/// Bounded LRU cache of full multi-layer fragment snapshots, keyed by an
/// opaque world identity string.
///
/// Notes on determinism:
/// - Slots are keyed in a `BTreeMap` for stable traversal order.
/// - Eviction is LRU by `last_used_tick`, with a tie-break by key ordering.
#[derive(Debug)]
pub struct WorldCache {
    capacity: usize,
    tick: u64,
    slots: BTreeMap<String, CacheSlot>,
}

impl WorldCache {
    pub fn new(capacity: usize) -> Result<Self, WorldCacheError> {
        if capacity == 0 {
            return Err(WorldCacheError::ZeroCapacity);
        }
        Ok(Self {
            capacity,
            tick: 0,
            slots: BTreeMap::new(),
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.slots.contains_key(key)
    }

    /// Inserts or updates the snapshot for `key` as most-recently-used and
    /// evicts down to capacity. Returns the evicted keys.
    pub fn save(&mut self, key: impl Into<String>, store: FragmentStore) -> Vec<String> {
        self.tick += 1;
        self.slots.insert(
            key.into(),
            CacheSlot {
                store,
                last_used_tick: self.tick,
            },
        );
        self.evict_as_needed()
    }

    /// Borrows the snapshot for `key`, refreshing its recency in place. A
    /// miss registers a fresh empty store under `key` (evicting down to
    /// capacity) so the key is resident either way.
    ///
    /// Pending marks inside the snapshot are invalidated so completions
    /// from a previous activation cannot land.
    pub fn load(&mut self, key: &str) -> &mut FragmentStore {
        self.tick += 1;
        let tick = self.tick;
        if !self.slots.contains_key(key) {
            debug!(key, "world cache miss, registering fresh store");
            self.slots.insert(
                key.to_string(),
                CacheSlot {
                    store: FragmentStore::new(),
                    last_used_tick: tick,
                },
            );
            // The fresh slot holds the newest tick, so eviction only ever
            // picks older keys.
            let evicted = self.evict_as_needed();
            if !evicted.is_empty() {
                debug!(?evicted, "evicted to make room for fresh store");
            }
        }
        let slot = self.slots.entry(key.to_string()).or_insert_with(|| CacheSlot {
            store: FragmentStore::new(),
            last_used_tick: tick,
        });
        slot.last_used_tick = tick;
        slot.store.reset_pending();
        &mut slot.store
    }

    /// Removes and returns the snapshot for `key`, or a fresh empty store
    /// when absent.
    ///
    /// This is the exclusive-ownership counterpart to `load`: the caller
    /// owns the active store and is expected to `save` it back on the next
    /// world switch, which is what refreshes recency. While checked out the
    /// store cannot be evicted.
    pub fn take(&mut self, key: &str) -> FragmentStore {
        match self.slots.remove(key) {
            Some(slot) => {
                let mut store = slot.store;
                store.reset_pending();
                store
            }
            None => {
                debug!(key, "world cache miss, fresh store");
                FragmentStore::new()
            }
        }
    }

    /// Changes capacity; shrinking evicts oldest entries immediately.
    pub fn set_capacity(&mut self, capacity: usize) -> Result<Vec<String>, WorldCacheError> {
        if capacity == 0 {
            return Err(WorldCacheError::ZeroCapacity);
        }
        self.capacity = capacity;
        Ok(self.evict_as_needed())
    }

    pub fn clear_all(&mut self) {
        self.slots.clear();
    }

    fn evict_as_needed(&mut self) -> Vec<String> {
        let mut evicted = Vec::new();
        while self.slots.len() > self.capacity {
            let oldest = self
                .slots
                .iter()
                .min_by(|(ka, a), (kb, b)| {
                    a.last_used_tick
                        .cmp(&b.last_used_tick)
                        .then_with(|| ka.cmp(kb))
                })
                .map(|(k, _)| k.clone());

            // Non-empty here since len > capacity >= 1.
            let Some(key) = oldest else { break };
            self.slots.remove(&key);
            evicted.push(key);
        }
        evicted
    }
}

impl Default for WorldCache {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_WORLD_CACHE_CAPACITY,
            tick: 0,
            slots: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use foundation::coord::FragmentPos;

    use super::{WorldCache, WorldCacheError};
    use crate::engine::{GenerationOutcome, GenerationParams, LayerId, RecordingSource};
    use crate::store::FragmentStore;
    use crate::tile::Tile;

    #[test]
    fn load_refreshes_recency() {
        let mut cache = WorldCache::new(3).unwrap();
        cache.save("a", FragmentStore::new());
        cache.save("b", FragmentStore::new());
        cache.save("c", FragmentStore::new());

        // Touching "a" alone is enough to protect it.
        cache.load("a");

        let evicted = cache.save("d", FragmentStore::new());
        assert_eq!(evicted, vec!["b".to_string()]);
        assert!(cache.contains("a"));
        assert!(cache.contains("c"));
        assert!(cache.contains("d"));
        assert!(!cache.contains("b"));
    }

    #[test]
    fn load_miss_registers_fresh_store() {
        let mut cache = WorldCache::default();
        let store = cache.load("nope");
        assert_eq!(store.total_tile_count(), 0);
        assert!(cache.contains("nope"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn load_miss_eviction_spares_the_new_key() {
        let mut cache = WorldCache::new(1).unwrap();
        cache.save("a", FragmentStore::new());
        cache.load("b");
        assert!(cache.contains("b"));
        assert!(!cache.contains("a"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn consecutive_loads_return_the_same_snapshot() {
        let mut cache = WorldCache::new(3).unwrap();
        let mut source = RecordingSource::new();
        let layer = LayerId(0);
        let pos = FragmentPos::new(0, 0);

        let store = cache.load("a");
        store.get_or_request(&mut source, layer, pos, &GenerationParams::default());
        store.on_generation_complete(
            layer,
            pos,
            0,
            GenerationOutcome::Ok(Tile::filled(4, [1, 2, 3, 255])),
        );

        assert_eq!(cache.load("a").total_tile_count(), 1);
    }

    #[test]
    fn take_removes_slot_for_exclusive_ownership() {
        let mut cache = WorldCache::new(3).unwrap();
        cache.save("a", FragmentStore::new());

        let store = cache.take("a");
        assert_eq!(store.total_tile_count(), 0);
        assert!(!cache.contains("a"));

        // A take miss hands back a fresh store without registering it.
        cache.take("nope");
        assert!(cache.is_empty());
    }

    #[test]
    fn shrinking_capacity_evicts_immediately() {
        let mut cache = WorldCache::new(3).unwrap();
        cache.save("a", FragmentStore::new());
        cache.save("b", FragmentStore::new());
        cache.save("c", FragmentStore::new());

        let evicted = cache.set_capacity(1).unwrap();
        assert_eq!(evicted, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(cache.len(), 1);
        assert!(cache.contains("c"));
    }

    #[test]
    fn zero_capacity_is_rejected() {
        assert_eq!(WorldCache::new(0).unwrap_err(), WorldCacheError::ZeroCapacity);
        let mut cache = WorldCache::new(2).unwrap();
        assert!(cache.set_capacity(0).is_err());
        assert_eq!(cache.capacity(), 2);
    }

    #[test]
    fn clear_all_empties_cache() {
        let mut cache = WorldCache::default();
        cache.save("a", FragmentStore::new());
        cache.clear_all();
        assert!(cache.is_empty());
    }
}
