//! Plan Cache Module
//!
//! Maps logical plans to values derived from them (physical plans, compiled
//! operators). Lookup is structural: entries are bucketed by deep hash and a
//! hit additionally requires deep equality, so two independently built but
//! identical plans share one entry.
//!
//! ## Design
//!
//! Uses LRU (Least Recently Used) eviction with a configurable size limit.
//! Keys are stored as deep copies, so later rewrites of the caller's plan
//! cannot change a stored key.

use crate::config::CacheConfig;
use crate::lqp::deep::{lqp_deep_copy, lqp_deep_equals, lqp_hash};
use crate::lqp::node::LqpNodeRef;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Cache entry for one plan
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// Private copy of the plan this entry was stored under
    pub plan: LqpNodeRef,

    /// The cached value
    pub value: V,

    /// Logical time of the last access
    pub last_accessed: u64,

    /// Number of times this entry has been accessed
    pub access_count: usize,
}

/// Cache statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cache hits
    pub hits: usize,

    /// Number of cache misses
    pub misses: usize,

    /// Number of entries currently in cache
    pub size: usize,

    /// Number of entries evicted
    pub evictions: usize,
}

impl CacheStats {
    /// Calculate hit rate (0.0 to 1.0)
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Reset counters; `size` tracks the cache and is kept
    pub fn reset(&mut self) {
        self.hits = 0;
        self.misses = 0;
        self.evictions = 0;
    }
}

#[derive(Debug)]
struct Buckets<V> {
    /// deep hash -> entries whose plans share that hash
    entries: HashMap<u64, Vec<CacheEntry<V>>>,
    len: usize,
    clock: u64,
}

impl<V> Buckets<V> {
    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }
}

/// Thread-safe plan cache with LRU eviction
#[derive(Debug)]
pub struct LqpCache<V> {
    buckets: RwLock<Buckets<V>>,
    max_entries: usize,
    stats: RwLock<CacheStats>,
}

impl<V: Clone> LqpCache<V> {
    /// Create a cache holding at most `max_entries` plans (0 disables caching)
    pub fn new(max_entries: usize) -> Self {
        LqpCache {
            buckets: RwLock::new(Buckets {
                entries: HashMap::new(),
                len: 0,
                clock: 0,
            }),
            max_entries,
            stats: RwLock::new(CacheStats::default()),
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.max_entries)
    }

    /// Value stored for a plan deep-equal to `plan`
    pub fn get(&self, plan: &LqpNodeRef) -> Option<V> {
        let hash = lqp_hash(plan);
        let mut buckets = self.buckets.write();
        let now = buckets.tick();

        let hit = buckets
            .entries
            .get_mut(&hash)
            .and_then(|bucket| bucket.iter_mut().find(|entry| lqp_deep_equals(&entry.plan, plan)))
            .map(|entry| {
                entry.last_accessed = now;
                entry.access_count += 1;
                entry.value.clone()
            });

        let mut stats = self.stats.write();
        if hit.is_some() {
            stats.hits += 1;
        } else {
            stats.misses += 1;
        }
        hit
    }

    /// Store a value for `plan`, replacing the value of a deep-equal entry
    pub fn insert(&self, plan: &LqpNodeRef, value: V) {
        if self.max_entries == 0 {
            return;
        }
        let hash = lqp_hash(plan);
        let mut buckets = self.buckets.write();
        let now = buckets.tick();

        if let Some(entry) = buckets
            .entries
            .get_mut(&hash)
            .and_then(|bucket| bucket.iter_mut().find(|entry| lqp_deep_equals(&entry.plan, plan)))
        {
            entry.value = value;
            entry.last_accessed = now;
            return;
        }

        if buckets.len >= self.max_entries {
            self.evict_lru(&mut buckets);
        }

        buckets.entries.entry(hash).or_default().push(CacheEntry {
            plan: lqp_deep_copy(plan),
            value,
            last_accessed: now,
            access_count: 0,
        });
        buckets.len += 1;
        self.stats.write().size = buckets.len;
    }

    /// Remove the entry for `plan`; returns whether one existed
    pub fn invalidate(&self, plan: &LqpNodeRef) -> bool {
        let hash = lqp_hash(plan);
        let mut buckets = self.buckets.write();

        let Some(bucket) = buckets.entries.get_mut(&hash) else {
            return false;
        };
        let Some(position) = bucket
            .iter()
            .position(|entry| lqp_deep_equals(&entry.plan, plan))
        else {
            return false;
        };
        bucket.swap_remove(position);
        if bucket.is_empty() {
            buckets.entries.remove(&hash);
        }
        buckets.len -= 1;
        self.stats.write().size = buckets.len;
        true
    }

    /// Evict the least recently used entry
    fn evict_lru(&self, buckets: &mut Buckets<V>) {
        let oldest = buckets
            .entries
            .iter()
            .flat_map(|(&hash, bucket)| {
                bucket
                    .iter()
                    .enumerate()
                    .map(move |(index, entry)| (entry.last_accessed, hash, index))
            })
            .min();

        if let Some((_, hash, index)) = oldest {
            if let Some(bucket) = buckets.entries.get_mut(&hash) {
                bucket.swap_remove(index);
                if bucket.is_empty() {
                    buckets.entries.remove(&hash);
                }
            }
            buckets.len -= 1;
            self.stats.write().evictions += 1;
            tracing::debug!(plan_hash = hash, "evicted plan cache entry");
        }
    }

    pub fn len(&self) -> usize {
        self.buckets.read().len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        self.stats.read().clone()
    }

    pub fn reset_stats(&self) {
        self.stats.write().reset();
    }

    /// Clear all entries
    pub fn clear(&self) {
        let mut buckets = self.buckets.write();
        buckets.entries.clear();
        buckets.len = 0;
        self.stats.write().size = 0;
    }
}
