//! String interner: a bounded, shared cache of decoded strings.
//!
//! The JSON reader and string-producing validators funnel short strings
//! through this cache so repeated keys and values share one allocation.
//! The cache is the only state shared across concurrent calls, so it is
//! sharded behind [`parking_lot::Mutex`]es. Slots are direct-mapped:
//! replacement is a plain overwrite, which keeps eviction O(1) and memory
//! bounded without LRU bookkeeping.

use alloc::sync::Arc;
use core::hash::{Hash, Hasher};
use std::collections::hash_map::DefaultHasher;

use once_cell::sync::Lazy;
use parking_lot::Mutex;

/// Which decoded strings pass through the cache.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum CacheMode {
    /// Cache mapping keys and string values.
    #[default]
    All,
    /// Cache mapping keys only.
    Keys,
    /// No caching.
    None,
}

/// Cache tuning knobs.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CacheConfig {
    pub mode: CacheMode,
    /// Total number of cache slots across all shards.
    pub capacity: usize,
    /// Strings longer than this many bytes bypass the cache.
    pub max_len: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            mode: CacheMode::All,
            capacity: DEFAULT_CAPACITY,
            max_len: DEFAULT_MAX_LEN,
        }
    }
}

/// Default number of cache slots.
pub const DEFAULT_CAPACITY: usize = 16_384;

/// Default maximum length of a cached string, in bytes.
pub const DEFAULT_MAX_LEN: usize = 64;

const SHARDS: usize = 16;

/// A sharded, fixed-capacity string cache handing out shared instances.
///
/// Safe for concurrent lookups and inserts from parallel validations.
pub struct StringCache {
    shards: [Mutex<Box<[Option<Arc<str>>]>>; SHARDS],
    slots_per_shard: usize,
    max_len: usize,
}

impl StringCache {
    /// Creates a cache with the given capacity and maximum string length.
    /// The capacity is rounded up so every shard holds at least one slot.
    #[must_use]
    pub fn new(config: &CacheConfig) -> Self {
        let slots_per_shard = config.capacity.div_ceil(SHARDS).max(1);
        Self {
            shards: core::array::from_fn(|_| {
                Mutex::new(alloc::vec![None; slots_per_shard].into_boxed_slice())
            }),
            slots_per_shard,
            max_len: config.max_len,
        }
    }

    /// The process-wide default instance, used when no per-call cache is
    /// configured.
    #[must_use]
    pub fn global() -> &'static StringCache {
        static GLOBAL: Lazy<StringCache> = Lazy::new(|| StringCache::new(&CacheConfig::default()));
        &GLOBAL
    }

    /// Returns a shared instance of `s`, caching it if it qualifies.
    ///
    /// Over-long strings get a fresh allocation and never touch the cache.
    #[must_use]
    pub fn intern(&self, s: &str) -> Arc<str> {
        if s.len() > self.max_len {
            return Arc::from(s);
        }

        let mut hasher = DefaultHasher::new();
        s.hash(&mut hasher);
        let hash = hasher.finish() as usize;

        let shard = &self.shards[hash % SHARDS];
        let slot = (hash / SHARDS) % self.slots_per_shard;

        let mut slots = shard.lock();
        if let Some(cached) = &slots[slot] {
            if cached.as_ref() == s {
                return Arc::clone(cached);
            }
        }
        let fresh: Arc<str> = Arc::from(s);
        slots[slot] = Some(Arc::clone(&fresh));
        fresh
    }
}

impl core::fmt::Debug for StringCache {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StringCache")
            .field("slots_per_shard", &self.slots_per_shard)
            .field("max_len", &self.max_len)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_strings_share_storage() {
        let cache = StringCache::new(&CacheConfig::default());
        let a = cache.intern("pet_type");
        let b = cache.intern("pet_type");
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn long_strings_bypass_cache() {
        let cache = StringCache::new(&CacheConfig {
            mode: CacheMode::All,
            capacity: 8,
            max_len: 4,
        });
        let a = cache.intern("longer-than-four");
        let b = cache.intern("longer-than-four");
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(a, b);
    }

    #[test]
    fn collisions_replace_in_bounded_memory() {
        let cache = StringCache::new(&CacheConfig {
            mode: CacheMode::All,
            capacity: 1,
            max_len: 64,
        });
        // With a single slot per shard, distinct strings keep replacing
        // each other yet every lookup still returns the right text.
        for i in 0..100 {
            let s = alloc::format!("key-{i}");
            assert_eq!(cache.intern(&s).as_ref(), s.as_str());
        }
    }

    #[test]
    fn concurrent_interning() {
        let cache = Arc::new(StringCache::new(&CacheConfig::default()));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    for i in 0..500 {
                        let s = alloc::format!("k{}", i % 32);
                        assert_eq!(cache.intern(&s).as_ref(), s.as_str());
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
    }
}
