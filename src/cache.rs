//! Path-scan memoization.
//!
//! Matching a path walks the ordered path list and tries every pattern until
//! one fits. [`MatchCache`] remembers the outcome of that scan per path, the
//! matched record and its captured params, or the fact that nothing matched.
//! It is gated behind the `cache` feature and uses the [`lru`] crate.
//!
//! Any change to the route table invalidates the whole cache.
//!
//! # Examples
//!
//! ```
//! use navigator_pipeline::cache::MatchCache;
//!
//! let mut cache = MatchCache::with_capacity(16);
//! assert!(cache.get("/users/1").is_none());
//! cache.insert("/users/1".to_string(), None);
//! assert_eq!(cache.get("/users/1"), Some(None));
//! assert_eq!(cache.stats().hits, 1);
//! assert_eq!(cache.stats().misses, 1);
//! ```

use crate::options::DEFAULT_CACHE_CAPACITY;
use crate::record::RecordId;
use crate::{debug_log, trace_log, RouteParams};
use lru::LruCache;
use std::num::NonZeroUsize;

/// Result of a path scan: the first matching record and its params.
pub type ScanResult = Option<(RecordId, RouteParams)>;

/// Counters tracking cache effectiveness.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered from the cache.
    pub hits: usize,
    /// Lookups that had to scan.
    pub misses: usize,
    /// Number of full invalidations.
    pub invalidations: usize,
}

impl CacheStats {
    /// Hit rate in `0.0..=1.0`, `0.0` before the first lookup.
    #[allow(clippy::cast_precision_loss)]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// LRU cache of path-scan results.
#[derive(Debug)]
pub struct MatchCache {
    entries: LruCache<String, ScanResult>,
    stats: CacheStats,
}

impl MatchCache {
    /// Create a cache with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }

    /// Create a cache holding at most `capacity` paths (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
            stats: CacheStats::default(),
        }
    }

    /// Look up a previous scan of `path`.
    ///
    /// The outer `Option` is the cache hit, the inner one the scan result.
    pub fn get(&mut self, path: &str) -> Option<ScanResult> {
        if let Some(entry) = self.entries.get(path) {
            self.stats.hits += 1;
            trace_log!("Match cache hit for '{}'", path);
            Some(entry.clone())
        } else {
            self.stats.misses += 1;
            trace_log!("Match cache miss for '{}'", path);
            None
        }
    }

    /// Remember the scan result of `path`.
    pub fn insert(&mut self, path: String, result: ScanResult) {
        self.entries.push(path, result);
    }

    /// Drop every entry and count an invalidation.
    pub fn clear(&mut self) {
        let removed = self.entries.len();
        self.entries.clear();
        self.stats.invalidations += 1;
        debug_log!(
            "Match cache cleared: {} entries removed ({} invalidations, hit rate {:.1}%)",
            removed,
            self.stats.invalidations,
            self.stats.hit_rate() * 100.0
        );
    }

    /// Current counters.
    pub const fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Number of cached paths.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` when nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for MatchCache {
    fn default() -> Self {
        Self::new()
    }
}
