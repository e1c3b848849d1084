//! Process-wide memoization of aggregation results.
//!
//! The cache is keyed by canonical [`AggregationQuery`] values and bounded by
//! an entry count. Eviction is least-recently-used by a monotonic access
//! tick, ties broken by key order, so the victim is always deterministic.
//!
//! Results are handed out as `Arc`s. The dataset is immutable, so a cached
//! result never goes stale; the cache only trades memory for recomputation.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use flood_impact_analytics_models::{AggregationQuery, AggregationResult};
use serde::Serialize;

/// Number of results kept when no capacity is configured.
pub const DEFAULT_CACHE_CAPACITY: usize = 256;

#[derive(Debug)]
struct CacheEntry {
    result: Arc<AggregationResult>,
    last_used_tick: u64,
}

#[derive(Debug, Default)]
struct CacheState {
    tick: u64,
    entries: BTreeMap<AggregationQuery, CacheEntry>,
}

impl CacheState {
    fn touch(&mut self, key: &AggregationQuery) -> Option<Arc<AggregationResult>> {
        self.tick += 1;
        let tick = self.tick;
        self.entries.get_mut(key).map(|entry| {
            entry.last_used_tick = tick;
            Arc::clone(&entry.result)
        })
    }

    fn least_recently_used(&self) -> Option<AggregationQuery> {
        self.entries
            .iter()
            .min_by(|(ka, ea), (kb, eb)| {
                ea.last_used_tick
                    .cmp(&eb.last_used_tick)
                    .then_with(|| ka.cmp(kb))
            })
            .map(|(k, _)| *k)
    }
}

/// Hit, miss, and eviction counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    /// Lookups served from the cache.
    pub hits: u64,
    /// Lookups that ran the computation.
    pub misses: u64,
    /// Entries dropped to stay within capacity.
    pub evictions: u64,
    /// Entries currently held.
    pub entries: usize,
    /// Maximum number of entries.
    pub capacity: usize,
}

/// Bounded, thread-safe LRU cache of aggregation results.
///
/// Safe to share between sessions behind an `Arc`. The computation runs
/// outside the lock, so two sessions missing on the same query at once may
/// both compute it; the results are identical and the later insert wins.
#[derive(Debug)]
pub struct QueryCache {
    capacity: usize,
    state: Mutex<CacheState>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

impl QueryCache {
    /// Creates a cache holding at most `capacity` results (at least one).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            state: Mutex::new(CacheState::default()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Maximum number of entries.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the cached result for `query`, if present, marking it as
    /// recently used.
    #[must_use]
    pub fn get(&self, query: &AggregationQuery) -> Option<Arc<AggregationResult>> {
        self.lock().touch(&query.canonical())
    }

    /// Returns the cached result for `query`, or runs `compute` and caches
    /// its result.
    ///
    /// Errors from `compute` are returned as-is and never cached.
    ///
    /// # Errors
    ///
    /// Propagates the error returned by `compute`.
    pub fn get_or_compute<E>(
        &self,
        query: &AggregationQuery,
        compute: impl FnOnce(&AggregationQuery) -> Result<AggregationResult, E>,
    ) -> Result<Arc<AggregationResult>, E> {
        let key = query.canonical();

        if let Some(result) = self.lock().touch(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            log::trace!("Cache hit for {key:?}");
            return Ok(result);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        log::debug!("Cache miss for {key:?}");

        let result = Arc::new(compute(&key)?);

        let mut state = self.lock();
        state.tick += 1;
        let tick = state.tick;
        state.entries.insert(
            key,
            CacheEntry {
                result: Arc::clone(&result),
                last_used_tick: tick,
            },
        );

        while state.entries.len() > self.capacity {
            let Some(victim) = state.least_recently_used() else {
                break;
            };
            state.entries.remove(&victim);
            self.evictions.fetch_add(1, Ordering::Relaxed);
            log::debug!("Evicted {victim:?} from query cache");
        }
        drop(state);

        Ok(result)
    }

    /// Number of cached results.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// Whether the cache holds no results.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    /// Drops every cached result. Counters are kept.
    pub fn clear(&self) {
        self.lock().entries.clear();
    }

    /// Current counters.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            entries: self.len(),
            capacity: self.capacity,
        }
    }
}
