//! Cache Statistics Module
//!
//! Tracks how the cache-aside layer performs: hits, misses, populations and
//! the failures it absorbed.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Cache Stats ==
/// Point-in-time copy of the cache-aside counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Lookups answered from the cache
    pub hits: u64,
    /// Lookups that went to the store (absent, undecodable or unreachable cache)
    pub misses: u64,
    /// Snapshots written after a miss
    pub populations: u64,
    /// Populations refused because the key was fenced by a newer write
    pub rejected_populations: u64,
    /// Invalidations fully applied
    pub invalidations: u64,
    /// Absorbed cache failures
    pub cache_failures: u64,
    /// Absorbed bus failures
    pub bus_failures: u64,
    /// Invalidations currently queued for retry
    pub pending_retries: u64,
    /// Invalidations dropped after exhausting retries
    pub abandoned_invalidations: u64,
}

impl CacheStats {
    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

// == Stats Recorder ==
/// Lock-free counters shared by the orchestrator and the retry task.
#[derive(Debug, Default)]
pub struct StatsRecorder {
    hits: AtomicU64,
    misses: AtomicU64,
    populations: AtomicU64,
    rejected_populations: AtomicU64,
    invalidations: AtomicU64,
    cache_failures: AtomicU64,
    bus_failures: AtomicU64,
    pending_retries: AtomicU64,
    abandoned_invalidations: AtomicU64,
}

impl StatsRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_population(&self) {
        self.populations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected_population(&self) {
        self.rejected_populations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_invalidation(&self) {
        self.invalidations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_failure(&self) {
        self.cache_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_bus_failure(&self) {
        self.bus_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn retry_enqueued(&self) {
        self.pending_retries.fetch_add(1, Ordering::Relaxed);
    }

    /// Marks a queued retry as finished, successful or not.
    pub fn retry_finished(&self, abandoned: bool) {
        // Saturating: never wrap below zero
        let _ = self
            .pending_retries
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1));
        if abandoned {
            self.abandoned_invalidations.fetch_add(1, Ordering::Relaxed);
        }
    }

    // == Snapshot ==
    /// Copies the current counter values.
    pub fn snapshot(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            populations: self.populations.load(Ordering::Relaxed),
            rejected_populations: self.rejected_populations.load(Ordering::Relaxed),
            invalidations: self.invalidations.load(Ordering::Relaxed),
            cache_failures: self.cache_failures.load(Ordering::Relaxed),
            bus_failures: self.bus_failures.load(Ordering::Relaxed),
            pending_retries: self.pending_retries.load(Ordering::Relaxed),
            abandoned_invalidations: self.abandoned_invalidations.load(Ordering::Relaxed),
        }
    }
}
