//! Cache-Aside Orchestrator
//!
//! The single place that sequences reads and writes between the record
//! store, the shared cache and the invalidation bus.
//!
//! Reads try the cache first and populate it after a store hit. Writes go to
//! the store first and only then fence the cache entry and publish the IMEI,
//! so a reader racing the write cannot repopulate a pre-write snapshot
//! without a later invalidation to remove it. Only store failures reach the
//! caller; cache and bus failures cost speed, never correctness.
//!
//! A concurrent read can still take its store snapshot before a write and
//! populate the cache after that write's invalidation. With version fencing
//! the cache refuses that population; without it the stale entry survives
//! until the next write to the same IMEI.

use std::sync::Arc;

use tracing::{debug, warn};

use super::client::{BoundedBus, BoundedCache};
use super::invalidator::{InvalidationJob, Invalidator};
use crate::bus::InvalidationBus;
use crate::cache::{CacheStats, CacheStore, CachedRecord, StatsRecorder};
use crate::config::Config;
use crate::error::StoreError;
use crate::models::{Page, Phone};
use crate::store::RecordStore;
use crate::tasks::RetryQueue;

// == Cache-Aside Orchestrator ==
/// Keeps IMEI lookups fast and the shared cache consistent with the store.
pub struct CacheAsideOrchestrator {
    store: Arc<dyn RecordStore>,
    cache: BoundedCache,
    invalidator: Arc<Invalidator>,
    stats: Arc<StatsRecorder>,
    retries: Option<RetryQueue>,
}

impl CacheAsideOrchestrator {
    // == Constructor ==
    /// Wires the collaborators together using the timeouts and key prefix
    /// from `config`. Without [`Self::with_retry_queue`], invalidations that
    /// fail are logged and dropped.
    pub fn new(
        store: Arc<dyn RecordStore>,
        cache: Arc<dyn CacheStore>,
        bus: Arc<dyn InvalidationBus>,
        config: &Config,
    ) -> Self {
        let stats = Arc::new(StatsRecorder::new());
        let cache = BoundedCache::new(cache, config.cache_key_prefix.clone(), config.cache_timeout());
        let bus = BoundedBus::new(bus, config.bus_timeout());
        let invalidator = Arc::new(Invalidator::new(cache.clone(), bus, stats.clone()));

        Self {
            store,
            cache,
            invalidator,
            stats,
            retries: None,
        }
    }

    /// Hands failed invalidations to `queue` instead of dropping them.
    pub fn with_retry_queue(mut self, queue: RetryQueue) -> Self {
        self.retries = Some(queue);
        self
    }

    /// Invalidator shared with the retry task.
    pub fn invalidator(&self) -> Arc<Invalidator> {
        self.invalidator.clone()
    }

    /// Counters shared with the retry queue.
    pub fn stats_recorder(&self) -> Arc<StatsRecorder> {
        self.stats.clone()
    }

    // == Get By Secondary Key ==
    /// Looks a phone up by IMEI, cache first.
    ///
    /// An undecodable or unreachable cache counts as a miss. Store hits are
    /// written back to the cache on a best-effort basis; absent records are
    /// never cached.
    pub async fn get_by_secondary_key(&self, imei: &str) -> Result<Option<Phone>, StoreError> {
        if imei.is_empty() {
            return Ok(None);
        }

        match self.cache.get(imei).await {
            Ok(Some(entry)) => match entry.decode() {
                Ok(record) => {
                    self.stats.record_hit();
                    debug!(
                        imei = %imei,
                        version = entry.version,
                        age_ms = entry.age_ms(),
                        "cache hit"
                    );
                    return Ok(Some(record));
                }
                Err(err) => {
                    self.stats.record_cache_failure();
                    warn!(imei = %imei, error = %err, "undecodable cache entry, reading store");
                }
            },
            Ok(None) => debug!(imei = %imei, "cache miss"),
            Err(err) => {
                self.stats.record_cache_failure();
                warn!(imei = %imei, error = %err, "cache lookup failed, reading store");
            }
        }
        self.stats.record_miss();

        let found = self.store.find_by_secondary_key(imei).await?;
        if let Some(record) = &found {
            self.populate(imei, record).await;
        }
        Ok(found)
    }

    // == Save ==
    /// Persists a phone, then invalidates its IMEI.
    ///
    /// When an update moves a record to a different IMEI, the previous IMEI
    /// is invalidated too.
    pub async fn save(&self, record: Phone) -> Result<Phone, StoreError> {
        let previous_imei = match record.id.as_deref() {
            Some(id) => self
                .store
                .find_by_id(id)
                .await?
                .and_then(|previous| previous.secondary_key().map(str::to_string)),
            None => None,
        };

        let saved = self.store.save(record).await?;
        let current_imei = saved.secondary_key();

        if let Some(old) = previous_imei.as_deref() {
            if current_imei != Some(old) {
                self.invalidate(old, saved.version).await;
            }
        }
        if let Some(imei) = current_imei {
            self.invalidate(imei, saved.version).await;
        }
        Ok(saved)
    }

    // == Delete ==
    /// Removes a phone by id, then invalidates its IMEI.
    ///
    /// Unknown ids publish nothing.
    pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let existing = self.store.find_by_id(id).await?;
        self.store.delete_by_id(id).await?;

        match existing {
            Some(record) => {
                if let Some(imei) = record.secondary_key() {
                    // The deleted version itself must not come back
                    self.invalidate(imei, record.version + 1).await;
                }
            }
            None => debug!(id = %id, "delete of unknown id, nothing to invalidate"),
        }
        Ok(())
    }

    // == Pass-throughs ==
    /// Looks a phone up by id. Not cached.
    pub async fn find_by_id(&self, id: &str) -> Result<Option<Phone>, StoreError> {
        self.store.find_by_id(id).await
    }

    /// Lists phones page by page. Not cached.
    pub async fn list(&self, page: usize, size: usize) -> Result<Page<Phone>, StoreError> {
        self.store.find_page(page, size).await
    }

    // == Stats ==
    /// Returns current counters.
    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot()
    }

    /// Number of snapshots in the shared cache, when the backend reports it.
    pub async fn cached_entries(&self) -> Option<usize> {
        self.cache.entry_count().await
    }

    async fn populate(&self, imei: &str, record: &Phone) {
        let entry = match CachedRecord::encode(record) {
            Ok(entry) => entry,
            Err(err) => {
                self.stats.record_cache_failure();
                warn!(imei = %imei, error = %err, "could not encode record for cache");
                return;
            }
        };

        match self.cache.populate(imei, entry).await {
            Ok(true) => {
                self.stats.record_population();
                debug!(imei = %imei, version = record.version, "cache populated");
            }
            Ok(false) => {
                self.stats.record_rejected_population();
                debug!(
                    imei = %imei,
                    version = record.version,
                    "cache population refused, a newer write fenced the key"
                );
            }
            Err(err) => {
                self.stats.record_cache_failure();
                warn!(imei = %imei, error = %err, "cache population failed");
            }
        }
    }

    async fn invalidate(&self, imei: &str, fence: u64) {
        let job = self.invalidator.apply(InvalidationJob::new(imei, fence)).await;
        if job.is_done() {
            return;
        }

        match &self.retries {
            Some(queue) => queue.enqueue(job),
            None => warn!(
                imei = %imei,
                cache_pending = job.cache_pending,
                publish_pending = job.publish_pending,
                "invalidation incomplete and no retry queue configured"
            ),
        }
    }
}
