//! Invalidation steps
//!
//! An invalidation is two independent steps: fence the cache entry, then
//! publish the IMEI on the bus. Each step that fails stays pending on the
//! job so a retry only repeats what is missing, and a successful publish is
//! never sent twice.

use std::sync::Arc;

use tracing::{debug, warn};

use super::client::{BoundedBus, BoundedCache};
use crate::cache::StatsRecorder;

// == Invalidation Job ==
/// Outstanding invalidation work for one IMEI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidationJob {
    pub imei: String,
    /// Lowest record version the cache may accept for this IMEI afterwards
    pub fence: u64,
    pub cache_pending: bool,
    pub publish_pending: bool,
    /// Attempts made so far
    pub attempts: u32,
}

impl InvalidationJob {
    pub fn new(imei: impl Into<String>, fence: u64) -> Self {
        Self {
            imei: imei.into(),
            fence,
            cache_pending: true,
            publish_pending: true,
            attempts: 0,
        }
    }

    /// True once both steps have succeeded.
    pub fn is_done(&self) -> bool {
        !self.cache_pending && !self.publish_pending
    }
}

// == Invalidator ==
/// Applies invalidation jobs against the cache and the bus.
pub struct Invalidator {
    cache: BoundedCache,
    bus: BoundedBus,
    stats: Arc<StatsRecorder>,
}

impl Invalidator {
    pub fn new(cache: BoundedCache, bus: BoundedBus, stats: Arc<StatsRecorder>) -> Self {
        Self { cache, bus, stats }
    }

    pub fn stats(&self) -> &StatsRecorder {
        &self.stats
    }

    // == Apply ==
    /// Attempts every pending step once and returns what is still pending.
    ///
    /// Failures are logged and counted, never returned.
    pub async fn apply(&self, mut job: InvalidationJob) -> InvalidationJob {
        job.attempts += 1;

        if job.cache_pending {
            match self.cache.invalidate(&job.imei, job.fence).await {
                Ok(()) => job.cache_pending = false,
                Err(err) => {
                    self.stats.record_cache_failure();
                    warn!(
                        imei = %job.imei,
                        attempt = job.attempts,
                        error = %err,
                        "cache invalidation failed"
                    );
                }
            }
        }

        if job.publish_pending {
            match self.bus.publish(&job.imei).await {
                Ok(()) => job.publish_pending = false,
                Err(err) => {
                    self.stats.record_bus_failure();
                    warn!(
                        imei = %job.imei,
                        channel = %self.bus.channel(),
                        attempt = job.attempts,
                        error = %err,
                        "invalidation publish failed"
                    );
                }
            }
        }

        if job.is_done() {
            self.stats.record_invalidation();
            debug!(imei = %job.imei, fence = job.fence, "cache invalidated");
        }
        job
    }
}
