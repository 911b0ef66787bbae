//! In-memory shared cache
//!
//! Stands in for a remote cache service. One instance is shared, through an
//! `Arc`, by every orchestrator that should see the same cache.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::cache::{CacheStore, CachedRecord};
use crate::error::CacheError;

// == Slot ==
/// Per-key state: the current snapshot and the lowest version still accepted.
#[derive(Debug, Default)]
struct Slot {
    entry: Option<CachedRecord>,
    floor: u64,
}

// == Memory Cache Store ==
/// HashMap-backed cache with optional version fencing.
#[derive(Debug)]
pub struct MemoryCacheStore {
    /// Per-key storage
    slots: RwLock<HashMap<String, Slot>>,
    /// Refuse populations older than the key's floor
    fencing: bool,
    /// When set, every call fails with `CacheError::Unavailable`
    offline: AtomicBool,
}

impl MemoryCacheStore {
    // == Constructor ==
    /// Creates an empty cache.
    ///
    /// # Arguments
    /// * `fencing` - Whether invalidations fence out older populations
    pub fn new(fencing: bool) -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
            fencing,
            offline: AtomicBool::new(false),
        }
    }

    // == Offline Switch ==
    /// Simulates the cache service becoming unreachable (or reachable again).
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    // == Contains ==
    /// Checks whether a snapshot is held for `key`.
    pub async fn contains(&self, key: &str) -> bool {
        self.slots
            .read()
            .await
            .get(key)
            .is_some_and(|slot| slot.entry.is_some())
    }

    // == Length ==
    /// Returns the current number of snapshots.
    pub async fn len(&self) -> usize {
        self.slots
            .read()
            .await
            .values()
            .filter(|slot| slot.entry.is_some())
            .count()
    }

    /// Returns true if no snapshot is held.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn ensure_online(&self) -> Result<(), CacheError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(CacheError::Unavailable("in-memory cache is offline".to_string()))
        } else {
            Ok(())
        }
    }
}

impl Default for MemoryCacheStore {
    fn default() -> Self {
        Self::new(true)
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, key: &str) -> Result<Option<CachedRecord>, CacheError> {
        self.ensure_online()?;
        Ok(self
            .slots
            .read()
            .await
            .get(key)
            .and_then(|slot| slot.entry.clone()))
    }

    async fn populate(&self, key: &str, entry: CachedRecord) -> Result<bool, CacheError> {
        self.ensure_online()?;
        let mut slots = self.slots.write().await;
        let slot = slots.entry(key.to_string()).or_default();

        if self.fencing {
            if entry.version < slot.floor {
                return Ok(false);
            }
            slot.floor = entry.version;
        }
        slot.entry = Some(entry);
        Ok(true)
    }

    async fn invalidate(&self, key: &str, fence: u64) -> Result<(), CacheError> {
        self.ensure_online()?;
        let mut slots = self.slots.write().await;

        if self.fencing {
            let slot = slots.entry(key.to_string()).or_default();
            slot.entry = None;
            slot.floor = slot.floor.max(fence);
        } else {
            slots.remove(key);
        }
        Ok(())
    }

    async fn entry_count(&self) -> Option<usize> {
        if self.offline.load(Ordering::SeqCst) {
            return None;
        }
        Some(self.len().await)
    }
}
