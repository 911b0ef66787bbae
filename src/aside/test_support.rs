//! Test doubles for the cache-aside layer.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::oneshot;

use crate::bus::{InvalidationBus, InvalidationEvent};
use crate::cache::{CacheStore, CachedRecord};
use crate::error::{BusError, CacheError, StoreError};
use crate::models::{Page, Phone};
use crate::store::{InMemoryRecordStore, RecordStore};

/// Long enough that any bounded call gives up first
const STALL: Duration = Duration::from_secs(3600);

pub fn phone(imei: &str, name: &str) -> Phone {
    Phone {
        imei: Some(imei.to_string()),
        name: Some(name.to_string()),
        ..Default::default()
    }
}

// == Counting Store ==
/// Counts IMEI lookups that reach the store.
pub struct CountingStore {
    inner: InMemoryRecordStore,
    key_lookups: AtomicUsize,
}

impl CountingStore {
    pub fn new(inner: InMemoryRecordStore) -> Self {
        Self {
            inner,
            key_lookups: AtomicUsize::new(0),
        }
    }

    pub fn inner(&self) -> &InMemoryRecordStore {
        &self.inner
    }

    pub fn key_lookups(&self) -> usize {
        self.key_lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecordStore for CountingStore {
    async fn find_by_id(&self, id: &str) -> Result<Option<Phone>, StoreError> {
        self.inner.find_by_id(id).await
    }

    async fn find_by_secondary_key(&self, key: &str) -> Result<Option<Phone>, StoreError> {
        self.key_lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.find_by_secondary_key(key).await
    }

    async fn save(&self, record: Phone) -> Result<Phone, StoreError> {
        self.inner.save(record).await
    }

    async fn delete_by_id(&self, id: &str) -> Result<(), StoreError> {
        self.inner.delete_by_id(id).await
    }

    async fn find_page(&self, page: usize, size: usize) -> Result<Page<Phone>, StoreError> {
        self.inner.find_page(page, size).await
    }
}

// == Gated Store ==
/// Pauses the next IMEI lookup after it has read the store, until released.
pub struct GatedStore {
    inner: InMemoryRecordStore,
    gate: Mutex<Option<(oneshot::Sender<()>, oneshot::Receiver<()>)>>,
}

/// Test side of an armed [`GatedStore`].
pub struct Gate {
    /// Resolves once the lookup has its snapshot and is waiting
    pub reached: oneshot::Receiver<()>,
    /// Lets the lookup return
    pub release: oneshot::Sender<()>,
}

impl GatedStore {
    pub fn new(inner: InMemoryRecordStore) -> Self {
        Self {
            inner,
            gate: Mutex::new(None),
        }
    }

    /// Arms the gate for the next IMEI lookup.
    pub fn arm(&self) -> Gate {
        let (reached_tx, reached_rx) = oneshot::channel();
        let (release_tx, release_rx) = oneshot::channel();
        *self.gate.lock().unwrap() = Some((reached_tx, release_rx));
        Gate {
            reached: reached_rx,
            release: release_tx,
        }
    }
}

#[async_trait]
impl RecordStore for GatedStore {
    async fn find_by_id(&self, id: &str) -> Result<Option<Phone>, StoreError> {
        self.inner.find_by_id(id).await
    }

    async fn find_by_secondary_key(&self, key: &str) -> Result<Option<Phone>, StoreError> {
        let snapshot = self.inner.find_by_secondary_key(key).await;
        let armed = self.gate.lock().unwrap().take();
        if let Some((reached, release)) = armed {
            let _ = reached.send(());
            let _ = release.await;
        }
        snapshot
    }

    async fn save(&self, record: Phone) -> Result<Phone, StoreError> {
        self.inner.save(record).await
    }

    async fn delete_by_id(&self, id: &str) -> Result<(), StoreError> {
        self.inner.delete_by_id(id).await
    }

    async fn find_page(&self, page: usize, size: usize) -> Result<Page<Phone>, StoreError> {
        self.inner.find_page(page, size).await
    }
}

// == Stalled Cache ==
/// Cache whose every call hangs.
pub struct StalledCache;

#[async_trait]
impl CacheStore for StalledCache {
    async fn get(&self, _key: &str) -> Result<Option<CachedRecord>, CacheError> {
        tokio::time::sleep(STALL).await;
        Ok(None)
    }

    async fn populate(&self, _key: &str, _entry: CachedRecord) -> Result<bool, CacheError> {
        tokio::time::sleep(STALL).await;
        Ok(true)
    }

    async fn invalidate(&self, _key: &str, _fence: u64) -> Result<(), CacheError> {
        tokio::time::sleep(STALL).await;
        Ok(())
    }

    async fn entry_count(&self) -> Option<usize> {
        tokio::time::sleep(STALL).await;
        Some(0)
    }
}

// == Stalled Bus ==
/// Bus whose publish hangs.
pub struct StalledBus;

#[async_trait]
impl InvalidationBus for StalledBus {
    async fn publish(&self, _event: InvalidationEvent) -> Result<(), BusError> {
        tokio::time::sleep(STALL).await;
        Ok(())
    }

    fn channel(&self) -> &str {
        "stalled"
    }
}
