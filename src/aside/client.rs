//! Bounded clients
//!
//! Wrap the shared cache and the invalidation bus so that every call is
//! keyed consistently and cut off after its configured timeout. A timeout
//! surfaces as an ordinary `CacheError`/`BusError`.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;

use crate::bus::{InvalidationBus, InvalidationEvent};
use crate::cache::{CacheStore, CachedRecord};
use crate::error::{BusError, CacheError};

// == Bounded Cache ==
/// Cache client that prefixes IMEIs and bounds every call.
#[derive(Clone)]
pub struct BoundedCache {
    inner: Arc<dyn CacheStore>,
    prefix: String,
    limit: Duration,
}

impl BoundedCache {
    pub fn new(inner: Arc<dyn CacheStore>, prefix: impl Into<String>, limit: Duration) -> Self {
        Self {
            inner,
            prefix: prefix.into(),
            limit,
        }
    }

    /// Cache key under which the snapshot for `imei` lives.
    pub fn key_for(&self, imei: &str) -> String {
        format!("{}{}", self.prefix, imei)
    }

    pub async fn get(&self, imei: &str) -> Result<Option<CachedRecord>, CacheError> {
        let key = self.key_for(imei);
        self.bounded(self.inner.get(&key)).await
    }

    pub async fn populate(&self, imei: &str, entry: CachedRecord) -> Result<bool, CacheError> {
        let key = self.key_for(imei);
        self.bounded(self.inner.populate(&key, entry)).await
    }

    pub async fn invalidate(&self, imei: &str, fence: u64) -> Result<(), CacheError> {
        let key = self.key_for(imei);
        self.bounded(self.inner.invalidate(&key, fence)).await
    }

    /// Entry count reported by the backend; `None` if unknown or too slow.
    pub async fn entry_count(&self) -> Option<usize> {
        timeout(self.limit, self.inner.entry_count())
            .await
            .ok()
            .flatten()
    }

    async fn bounded<T>(
        &self,
        call: impl std::future::Future<Output = Result<T, CacheError>>,
    ) -> Result<T, CacheError> {
        timeout(self.limit, call)
            .await
            .unwrap_or_else(|_| Err(CacheError::Timeout(self.limit.as_millis() as u64)))
    }
}

// == Bounded Bus ==
/// Bus client that bounds every publish.
#[derive(Clone)]
pub struct BoundedBus {
    inner: Arc<dyn InvalidationBus>,
    limit: Duration,
}

impl BoundedBus {
    pub fn new(inner: Arc<dyn InvalidationBus>, limit: Duration) -> Self {
        Self { inner, limit }
    }

    /// Publishes an invalidation event naming `imei`.
    pub async fn publish(&self, imei: &str) -> Result<(), BusError> {
        let event = InvalidationEvent::new(imei);
        timeout(self.limit, self.inner.publish(event))
            .await
            .unwrap_or_else(|_| Err(BusError::Timeout(self.limit.as_millis() as u64)))
    }

    pub fn channel(&self) -> &str {
        self.inner.channel()
    }
}
