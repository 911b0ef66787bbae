//! In-memory record store.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::RecordStore;
use crate::error::StoreError;
use crate::models::{Page, Phone};

// == In-Memory Record Store ==
/// Record store backed by an ordered map.
///
/// Versions come from one counter shared by every record, so a record
/// re-created under an IMEI that was used before always gets a larger
/// version than its predecessor.
#[derive(Debug)]
pub struct InMemoryRecordStore {
    /// Records keyed by id
    records: RwLock<BTreeMap<String, Phone>>,
    /// Next version to hand out
    version_counter: AtomicU64,
    /// When set, every call fails with `StoreError::Unavailable`
    offline: AtomicBool,
}

impl InMemoryRecordStore {
    // == Constructor ==
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            records: RwLock::new(BTreeMap::new()),
            version_counter: AtomicU64::new(1),
            offline: AtomicBool::new(false),
        }
    }

    // == Offline Switch ==
    /// Simulates the store becoming unreachable (or reachable again).
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    // == Length ==
    /// Returns the number of stored records.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Returns true if no records are stored.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    fn ensure_online(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("in-memory store is offline".to_string()))
        } else {
            Ok(())
        }
    }
}

impl Default for InMemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn find_by_id(&self, id: &str) -> Result<Option<Phone>, StoreError> {
        self.ensure_online()?;
        Ok(self.records.read().await.get(id).cloned())
    }

    async fn find_by_secondary_key(&self, key: &str) -> Result<Option<Phone>, StoreError> {
        self.ensure_online()?;
        let records = self.records.read().await;
        let mut matches = records
            .values()
            .filter(|record| record.imei.as_deref() == Some(key));

        let found = matches.next().cloned();
        if matches.next().is_some() {
            return Err(StoreError::NotUnique(key.to_string()));
        }
        Ok(found)
    }

    async fn save(&self, mut record: Phone) -> Result<Phone, StoreError> {
        self.ensure_online()?;
        let id = record
            .id
            .get_or_insert_with(|| Uuid::new_v4().to_string())
            .clone();

        let mut records = self.records.write().await;
        // Stamped under the write lock so versions follow commit order
        record.version = self.version_counter.fetch_add(1, Ordering::SeqCst);
        records.insert(id.clone(), record.clone());

        debug!(id = %id, version = record.version, "record saved");
        Ok(record)
    }

    async fn delete_by_id(&self, id: &str) -> Result<(), StoreError> {
        self.ensure_online()?;
        self.records.write().await.remove(id);
        Ok(())
    }

    async fn find_page(&self, page: usize, size: usize) -> Result<Page<Phone>, StoreError> {
        self.ensure_online()?;
        let records = self.records.read().await;
        let content = records
            .values()
            .skip(page.saturating_mul(size))
            .take(size)
            .cloned()
            .collect();
        Ok(Page::new(content, page, size, records.len()))
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn phone(imei: &str, name: &str) -> Phone {
        Phone {
            imei: Some(imei.to_string()),
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_save_assigns_id_and_version() {
        let store = InMemoryRecordStore::new();

        let saved = store.save(phone("111", "A")).await.unwrap();

        assert!(saved.id.is_some());
        assert_eq!(saved.version, 1);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_save_with_id_replaces_and_bumps_version() {
        let store = InMemoryRecordStore::new();
        let first = store.save(phone("111", "A")).await.unwrap();

        let mut update = phone("111", "B");
        update.id = first.id.clone();
        let second = store.save(update).await.unwrap();

        assert_eq!(second.id, first.id);
        assert!(second.version > first.version);
        assert_eq!(store.len().await, 1);
        let found = store.find_by_id(first.id.as_deref().unwrap()).await.unwrap();
        assert_eq!(found.unwrap().name.as_deref(), Some("B"));
    }

    #[tokio::test]
    async fn test_versions_increase_across_records() {
        let store = InMemoryRecordStore::new();
        let a = store.save(phone("111", "A")).await.unwrap();
        let b = store.save(phone("222", "B")).await.unwrap();
        assert!(b.version > a.version);
    }

    #[tokio::test]
    async fn test_find_by_secondary_key() {
        let store = InMemoryRecordStore::new();
        store.save(phone("111", "A")).await.unwrap();

        let found = store.find_by_secondary_key("111").await.unwrap();
        assert_eq!(found.unwrap().name.as_deref(), Some("A"));
        assert!(store.find_by_secondary_key("999").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_by_secondary_key_not_unique() {
        let store = InMemoryRecordStore::new();
        store.save(phone("111", "A")).await.unwrap();
        store.save(phone("111", "B")).await.unwrap();

        let result = store.find_by_secondary_key("111").await;
        assert_eq!(result, Err(StoreError::NotUnique("111".to_string())));
    }

    #[tokio::test]
    async fn test_delete_by_id() {
        let store = InMemoryRecordStore::new();
        let saved = store.save(phone("111", "A")).await.unwrap();
        let id = saved.id.unwrap();

        store.delete_by_id(&id).await.unwrap();
        assert!(store.find_by_id(&id).await.unwrap().is_none());
        assert!(store.is_empty().await);

        // Unknown ids are fine
        store.delete_by_id(&id).await.unwrap();
    }

    #[tokio::test]
    async fn test_find_page() {
        let store = InMemoryRecordStore::new();
        for i in 0..5 {
            store.save(phone(&format!("{i}"), "A")).await.unwrap();
        }

        let page = store.find_page(1, 2).await.unwrap();
        assert_eq!(page.content.len(), 2);
        assert_eq!(page.total_elements, 5);
        assert_eq!(page.total_pages, 3);

        let last = store.find_page(2, 2).await.unwrap();
        assert_eq!(last.content.len(), 1);
    }

    #[tokio::test]
    async fn test_offline_store_fails() {
        let store = InMemoryRecordStore::new();
        store.set_offline(true);

        assert!(matches!(
            store.find_by_id("x").await,
            Err(StoreError::Unavailable(_))
        ));
        assert!(matches!(
            store.save(phone("111", "A")).await,
            Err(StoreError::Unavailable(_))
        ));

        store.set_offline(false);
        assert!(store.find_by_id("x").await.unwrap().is_none());
    }
}
