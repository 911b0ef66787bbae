//! Record Store Module
//!
//! Contract of the persistent store that is the single source of truth for
//! phone records, plus the in-memory backend used by the binary and tests.

mod memory;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::models::{Page, Phone};

pub use memory::InMemoryRecordStore;

// == Record Store ==
/// Durable storage of phone records, queryable by id and by IMEI.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Looks a record up by primary id.
    async fn find_by_id(&self, id: &str) -> Result<Option<Phone>, StoreError>;

    /// Looks a record up by IMEI.
    ///
    /// Fails with [`StoreError::NotUnique`] if more than one record carries
    /// the key.
    async fn find_by_secondary_key(&self, key: &str) -> Result<Option<Phone>, StoreError>;

    /// Inserts or replaces a record.
    ///
    /// Assigns an id when the record has none and stamps a fresh `version`
    /// on every call.
    async fn save(&self, record: Phone) -> Result<Phone, StoreError>;

    /// Removes a record. Removing an unknown id is not an error.
    async fn delete_by_id(&self, id: &str) -> Result<(), StoreError>;

    /// Returns one page of all records, ordered by id.
    async fn find_page(&self, page: usize, size: usize) -> Result<Page<Phone>, StoreError>;
}
