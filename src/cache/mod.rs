//! Cache Module
//!
//! Shared key-value cache of phone snapshots keyed by IMEI. The cache has no
//! consistency guarantee of its own; callers keep it honest through
//! version fences set on invalidation.

mod entry;
mod memory;
mod stats;

use async_trait::async_trait;

use crate::error::CacheError;

// Re-export public types
pub use entry::CachedRecord;
pub use memory::MemoryCacheStore;
pub use stats::{CacheStats, StatsRecorder};

// == Cache Store ==
/// Client contract of the shared cache.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Returns the snapshot held for `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<CachedRecord>, CacheError>;

    /// Stores a snapshot taken after a cache miss.
    ///
    /// Returns `false` when the snapshot was refused because the key has been
    /// fenced at a newer version than `entry.version`.
    async fn populate(&self, key: &str, entry: CachedRecord) -> Result<bool, CacheError>;

    /// Drops the snapshot for `key` and refuses later populations older than
    /// `fence`.
    async fn invalidate(&self, key: &str, fence: u64) -> Result<(), CacheError>;

    /// Number of snapshots held, for backends that can tell cheaply.
    async fn entry_count(&self) -> Option<usize> {
        None
    }
}
