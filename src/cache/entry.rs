//! Cache Entry Module
//!
//! Defines the snapshot stored in the shared cache for one IMEI.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::CacheError;
use crate::models::Phone;

// == Cached Record ==
/// Serialized phone snapshot plus the store version it was taken at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedRecord {
    /// Store version of the snapshotted record
    pub version: u64,
    /// JSON encoding of the record
    pub payload: String,
    /// Creation timestamp (Unix milliseconds)
    pub cached_at: u64,
}

impl CachedRecord {
    // == Constructor ==
    /// Wraps an already encoded payload.
    pub fn new(version: u64, payload: String) -> Self {
        Self {
            version,
            payload,
            cached_at: current_timestamp_ms(),
        }
    }

    // == Encode ==
    /// Snapshots a record for the cache.
    pub fn encode(record: &Phone) -> Result<Self, CacheError> {
        let payload = serde_json::to_string(record)?;
        Ok(Self::new(record.version, payload))
    }

    // == Decode ==
    /// Rebuilds the record from the payload.
    pub fn decode(&self) -> Result<Phone, CacheError> {
        Ok(serde_json::from_str(&self.payload)?)
    }

    /// Milliseconds since the snapshot was taken.
    pub fn age_ms(&self) -> u64 {
        current_timestamp_ms().saturating_sub(self.cached_at)
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default()
}
