//! Response DTOs for the registry API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::api::validation::ErrorCode;
use crate::cache::CacheStats;

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Lookups served from the cache
    pub hits: u64,
    /// Lookups that fell through to the store
    pub misses: u64,
    /// Snapshots written to the cache after a miss
    pub populations: u64,
    /// Populations refused because a newer write had fenced the key
    pub rejected_populations: u64,
    /// Invalidations fully applied (cache fence and publish)
    pub invalidations: u64,
    /// Absorbed cache failures
    pub cache_failures: u64,
    /// Absorbed bus failures
    pub bus_failures: u64,
    /// Invalidations waiting in the retry queue
    pub pending_retries: u64,
    /// Invalidations given up after the last retry
    pub abandoned_invalidations: u64,
    /// Entries currently held by the shared cache, if the backend reports it
    pub cached_entries: Option<usize>,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl StatsResponse {
    /// Creates a StatsResponse from a counters snapshot
    pub fn new(stats: &CacheStats, cached_entries: Option<usize>) -> Self {
        Self {
            hits: stats.hits,
            misses: stats.misses,
            populations: stats.populations,
            rejected_populations: stats.rejected_populations,
            invalidations: stats.invalidations,
            cache_failures: stats.cache_failures,
            bus_failures: stats.bus_failures,
            pending_retries: stats.pending_retries,
            abandoned_invalidations: stats.abandoned_invalidations,
            cached_entries,
            hit_rate: stats.hit_rate(),
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Numeric error code, as a string
    pub error_code: String,
    /// Human readable description
    pub message: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
        }
    }

    /// Creates an ErrorResponse for a registry error code
    pub fn from_code(code: ErrorCode) -> Self {
        Self::new(code.code(), code.message())
    }
}
