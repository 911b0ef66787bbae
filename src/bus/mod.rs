//! Invalidation Bus Module
//!
//! Publish/subscribe channel that tells other service instances an IMEI has
//! changed. Events are fire-and-forget: no acknowledgment and no ordering
//! across events.

mod broadcast;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::BusError;

pub use broadcast::BroadcastBus;

/// Channel name used when none is configured
pub const DEFAULT_CHANNEL: &str = "device-cache-invalidation";

// == Invalidation Event ==
/// Notice that the record behind an IMEI changed or disappeared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvalidationEvent {
    pub secondary_key: String,
    pub emitted_at: DateTime<Utc>,
}

impl InvalidationEvent {
    /// Creates an event stamped with the current time.
    pub fn new(secondary_key: impl Into<String>) -> Self {
        Self {
            secondary_key: secondary_key.into(),
            emitted_at: Utc::now(),
        }
    }

    /// Wire payload: the IMEI and nothing else.
    pub fn payload(&self) -> &str {
        &self.secondary_key
    }
}

// == Invalidation Bus ==
/// Client contract of the invalidation channel.
#[async_trait]
pub trait InvalidationBus: Send + Sync {
    /// Publishes one event on the channel.
    async fn publish(&self, event: InvalidationEvent) -> Result<(), BusError>;

    /// Name of the channel events are published to.
    fn channel(&self) -> &str;
}
