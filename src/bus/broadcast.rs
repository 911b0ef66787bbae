//! In-process invalidation bus backed by a tokio broadcast channel.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::debug;

use super::{InvalidationBus, InvalidationEvent};
use crate::error::BusError;

/// Events buffered per subscriber before slow subscribers start lagging
const CHANNEL_CAPACITY: usize = 1024;

// == Broadcast Bus ==
/// Fans every published event out to all current subscribers.
#[derive(Debug)]
pub struct BroadcastBus {
    channel: String,
    sender: broadcast::Sender<InvalidationEvent>,
    published: AtomicU64,
    /// When set, every publish fails with `BusError::Publish`
    offline: AtomicBool,
}

impl BroadcastBus {
    // == Constructor ==
    /// Creates a bus publishing on `channel`.
    pub fn new(channel: impl Into<String>) -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            channel: channel.into(),
            sender,
            published: AtomicU64::new(0),
            offline: AtomicBool::new(false),
        }
    }

    // == Subscribe ==
    /// Registers a subscriber; it receives events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<InvalidationEvent> {
        self.sender.subscribe()
    }

    /// Number of events accepted so far.
    pub fn published(&self) -> u64 {
        self.published.load(Ordering::SeqCst)
    }

    // == Offline Switch ==
    /// Simulates the broker becoming unreachable (or reachable again).
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }
}

#[async_trait]
impl InvalidationBus for BroadcastBus {
    async fn publish(&self, event: InvalidationEvent) -> Result<(), BusError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(BusError::Publish(format!(
                "channel '{}' is unreachable",
                self.channel
            )));
        }

        let imei = event.payload().to_string();
        // Zero subscribers still counts as a successful publish
        match self.sender.send(event) {
            Ok(receivers) => {
                debug!(channel = %self.channel, imei = %imei, receivers, "invalidation published")
            }
            Err(_) => debug!(channel = %self.channel, imei = %imei, "invalidation published, no subscribers"),
        }
        self.published.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn channel(&self) -> &str {
        &self.channel
    }
}
