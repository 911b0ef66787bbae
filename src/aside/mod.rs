//! Cache-Aside Module
//!
//! Sequences reads and writes between the record store, the shared cache and
//! the invalidation bus. Nothing outside this module talks to the cache or
//! the bus directly.

mod client;
mod invalidator;
mod orchestrator;

#[cfg(test)]
mod property_tests;
#[cfg(test)]
pub(crate) mod test_support;

pub use client::{BoundedBus, BoundedCache};
pub use invalidator::{InvalidationJob, Invalidator};
pub use orchestrator::CacheAsideOrchestrator;
