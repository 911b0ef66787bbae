//! Device Registry - phone records behind a cache-aside layer
//!
//! Lookups by IMEI are served from a shared cache; writes go to the record
//! store first and then invalidate the cache and notify other instances.

pub mod api;
pub mod aside;
pub mod bus;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod store;
pub mod tasks;

pub use api::AppState;
pub use aside::CacheAsideOrchestrator;
pub use config::Config;
pub use tasks::spawn_retry_task;
