//! Background Tasks Module
//!
//! Contains background tasks that run alongside request handling.
//!
//! # Tasks
//! - Invalidation retry: re-attempts cache fences and bus publishes that
//!   failed while a write was being served

mod retry;

pub use retry::{spawn_retry_task, RetryPolicy, RetryQueue};
