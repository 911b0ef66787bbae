//! Domain and wire models
//!
//! The phone record itself plus the DTOs used for
//! serializing/deserializing HTTP request and response bodies.

pub mod page;
pub mod phone;
pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use page::Page;
pub use phone::Phone;
pub use requests::PageQuery;
pub use responses::{ErrorResponse, HealthResponse, StatsResponse};
