//! Request DTOs for the registry API
//!
//! Phone bodies deserialize straight into [`crate::models::Phone`]; this
//! module holds the remaining query-string shapes.

use serde::Deserialize;

/// Default page size when the client does not ask for one
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Largest page size a client may request
pub const MAX_PAGE_SIZE: usize = 100;

/// Query string for the listing endpoint (GET /telefonos)
///
/// # Fields
/// - `page`: zero-based page number (default 0)
/// - `size`: records per page (default 20, capped at 100)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub page: Option<usize>,
    #[serde(default)]
    pub size: Option<usize>,
}

impl PageQuery {
    /// Resolves defaults and bounds into `(page, size)`.
    pub fn resolve(&self) -> (usize, usize) {
        let page = self.page.unwrap_or(0);
        let size = self
            .size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        (page, size)
    }
}
