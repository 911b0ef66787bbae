//! Paged listing of records.

use serde::Serialize;

// == Page ==
/// One page of a listing, numbered from zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page: usize,
    pub size: usize,
    pub total_elements: usize,
    pub total_pages: usize,
}

impl<T> Page<T> {
    /// Builds a page from its content and the size of the whole listing.
    pub fn new(content: Vec<T>, page: usize, size: usize, total_elements: usize) -> Self {
        let total_pages = if size == 0 {
            0
        } else {
            total_elements.div_ceil(size)
        };
        Self {
            content,
            page,
            size,
            total_elements,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_pages_rounds_up() {
        let page: Page<u8> = Page::new(vec![], 0, 20, 41);
        assert_eq!(page.total_pages, 3);
    }

    #[test]
    fn test_zero_size_has_no_pages() {
        let page: Page<u8> = Page::new(vec![], 0, 0, 10);
        assert_eq!(page.total_pages, 0);
    }
}
