//! Pagination for the public feed
//!
//! Pages are 0-indexed: page `n` covers rows `n * per_page ..`.

use serde::Serialize;

/// Fixed page size of the public feed.
pub const MEMOS_PER_PAGE: u32 = 100;

/// Pagination parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// Page number (0-indexed)
    pub page: u32,
    /// Items per page (at least 1)
    pub per_page: u32,
}

impl PageRequest {
    /// Per page is clamped to a minimum of 1.
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page,
            per_page: per_page.max(1),
        }
    }

    /// Page `page` of the public feed.
    pub fn feed(page: u32) -> Self {
        Self::new(page, MEMOS_PER_PAGE)
    }

    /// SQL OFFSET value.
    pub fn offset(&self) -> i64 {
        i64::from(self.page) * i64::from(self.per_page)
    }

    /// SQL LIMIT value.
    pub fn limit(&self) -> i64 {
        i64::from(self.per_page)
    }
}

/// One page of results plus the total row count.
#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    /// Total count across all pages
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
}

impl<T> Paginated<T> {
    /// 1-based position of the first row of this page.
    pub fn page_start(&self) -> i64 {
        PageRequest::new(self.page, self.per_page).offset() + 1
    }

    /// 1-based position of the last row this page could hold.
    pub fn page_end(&self) -> i64 {
        i64::from(self.per_page) * (i64::from(self.page) + 1)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Rows exist past this page.
    pub fn has_next(&self) -> bool {
        self.page_end() < self.total
    }

    pub fn has_prev(&self) -> bool {
        self.page > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(page: u32, total: i64) -> Paginated<()> {
        Paginated {
            items: vec![],
            total,
            page,
            per_page: 100,
        }
    }

    #[test]
    fn offset_calculation() {
        assert_eq!(PageRequest::feed(0).offset(), 0);
        assert_eq!(PageRequest::feed(1).offset(), 100);
        assert_eq!(PageRequest::new(3, 25).offset(), 75);
        assert_eq!(PageRequest::feed(u32::MAX).offset(), i64::from(u32::MAX) * 100);
    }

    #[test]
    fn clamps_per_page() {
        assert_eq!(PageRequest::new(0, 0).per_page, 1);
        assert_eq!(PageRequest::new(0, 0).limit(), 1);
    }

    #[test]
    fn page_bounds() {
        let p = page(0, 120);
        assert_eq!(p.page_start(), 1);
        assert_eq!(p.page_end(), 100);

        let p = page(1, 120);
        assert_eq!(p.page_start(), 101);
        assert_eq!(p.page_end(), 200);
    }

    #[test]
    fn has_next_prev() {
        assert!(page(0, 120).has_next());
        assert!(!page(0, 120).has_prev());
        assert!(!page(1, 120).has_next());
        assert!(page(1, 120).has_prev());
        assert!(!page(0, 100).has_next());
    }
}
