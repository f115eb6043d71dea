//! Page-number pagination shared by every list endpoint.
//!
//! Requests carry a 1-based `page` and a `page_size`; the repository layer
//! needs a `LIMIT`/`OFFSET` pair, and the response needs the page metadata.
//! Out-of-range pages are clamped to the last page rather than rejected.

use serde::Serialize;

/// Page used when the client does not send one.
pub const DEFAULT_PAGE: i64 = 1;

/// Page size used when the client does not send one.
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Upper bound on `page_size`.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Clamp a user-provided page size to `1..=MAX_PAGE_SIZE`.
pub fn clamp_page_size(page_size: Option<i64>) -> i64 {
    page_size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
}

/// Number of pages needed for `total_items`. Always at least one.
pub fn total_pages(total_items: i64, page_size: i64) -> i64 {
    let page_size = page_size.max(1);
    ((total_items.max(0) + page_size - 1) / page_size).max(1)
}

/// A resolved page: which slice to fetch and what to report back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageInfo {
    pub current_page: i64,
    pub total_pages: i64,
    pub total_items: i64,
    pub page_size: i64,
    pub has_next: bool,
    pub has_previous: bool,
}

impl PageInfo {
    /// Resolve the requested page against the number of matching rows.
    pub fn resolve(page: Option<i64>, page_size: Option<i64>, total_items: i64) -> Self {
        let page_size = clamp_page_size(page_size);
        let total_pages = total_pages(total_items, page_size);
        let current_page = page.unwrap_or(DEFAULT_PAGE).clamp(1, total_pages);

        Self {
            current_page,
            total_pages,
            total_items: total_items.max(0),
            page_size,
            has_next: current_page < total_pages,
            has_previous: current_page > 1,
        }
    }

    /// SQL `LIMIT` for this page.
    pub fn limit(&self) -> i64 {
        self.page_size
    }

    /// SQL `OFFSET` for this page.
    pub fn offset(&self) -> i64 {
        (self.current_page - 1) * self.page_size
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
