//! Paging for kardex listings.
//!
//! A group's kardex can run to tens of thousands of rows, so reporting reads
//! it one page at a time in (date, transaction id) order.

use serde::{Deserialize, Serialize};

/// Largest page a caller may ask for.
pub const MAX_PER_PAGE: u32 = 1000;

/// Which slice of a listing to read. Pages are 1-indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Page number; 0 is read as 1.
    #[serde(default = "default_page")]
    pub page: u32,
    /// Rows per page, clamped to `1..=MAX_PER_PAGE`.
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    50
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(default_page(), default_per_page())
    }
}

impl PageRequest {
    /// Builds a request, clamping `per_page` into range.
    #[must_use]
    pub const fn new(page: u32, per_page: u32) -> Self {
        let per_page = if per_page == 0 {
            1
        } else if per_page > MAX_PER_PAGE {
            MAX_PER_PAGE
        } else {
            per_page
        };
        Self { page, per_page }
    }

    /// Rows to skip before this page.
    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * self.limit()
    }

    /// Rows on this page, clamped even for deserialized requests.
    #[must_use]
    pub fn limit(&self) -> u64 {
        u64::from(self.per_page.clamp(1, MAX_PER_PAGE))
    }
}

/// One page of kardex rows plus where it sits in the listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResponse<T> {
    /// Rows on this page, in listing order.
    pub data: Vec<T>,
    /// Position of the page.
    pub meta: PageMeta,
}

/// Position of a page within the full listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    /// Page returned.
    pub page: u32,
    /// Rows per page used.
    pub per_page: u32,
    /// Rows in the whole listing.
    pub total: u64,
    /// Pages in the whole listing; an empty listing still has one.
    pub total_pages: u32,
}

impl PageMeta {
    /// Derives the page count for `total` rows.
    #[must_use]
    pub fn new(request: &PageRequest, total: u64) -> Self {
        let pages = total.div_ceil(request.limit()).max(1);
        Self {
            page: request.page.max(1),
            per_page: request.per_page.clamp(1, MAX_PER_PAGE),
            total,
            total_pages: u32::try_from(pages).unwrap_or(u32::MAX),
        }
    }

    /// Returns true if a later page holds more rows.
    #[must_use]
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

impl<T> PageResponse<T> {
    /// Wraps the rows read for `request` out of `total`.
    #[must_use]
    pub fn new(data: Vec<T>, request: &PageRequest, total: u64) -> Self {
        Self {
            data,
            meta: PageMeta::new(request, total),
        }
    }
}

#[cfg(test)]
#[path = "pagination_tests.rs"]
mod tests;
