//! Page envelope shared by template and send-log listings.

use serde::Serialize;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Normalized page request: page >= 1, page_size >= 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub page_size: i64,
}

impl PageRequest {
    /// Missing or non-positive values fall back to page 1 / 20 per page.
    pub fn new(page: Option<i64>, page_size: Option<i64>) -> Self {
        Self {
            page: page.filter(|p| *p >= 1).unwrap_or(DEFAULT_PAGE),
            page_size: page_size.filter(|s| *s >= 1).unwrap_or(DEFAULT_PAGE_SIZE),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.page_size)
    }

    pub fn limit(&self) -> i64 {
        self.page_size
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PageResult<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
}

impl<T> PageResult<T> {
    pub fn new(items: Vec<T>, total: i64, request: PageRequest) -> Self {
        Self {
            items,
            total,
            page: request.page,
            page_size: request.page_size,
            total_pages: total_pages(total, request.page_size),
        }
    }

    /// Cut one page out of an already filtered and ordered result set.
    pub fn from_sorted(all: Vec<T>, request: PageRequest) -> Self {
        let total = all.len() as i64;
        let items = all
            .into_iter()
            .skip(request.offset() as usize)
            .take(request.limit() as usize)
            .collect();
        Self::new(items, total, request)
    }
}

fn total_pages(total: i64, page_size: i64) -> i64 {
    if total <= 0 {
        return 0;
    }
    (total + page_size - 1) / page_size
}
