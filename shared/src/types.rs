//! Common types used across the platform

use serde::{Deserialize, Serialize};

/// Number of rows shown per page in every list view
pub const PAGE_SIZE: u32 = 10;

/// Pagination parameters
///
/// `page` keeps the number the caller asked for, which may be out of range.
/// It is only clamped once the total number of rows is known, see
/// [`Pagination::resolve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: i64,
    pub per_page: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: PAGE_SIZE,
        }
    }
}

impl Pagination {
    /// Build pagination from the raw `page` query parameter.
    /// Missing or non-numeric values fall back to the first page.
    pub fn from_query(page: Option<&str>) -> Self {
        let page = page
            .and_then(|p| p.trim().parse::<i64>().ok())
            .unwrap_or(1);
        Self {
            page,
            per_page: PAGE_SIZE,
        }
    }

    /// Clamp the requested page against the number of matching rows.
    ///
    /// There is always at least one page. A request below 1 or past the last
    /// page is served the last page.
    pub fn resolve(&self, total_items: u64) -> PaginationMeta {
        let per_page = self.per_page.max(1);
        let total_pages = total_items.div_ceil(per_page as u64).max(1);
        let total_pages = u32::try_from(total_pages).unwrap_or(u32::MAX);

        let page = if self.page < 1 || self.page > total_pages as i64 {
            total_pages
        } else {
            self.page as u32
        };

        PaginationMeta {
            page,
            per_page,
            total_items,
            total_pages,
        }
    }
}

/// Paginated response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

impl<T> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, pagination: PaginationMeta) -> Self {
        Self { data, pagination }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PaginatedResponse<U> {
        PaginatedResponse {
            data: self.data.into_iter().map(f).collect(),
            pagination: self.pagination,
        }
    }
}

/// Pagination metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationMeta {
    pub page: u32,
    pub per_page: u32,
    pub total_items: u64,
    pub total_pages: u32,
}

impl PaginationMeta {
    /// Number of rows to skip for this page
    pub fn offset(&self) -> u64 {
        (self.page.saturating_sub(1) as u64) * self.per_page as u64
    }

    pub fn limit(&self) -> u64 {
        self.per_page as u64
    }
}

/// Drop search terms that are empty after trimming
pub fn non_empty(term: Option<String>) -> Option<String> {
    term.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}

/// Case-insensitive substring match, as used by every search filter
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
