//! Page-number pagination primitives shared by listing endpoints.
//!
//! Listing endpoints accept an optional one-based `page` and an optional
//! `limit`. [`PageRequest`] normalises those inputs, clamping the limit into
//! the configured bounds, and [`PageInfo`] describes the resulting window so
//! clients can render navigation controls.
//!
//! # Examples
//! ```
//! use pagination::{PageInfo, PageRequest};
//!
//! let request = PageRequest::new(Some(2), Some(10)).expect("valid page");
//! assert_eq!(request.offset(), 10);
//!
//! let info = PageInfo::new(request, 25);
//! assert_eq!(info.total_pages, 3);
//! assert!(info.has_next_page);
//! assert!(info.has_prev_page);
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Page size used when the caller does not supply one.
pub const DEFAULT_LIMIT: u32 = 10;

/// Largest page size a caller may request.
pub const MAX_LIMIT: u32 = 100;

/// Errors raised while normalising pagination input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PageRequestError {
    /// Pages are numbered from one.
    #[error("page must be at least 1, got {page}")]
    PageOutOfRange {
        /// The rejected page number.
        page: u32,
    },
}

/// Normalised pagination request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    limit: u32,
}

impl PageRequest {
    /// Build a request using [`DEFAULT_LIMIT`] and [`MAX_LIMIT`].
    ///
    /// # Errors
    /// Returns [`PageRequestError::PageOutOfRange`] when `page` is zero.
    pub const fn new(page: Option<u32>, limit: Option<u32>) -> Result<Self, PageRequestError> {
        Self::with_bounds(page, limit, DEFAULT_LIMIT, MAX_LIMIT)
    }

    /// Build a request with caller-supplied default and maximum page sizes.
    ///
    /// A missing page means the first page. The limit is clamped into
    /// `1..=max_limit`.
    ///
    /// # Errors
    /// Returns [`PageRequestError::PageOutOfRange`] when `page` is zero.
    pub const fn with_bounds(
        page: Option<u32>,
        limit: Option<u32>,
        default_limit: u32,
        max_limit: u32,
    ) -> Result<Self, PageRequestError> {
        let page = match page {
            Some(0) => return Err(PageRequestError::PageOutOfRange { page: 0 }),
            Some(value) => value,
            None => 1,
        };
        let requested = match limit {
            Some(value) => value,
            None => default_limit,
        };
        let upper = if max_limit == 0 { 1 } else { max_limit };
        let limit = if requested == 0 {
            1
        } else if requested > upper {
            upper
        } else {
            requested
        };
        Ok(Self { page, limit })
    }

    /// One-based page number.
    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    /// Maximum number of items on the page.
    #[must_use]
    pub const fn limit(&self) -> u32 {
        self.limit
    }

    /// Number of items preceding this page.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        (self.page as u64 - 1).saturating_mul(self.limit as u64)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_LIMIT,
        }
    }
}

/// Navigation metadata describing a page within a result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    /// One-based page number that was served.
    pub current_page: u32,
    /// Number of pages needed to cover every item.
    pub total_pages: u64,
    /// Number of items matching the query across all pages.
    pub total_items: u64,
    /// Page size that was applied.
    pub items_per_page: u32,
    /// Whether a later page exists.
    pub has_next_page: bool,
    /// Whether an earlier page exists.
    pub has_prev_page: bool,
}

impl PageInfo {
    /// Describe `request` within a result set of `total_items`.
    #[must_use]
    pub const fn new(request: PageRequest, total_items: u64) -> Self {
        let total_pages = total_items.div_ceil(request.limit as u64);
        Self {
            current_page: request.page,
            total_pages,
            total_items,
            items_per_page: request.limit,
            has_next_page: (request.page as u64) < total_pages,
            has_prev_page: request.page > 1,
        }
    }
}

/// A page of items together with its navigation metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paginated<T> {
    /// Items on the current page.
    pub items: Vec<T>,
    /// Navigation metadata.
    pub pagination: PageInfo,
}

impl<T> Paginated<T> {
    /// Pair `items` with metadata derived from `request` and `total_items`.
    #[must_use]
    pub const fn new(items: Vec<T>, request: PageRequest, total_items: u64) -> Self {
        Self {
            items,
            pagination: PageInfo::new(request, total_items),
        }
    }

    /// Transform each item while keeping the navigation metadata.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            items: self.items.into_iter().map(f).collect(),
            pagination: self.pagination,
        }
    }
}
