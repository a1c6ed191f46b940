//! Page-number pagination.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Page size used when the caller does not ask for one.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Upper bound on the page size a caller may ask for.
pub const MAX_PAGE_SIZE: usize = 100;

/// A requested page. `page` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: usize,
    pub page_size: usize,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    pub fn new(page: usize, page_size: usize) -> Self {
        Self { page, page_size }
    }

    /// Clamp the page size into `1..=max_page_size` and the page to at least 1.
    pub fn normalized(self, max_page_size: usize) -> Self {
        Self {
            page: self.page.max(1),
            page_size: self.page_size.clamp(1, max_page_size.max(1)),
        }
    }
}

/// The requested page lies past the end of the collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageOutOfRange {
    pub page: usize,
    pub last_page: usize,
}

impl fmt::Display for PageOutOfRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "page {} is out of range (last page is {})", self.page, self.last_page)
    }
}

impl std::error::Error for PageOutOfRange {}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Total number of items across all pages.
    pub count: usize,
    pub page: usize,
    pub page_size: usize,
    pub has_next: bool,
    pub has_previous: bool,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    /// Cut one page out of an already filtered and ordered collection.
    ///
    /// Page 1 of an empty collection is an empty page; any other page past
    /// the end is an error.
    pub fn paginate(
        items: Vec<T>,
        request: PageRequest,
        max_page_size: usize,
    ) -> Result<Self, PageOutOfRange> {
        let request = request.normalized(max_page_size);
        let count = items.len();
        let last_page = count.div_ceil(request.page_size).max(1);

        if request.page > last_page {
            return Err(PageOutOfRange {
                page: request.page,
                last_page,
            });
        }

        let start = (request.page - 1) * request.page_size;
        let results: Vec<T> = items
            .into_iter()
            .skip(start)
            .take(request.page_size)
            .collect();

        Ok(Self {
            count,
            page: request.page,
            page_size: request.page_size,
            has_next: request.page < last_page,
            has_previous: request.page > 1,
            results,
        })
    }
}
