//! Page-number resolution shared by the JSON API and the admin lists.
//!
//! A `page` query value is either a 1-based number or the literal `last`.
//! An empty result set still has a single, empty first page.

use crate::error::AppError;

/// Fixed page size of the movies listing endpoint.
pub const API_PAGE_SIZE: u64 = 50;

/// Page size of the admin change lists.
pub const ADMIN_PAGE_SIZE: u64 = 100;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PageError {
    #[error("page is not 'last', nor can it be converted to an int")]
    NotAnInteger,
    #[error("that page number is less than 1")]
    LessThanOne,
    #[error("that page contains no results")]
    Empty,
}

impl From<PageError> for AppError {
    fn from(err: PageError) -> Self {
        AppError::NotFound(err.to_string())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Page {
    pub number: u64,
    pub per_page: u64,
    pub count: u64,
    pub total_pages: u64,
}

impl Page {
    /// Validates a raw `page` query value against `count` items split into
    /// pages of `per_page`.
    pub fn resolve(raw: Option<&str>, count: u64, per_page: u64) -> Result<Self, PageError> {
        let per_page = per_page.max(1);
        let total_pages = if count == 0 { 1 } else { count.div_ceil(per_page) };

        let number = match raw.map(str::trim) {
            None | Some("") => 1,
            Some("last") => total_pages,
            Some(raw) => {
                let n: i64 = raw.parse().map_err(|_| PageError::NotAnInteger)?;
                if n < 1 {
                    return Err(PageError::LessThanOne);
                }
                n as u64
            }
        };

        if number > total_pages {
            return Err(PageError::Empty);
        }

        Ok(Self { number, per_page, count, total_pages })
    }

    pub fn offset(&self) -> u64 {
        (self.number - 1) * self.per_page
    }

    pub fn prev(&self) -> Option<u64> {
        (self.number > 1).then(|| self.number - 1)
    }

    pub fn next(&self) -> Option<u64> {
        (self.number < self.total_pages).then(|| self.number + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_page_of_three() {
        let page = Page::resolve(None, 120, API_PAGE_SIZE).unwrap();
        assert_eq!(page.number, 1);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.offset(), 0);
        assert_eq!(page.prev(), None);
        assert_eq!(page.next(), Some(2));
    }

    #[test]
    fn last_page_has_no_next() {
        let page = Page::resolve(Some("3"), 120, API_PAGE_SIZE).unwrap();
        assert_eq!(page.offset(), 100);
        assert_eq!(page.prev(), Some(2));
        assert_eq!(page.next(), None);
        assert_eq!(Page::resolve(Some("last"), 120, API_PAGE_SIZE).unwrap(), page);
    }

    #[test]
    fn empty_result_set_has_one_page() {
        let page = Page::resolve(Some("1"), 0, API_PAGE_SIZE).unwrap();
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.prev(), None);
        assert_eq!(page.next(), None);
        assert_eq!(Page::resolve(Some("2"), 0, API_PAGE_SIZE), Err(PageError::Empty));
    }

    #[test]
    fn rejects_out_of_range_and_garbage() {
        assert_eq!(Page::resolve(Some("4"), 120, API_PAGE_SIZE), Err(PageError::Empty));
        assert_eq!(Page::resolve(Some("0"), 120, API_PAGE_SIZE), Err(PageError::LessThanOne));
        assert_eq!(Page::resolve(Some("-2"), 120, API_PAGE_SIZE), Err(PageError::LessThanOne));
        assert_eq!(Page::resolve(Some("two"), 120, API_PAGE_SIZE), Err(PageError::NotAnInteger));
    }

    #[test]
    fn exact_multiple_does_not_add_a_page() {
        let page = Page::resolve(Some("last"), 100, API_PAGE_SIZE).unwrap();
        assert_eq!(page.number, 2);
        assert_eq!(page.next(), None);
    }
}
