//! Offset pagination shared by every listing.

use serde::Deserialize;

/// Default page size.
pub const DEFAULT_LIMIT: u32 = 100;

/// Largest page size a caller may request.
pub const MAX_LIMIT: u32 = 100;

/// `skip`/`limit` window, as accepted in query strings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Pagination {
    /// Records to skip
    pub skip: u32,
    /// Records to return
    pub limit: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl Pagination {
    /// Build a window with `limit` clamped to `1..=MAX_LIMIT`.
    #[must_use]
    pub fn new(skip: u32, limit: u32) -> Self {
        Self {
            skip,
            limit: limit.clamp(1, MAX_LIMIT),
        }
    }

    /// Same window with the limit clamped.
    #[must_use]
    pub fn normalized(self) -> Self {
        Self::new(self.skip, self.limit)
    }

    /// One-based page number (`skip / limit + 1`).
    #[must_use]
    pub fn page(&self) -> u32 {
        self.skip / self.limit.max(1) + 1
    }

    /// Offset as the signed integer SQL drivers expect.
    #[must_use]
    pub fn offset(&self) -> i64 {
        i64::from(self.skip)
    }

    /// Limit as the signed integer SQL drivers expect.
    #[must_use]
    pub fn limit_i64(&self) -> i64 {
        i64::from(self.limit)
    }
}

/// One page of results plus the total matching count.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Page<T> {
    /// Records in this window
    pub items: Vec<T>,
    /// Records matching the query across all pages
    pub total: u64,
}

impl<T> Page<T> {
    /// Slice an already-filtered, ordered collection.
    #[must_use]
    pub fn from_all(all: Vec<T>, pagination: Pagination) -> Self {
        let total = all.len() as u64;
        let items = all
            .into_iter()
            .skip(pagination.skip as usize)
            .take(pagination.limit as usize)
            .collect();
        Self { items, total }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_is_clamped() {
        assert_eq!(Pagination::new(0, 0).limit, 1);
        assert_eq!(Pagination::new(0, 500).limit, MAX_LIMIT);
        assert_eq!(Pagination::new(0, 20).limit, 20);
    }

    #[test]
    fn test_page_number() {
        assert_eq!(Pagination::default().page(), 1);
        assert_eq!(Pagination::new(20, 10).page(), 3);
        assert_eq!(Pagination::new(5, 10).page(), 1);
    }

    #[test]
    fn test_from_all_windows() {
        let page = Page::from_all((0..25).collect(), Pagination::new(20, 10));
        assert_eq!(page.items, vec![20, 21, 22, 23, 24]);
        assert_eq!(page.total, 25);
    }
}
