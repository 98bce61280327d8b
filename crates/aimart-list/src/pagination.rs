//! Fixed-size pages over a derived collection

use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Page position within a derived collection
///
/// `total_pages` is never below 1, so an empty collection still has one
/// (empty) page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationState {
    /// Current page (1-based), clamped to `1..=total_pages`
    pub page: u32,
    /// Items per page
    pub limit: u32,
    /// Number of items in the derived collection
    pub total: usize,
    /// Number of pages
    pub total_pages: u32,
}

/// `max(1, ceil(total / limit))`; a zero limit counts as 1
#[must_use]
pub fn total_pages(total: usize, limit: u32) -> u32 {
    let limit = usize::try_from(limit.max(1)).unwrap_or(usize::MAX);
    u32::try_from(total.div_ceil(limit)).unwrap_or(u32::MAX).max(1)
}

impl PaginationState {
    /// Pagination for `total` items, showing `requested_page` clamped into
    /// range
    #[must_use]
    pub fn new(total: usize, limit: u32, requested_page: u32) -> Self {
        let limit = limit.max(1);
        let total_pages = total_pages(total, limit);
        Self {
            page: requested_page.clamp(1, total_pages),
            limit,
            total,
            total_pages,
        }
    }

    /// Index of the first item on the current page
    #[must_use]
    pub fn offset(&self) -> usize {
        let page = usize::try_from(self.page.saturating_sub(1)).unwrap_or(usize::MAX);
        let limit = usize::try_from(self.limit).unwrap_or(usize::MAX);
        page.saturating_mul(limit)
    }

    /// Index range of the current page, clipped to the collection
    #[must_use]
    pub fn range(&self) -> Range<usize> {
        let start = self.offset().min(self.total);
        let limit = usize::try_from(self.limit).unwrap_or(usize::MAX);
        start..start.saturating_add(limit).min(self.total)
    }

    /// Whether a later page exists
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    /// Whether an earlier page exists
    #[must_use]
    pub const fn has_prev(&self) -> bool {
        self.page > 1
    }

    /// Next page number, if any
    #[must_use]
    pub const fn next_page(&self) -> Option<u32> {
        if self.has_next() {
            Some(self.page + 1)
        } else {
            None
        }
    }

    /// Previous page number, if any
    #[must_use]
    pub const fn prev_page(&self) -> Option<u32> {
        if self.has_prev() {
            Some(self.page - 1)
        } else {
            None
        }
    }

    /// Move to `page` if it is in range; otherwise leave the state untouched
    /// and return `false`. `total` and `total_pages` never change.
    pub const fn set_page(&mut self, page: u32) -> bool {
        if page == 0 || page > self.total_pages {
            return false;
        }
        self.page = page;
        true
    }
}

/// Slice the current page out of `items`
#[must_use]
pub fn paginate<'s, T>(items: &'s [T], state: &PaginationState) -> &'s [T] {
    items.get(state.range()).unwrap_or_default()
}
