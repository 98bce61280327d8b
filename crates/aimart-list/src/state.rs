//! Per-page search, filter, sort and paging state

use crate::record::SortKey;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Filter value that disables a dimension
pub const ALL: &str = "all";

/// Everything the user has typed or picked on one list page
///
/// Any change to the search term, a filter, the sort key or the page size
/// moves the page back to 1. Setting a field to its current value is not a
/// change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    search_term: String,
    filters: BTreeMap<String, String>,
    sort: SortKey,
    page: u32,
    page_size: u32,
}

impl FilterState {
    /// Fresh state on page 1
    #[must_use]
    pub fn new(page_size: u32, sort: SortKey) -> Self {
        Self {
            search_term: String::new(),
            filters: BTreeMap::new(),
            sort,
            page: 1,
            page_size: page_size.max(1),
        }
    }

    /// Current search term as typed
    #[must_use]
    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    /// Active categorical filters; dimensions set to [`ALL`] are absent
    #[must_use]
    pub const fn filters(&self) -> &BTreeMap<String, String> {
        &self.filters
    }

    /// Value of one filter dimension, [`ALL`] when unset
    #[must_use]
    pub fn filter(&self, name: &str) -> &str {
        self.filters.get(name).map_or(ALL, String::as_str)
    }

    /// Current sort key
    #[must_use]
    pub const fn sort(&self) -> SortKey {
        self.sort
    }

    /// Requested page (1-based)
    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    /// Page size
    #[must_use]
    pub const fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Set the search term; returns whether anything changed
    pub fn set_search(&mut self, term: impl Into<String>) -> bool {
        let term = term.into();
        if term == self.search_term {
            return false;
        }
        self.search_term = term;
        self.page = 1;
        true
    }

    /// Set a filter dimension; [`ALL`] or an empty value clears it
    pub fn set_filter(&mut self, name: impl Into<String>, value: impl Into<String>) -> bool {
        let name = name.into();
        let value = value.into();
        let changed = if value.is_empty() || value.eq_ignore_ascii_case(ALL) {
            self.filters.remove(&name).is_some()
        } else if self.filters.get(&name) == Some(&value) {
            false
        } else {
            self.filters.insert(name, value);
            true
        };
        if changed {
            self.page = 1;
        }
        changed
    }

    /// Drop every filter and the search term
    pub fn clear_filters(&mut self) -> bool {
        let changed = !self.filters.is_empty() || !self.search_term.is_empty();
        self.filters.clear();
        self.search_term.clear();
        if changed {
            self.page = 1;
        }
        changed
    }

    /// Set the sort key
    pub fn set_sort(&mut self, sort: SortKey) -> bool {
        if sort == self.sort {
            return false;
        }
        self.sort = sort;
        self.page = 1;
        true
    }

    /// Set the page size; zero is ignored
    pub fn set_page_size(&mut self, page_size: u32) -> bool {
        if page_size == 0 || page_size == self.page_size {
            return false;
        }
        self.page_size = page_size;
        self.page = 1;
        true
    }

    /// Move to `page` if it lies in `1..=total_pages`
    pub fn set_page(&mut self, page: u32, total_pages: u32) -> bool {
        if page == 0 || page > total_pages.max(1) {
            return false;
        }
        self.page = page;
        true
    }
}

impl Default for FilterState {
    fn default() -> Self {
        Self::new(20, SortKey::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn on_page_three() -> FilterState {
        let mut state = FilterState::new(10, SortKey::Recent);
        assert!(state.set_page(3, 5));
        state
    }

    #[test]
    fn test_new_state_starts_on_page_one() {
        let state = FilterState::new(20, SortKey::PriceAsc);
        assert_eq!(state.page(), 1);
        assert_eq!(state.page_size(), 20);
        assert_eq!(state.sort(), SortKey::PriceAsc);
        assert_eq!(state.search_term(), "");
        assert!(state.filters().is_empty());
    }

    #[test]
    fn test_search_change_resets_page() {
        let mut state = on_page_three();
        assert!(state.set_search("gpt"));
        assert_eq!(state.page(), 1);
    }

    #[test]
    fn test_same_search_is_not_a_change() {
        let mut state = on_page_three();
        state.set_search("");
        assert!(!state.set_search(""));
        assert_eq!(state.page(), 3);
    }

    #[test]
    fn test_filter_change_resets_page() {
        let mut state = on_page_three();
        assert!(state.set_filter("status", "active"));
        assert_eq!(state.page(), 1);
        assert_eq!(state.filter("status"), "active");
    }

    #[test]
    fn test_all_sentinel_clears_filter() {
        let mut state = FilterState::default();
        state.set_filter("status", "active");
        assert!(state.set_filter("status", "ALL"));
        assert_eq!(state.filter("status"), ALL);
        assert!(state.filters().is_empty());
        assert!(!state.set_filter("status", ALL));
    }

    #[test]
    fn test_sort_and_page_size_reset_page() {
        let mut state = on_page_three();
        assert!(state.set_sort(SortKey::Rating));
        assert_eq!(state.page(), 1);

        let mut state = on_page_three();
        assert!(state.set_page_size(50));
        assert_eq!(state.page(), 1);
        assert!(!state.set_page_size(0));
        assert_eq!(state.page_size(), 50);
    }

    #[test]
    fn test_set_page_out_of_range_is_noop() {
        let mut state = on_page_three();
        assert!(!state.set_page(0, 5));
        assert!(!state.set_page(6, 5));
        assert_eq!(state.page(), 3);
        assert!(state.set_page(5, 5));
        assert_eq!(state.page(), 5);
    }

    #[test]
    fn test_set_page_with_zero_total_pages_allows_first_page() {
        let mut state = FilterState::default();
        assert!(state.set_page(1, 0));
        assert!(!state.set_page(2, 0));
    }

    #[test]
    fn test_clear_filters() {
        let mut state = FilterState::default();
        state.set_search("agent");
        state.set_filter("role", "seller");
        state.set_page(2, 2);
        assert!(state.clear_filters());
        assert_eq!(state.page(), 1);
        assert!(state.filters().is_empty());
        assert_eq!(state.search_term(), "");
        assert!(!state.clear_filters());
    }
}
