//! The list view controller: one per list page
//!
//! Holds the fetched snapshot and the page's [`FilterState`], and recomputes
//! `paginate(derive(records, state))` on demand. There is no cache; every
//! view is derived from scratch so it can never show a stale aggregate.

use crate::aggregate::Aggregates;
use crate::derive::{self, Derived};
use crate::pagination::{self, PaginationState};
use crate::record::{ListRecord, SortKey};
use crate::schema::ListSchema;
use crate::state::{ALL, FilterState};
use aimart_core::config::ListConfig;
use aimart_core::{Error, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// What a list page renders
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListView<T> {
    /// Records on the current page
    pub records: Vec<T>,
    /// Page position over the derived collection
    pub pagination: PaginationState,
    /// Aggregates over the whole derived collection, not just this page
    pub aggregates: Aggregates,
    /// Collection size reported by the server, when it sent one
    pub server_total: Option<u64>,
}

/// A record taken out of the collection, remembered for rollback
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Removed<T> {
    /// Position the record occupied
    pub index: usize,
    /// The record itself
    pub record: T,
}

/// Fetched snapshot plus the user's view state for one list page
#[derive(Debug)]
pub struct ListController<T: ListRecord> {
    schema: Arc<ListSchema<T>>,
    records: Vec<T>,
    state: FilterState,
    page_size_options: Vec<u32>,
    server_total: Option<u64>,
    revision: u64,
}

impl<T: ListRecord> ListController<T> {
    /// Empty controller using the schema's default sort and the configured
    /// default page size
    #[must_use]
    pub fn new(schema: Arc<ListSchema<T>>, config: &ListConfig) -> Self {
        let state = FilterState::new(config.default_page_size, schema.initial_sort());
        Self {
            schema,
            records: Vec::new(),
            state,
            page_size_options: config.page_size_options.clone(),
            server_total: None,
            revision: 0,
        }
    }

    /// Schema driving this controller
    #[must_use]
    pub fn schema(&self) -> &ListSchema<T> {
        &self.schema
    }

    /// Full fetched collection, in server order
    #[must_use]
    pub fn records(&self) -> &[T] {
        &self.records
    }

    /// Current view state
    #[must_use]
    pub const fn state(&self) -> &FilterState {
        &self.state
    }

    /// Page sizes the user may choose from
    #[must_use]
    pub fn page_size_options(&self) -> &[u32] {
        &self.page_size_options
    }

    /// Collection size last reported by the server
    #[must_use]
    pub const fn server_total(&self) -> Option<u64> {
        self.server_total
    }

    /// Number of snapshots swapped in so far
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// Swap in a freshly fetched collection
    ///
    /// The requested page is kept; views clamp it if the new collection is
    /// shorter.
    pub fn replace_records(&mut self, records: Vec<T>, server_total: Option<u64>) {
        debug!(
            resource = self.schema.resource(),
            count = records.len(),
            server_total,
            "replacing list snapshot"
        );
        self.records = records;
        self.server_total = server_total;
        self.revision = self.revision.wrapping_add(1);
    }

    /// Set the search term
    pub fn set_search(&mut self, term: impl Into<String>) -> bool {
        self.state.set_search(term)
    }

    /// Set a filter dimension
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` if the schema has no such dimension, or
    /// the dimension lists its options and `value` is not one of them.
    pub fn set_filter(&mut self, name: &str, value: &str) -> Result<bool> {
        let dimension = self.schema.dimension(name).ok_or_else(|| {
            Error::validation(
                name,
                format!("{} has no '{name}' filter", self.schema.resource()),
            )
        })?;

        let is_all = value.is_empty() || value.eq_ignore_ascii_case(ALL);
        if !is_all
            && !dimension.options().is_empty()
            && !dimension.options().iter().any(|o| o.eq_ignore_ascii_case(value))
        {
            return Err(Error::validation(
                name,
                format!(
                    "'{value}' is not one of: {}, {}",
                    ALL,
                    dimension.options().join(", ")
                ),
            ));
        }

        Ok(self.state.set_filter(name, value.to_ascii_lowercase()))
    }

    /// Reset search and filters
    pub fn clear_filters(&mut self) -> bool {
        self.state.clear_filters()
    }

    /// Set the sort key
    pub fn set_sort(&mut self, sort: SortKey) -> bool {
        self.state.set_sort(sort)
    }

    /// Set the page size
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` if `size` is not one of the configured
    /// page size options.
    pub fn set_page_size(&mut self, size: u32) -> Result<bool> {
        if !self.page_size_options.contains(&size) {
            return Err(Error::validation(
                "limit",
                format!("page size {size} is not one of {:?}", self.page_size_options),
            ));
        }
        Ok(self.state.set_page_size(size))
    }

    /// Go to `page`; out-of-range pages are ignored
    pub fn set_page(&mut self, page: u32) -> bool {
        self.set_page_at(page, Utc::now())
    }

    /// Go to `page`, measuring the derived collection at `now`
    pub fn set_page_at(&mut self, page: u32, now: DateTime<Utc>) -> bool {
        let total_pages = self.pagination_at(now).total_pages;
        self.state.set_page(page, total_pages)
    }

    /// Derived collection at `now`
    #[must_use]
    pub fn derive_at(&self, now: DateTime<Utc>) -> Derived<'_, T> {
        derive::derive(&self.records, &self.state, &self.schema, now)
    }

    /// Pagination over the derived collection at `now`
    #[must_use]
    pub fn pagination_at(&self, now: DateTime<Utc>) -> PaginationState {
        let total = self.derive_at(now).len();
        PaginationState::new(total, self.state.page_size(), self.state.page())
    }

    /// Render the current page at `now`
    #[must_use]
    pub fn view_at(&self, now: DateTime<Utc>) -> ListView<T> {
        let derived = self.derive_at(now);
        let pagination =
            PaginationState::new(derived.len(), self.state.page_size(), self.state.page());
        let records = pagination::paginate(&derived.records, &pagination)
            .iter()
            .map(|r| (*r).clone())
            .collect();

        ListView {
            records,
            pagination,
            aggregates: derived.aggregates,
            server_total: self.server_total,
        }
    }

    /// Render the current page using the wall clock
    #[must_use]
    pub fn view(&self) -> ListView<T> {
        self.view_at(Utc::now())
    }

    /// Look up a record by id
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&T> {
        self.records.iter().find(|r| r.id() == id)
    }

    /// Mutate a record in place, returning its previous value
    pub fn patch<F>(&mut self, id: &str, change: F) -> Option<T>
    where
        F: FnOnce(&mut T),
    {
        let record = self.records.iter_mut().find(|r| r.id() == id)?;
        let previous = record.clone();
        change(record);
        Some(previous)
    }

    /// Replace the record with the same id; returns whether one was found
    pub fn replace(&mut self, replacement: T) -> bool {
        match self.records.iter_mut().find(|r| r.id() == replacement.id()) {
            Some(record) => {
                *record = replacement;
                true
            }
            None => false,
        }
    }

    /// Undo a [`patch`](Self::patch) taken at snapshot `revision`
    ///
    /// If a newer snapshot landed since, its copy is fresher than
    /// `previous` and is left alone. Returns whether `previous` was put
    /// back.
    pub fn rollback(&mut self, previous: T, revision: u64) -> bool {
        if self.revision != revision {
            debug!(
                resource = self.schema.resource(),
                id = previous.id(),
                "skipping rollback over newer snapshot"
            );
            return false;
        }
        self.replace(previous)
    }

    /// Take a record out of the collection
    pub fn remove(&mut self, id: &str) -> Option<Removed<T>> {
        let index = self.records.iter().position(|r| r.id() == id)?;
        let record = self.records.remove(index);
        self.server_total = self.server_total.map(|t| t.saturating_sub(1));
        Some(Removed { index, record })
    }

    /// Put a removed record back where it was
    ///
    /// If a record with the same id reappeared in the meantime (a refetch
    /// landed), that copy is replaced instead.
    pub fn restore(&mut self, removed: Removed<T>) {
        if self.replace(removed.record.clone()) {
            return;
        }
        let index = removed.index.min(self.records.len());
        self.records.insert(index, removed.record);
        self.server_total = self.server_total.map(|t| t.saturating_add(1));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::testing::{Product, catalog, epoch, schema};
    use pretty_assertions::assert_eq;

    fn controller(items: Vec<Product>, page_size: u32) -> ListController<Product> {
        let config = ListConfig {
            default_page_size: page_size,
            page_size_options: vec![5, 10, 20, 50],
            ..ListConfig::default()
        };
        let mut controller = ListController::new(Arc::new(schema()), &config);
        controller.replace_records(items, None);
        controller
    }

    #[test]
    fn test_filter_shrinks_total_pages_and_resets_page() {
        // 25 items, 20 per page, filter down to 5 matches
        let mut items = catalog(25);
        for (i, item) in items.iter_mut().enumerate() {
            item.kind = if i < 5 { "bundle" } else { "prompt" }.to_string();
        }
        let mut list = controller(items, 20);

        assert_eq!(list.view_at(epoch()).pagination.total_pages, 2);
        assert!(list.set_page_at(2, epoch()));
        assert_eq!(list.view_at(epoch()).pagination.page, 2);

        list.set_filter("kind", "bundle").unwrap();
        let view = list.view_at(epoch());
        assert_eq!(view.pagination.total, 5);
        assert_eq!(view.pagination.total_pages, 1);
        assert_eq!(view.pagination.page, 1);
        assert_eq!(list.state().page(), 1);
    }

    #[test]
    fn test_changing_page_keeps_totals() {
        let mut list = controller(catalog(45), 20);
        let before = list.view_at(epoch()).pagination;

        assert!(list.set_page_at(3, epoch()));
        let after = list.view_at(epoch()).pagination;
        assert_eq!(after.total, before.total);
        assert_eq!(after.total_pages, before.total_pages);
        assert_eq!(after.page, 3);
        assert_eq!(list.view_at(epoch()).records.len(), 5);
    }

    #[test]
    fn test_set_page_out_of_range_is_noop() {
        let mut list = controller(catalog(45), 20);
        assert!(!list.set_page_at(4, epoch()));
        assert!(!list.set_page_at(0, epoch()));
        assert_eq!(list.state().page(), 1);
    }

    #[test]
    fn test_page_size_must_be_an_option() {
        let mut list = controller(catalog(45), 20);
        list.set_page_at(2, epoch());

        assert!(list.set_page_size(7).is_err());
        assert_eq!(list.state().page(), 2);

        assert!(list.set_page_size(10).unwrap());
        assert_eq!(list.state().page(), 1);
        assert_eq!(list.view_at(epoch()).pagination.total_pages, 5);
    }

    #[test]
    fn test_set_filter_validates_dimension() {
        let mut list = controller(catalog(3), 20);
        assert!(list.set_filter("colour", "red").is_err());
        assert!(list.set_filter("kind", "agent").unwrap());
        assert!(list.set_filter("kind", "ALL").unwrap());
        assert!(list.state().filters().is_empty());
    }

    #[test]
    fn test_set_filter_checks_listed_options() {
        let config = ListConfig::default();
        let schema = schema().filter(
            crate::schema::FilterDimension::exact("kind", |p: &Product| Some(p.kind.clone()))
                .with_options(["prompt", "agent"]),
        );
        let mut list = ListController::new(Arc::new(schema), &config);

        assert!(list.set_filter("kind", "Agent").unwrap());
        assert_eq!(list.state().filter("kind"), "agent");
        let err = list.set_filter("kind", "bundle").unwrap_err();
        assert!(err.to_string().contains("prompt, agent"));
    }

    #[test]
    fn test_refetch_without_item_drops_it_everywhere() {
        let items = catalog(6);
        let mut list = controller(items.clone(), 20);
        list.replace_records(items.clone(), Some(6));
        let before = list.view_at(epoch());
        assert_eq!(before.aggregates.get("revenue"), Some(items.iter().filter_map(|p| p.price).sum()));

        let remaining: Vec<Product> = items.iter().filter(|p| p.id != "p3").cloned().collect();
        list.replace_records(remaining, Some(5));

        let after = list.view_at(epoch());
        assert!(list.find("p3").is_none());
        assert!(after.records.iter().all(|p| p.id != "p3"));
        assert_eq!(after.pagination.total, 5);
        assert_eq!(after.server_total, Some(5));
        let removed_price = items.iter().find(|p| p.id == "p3").and_then(|p| p.price).unwrap();
        assert_eq!(
            after.aggregates.get("revenue"),
            before.aggregates.get("revenue").map(|r| r - removed_price)
        );
    }

    #[test]
    fn test_toggling_active_under_active_filter_hides_item() {
        let mut list = controller(catalog(6), 20);
        list.set_filter("status", "active").unwrap();
        let visible: Vec<String> = list.view_at(epoch()).records.iter().map(|p| p.id.clone()).collect();
        assert!(visible.contains(&"p1".to_string()));

        let previous = list.patch("p1", |p| p.is_active = !p.is_active).unwrap();
        assert!(previous.is_active);

        let view = list.view_at(epoch());
        assert!(view.records.iter().all(|p| p.id != "p1"));
        assert_eq!(view.pagination.total, visible.len() - 1);
    }

    #[test]
    fn test_rollback_restores_patched_record() {
        let mut list = controller(catalog(3), 20);
        let revision = list.revision();
        let previous = list.patch("p1", |p| p.is_active = !p.is_active).unwrap();

        assert!(list.rollback(previous.clone(), revision));
        assert_eq!(list.find("p1"), Some(&previous));
    }

    #[test]
    fn test_rollback_keeps_newer_snapshot() {
        let mut list = controller(catalog(3), 20);
        let revision = list.revision();
        let previous = list.patch("p1", |p| p.is_active = !p.is_active).unwrap();

        let mut fresh = catalog(3);
        if let Some(p) = fresh.iter_mut().find(|p| p.id == "p1") {
            p.title = "renamed on server".into();
        }
        list.replace_records(fresh, Some(3));
        assert!(list.revision() > revision);

        assert!(!list.rollback(previous, revision));
        assert_eq!(
            list.find("p1").map(|p| p.title.as_str()),
            Some("renamed on server")
        );
    }

    #[test]
    fn test_remove_and_restore_keep_position() {
        let mut list = controller(catalog(4), 20);
        list.replace_records(catalog(4), Some(4));

        let removed = list.remove("p1").unwrap();
        assert_eq!(removed.index, 1);
        assert_eq!(list.records().len(), 3);
        assert_eq!(list.server_total(), Some(3));

        list.restore(removed);
        let ids: Vec<&str> = list.records().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["p0", "p1", "p2", "p3"]);
        assert_eq!(list.server_total(), Some(4));
    }

    #[test]
    fn test_restore_after_refetch_replaces_instead_of_duplicating() {
        let mut list = controller(catalog(3), 20);
        let mut removed = list.remove("p0").unwrap();
        list.replace_records(catalog(3), None);

        removed.record.title = "restored".into();
        list.restore(removed);
        assert_eq!(list.records().len(), 3);
        assert_eq!(list.find("p0").map(|p| p.title.as_str()), Some("restored"));
    }

    #[test]
    fn test_shrinking_refetch_clamps_displayed_page() {
        let mut list = controller(catalog(45), 20);
        list.set_page_at(3, epoch());
        list.replace_records(catalog(10), None);

        let view = list.view_at(epoch());
        assert_eq!(view.pagination.page, 1);
        assert_eq!(view.records.len(), 10);
    }

    #[test]
    fn test_aggregates_cover_whole_derived_set_not_page() {
        let list = controller(catalog(30), 5);
        let view = list.view_at(epoch());
        assert_eq!(view.records.len(), 5);
        let active = catalog(30).iter().filter(|p| p.is_active).count() as f64;
        assert_eq!(view.aggregates.get("active"), Some(active));
    }
}
