//! Search, filter, sort and aggregate in one synchronous pass
//!
//! `derive` is a pure projection of `(collection, state, schema, now)`:
//! running it again over its own output with the same state returns the
//! same records in the same order.

use crate::aggregate::{self, Aggregates};
use crate::record::ListRecord;
use crate::schema::ListSchema;
use crate::sort;
use crate::state::FilterState;
use chrono::{DateTime, Utc};
use tracing::warn;

/// Filtered, sorted view over a borrowed collection
#[derive(Debug, Clone)]
pub struct Derived<'a, T> {
    /// Records that passed search and filters, in display order
    pub records: Vec<&'a T>,
    /// Aggregates over `records`
    pub aggregates: Aggregates,
}

impl<T> Derived<'_, T> {
    /// Number of derived records
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether nothing matched
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<T: Clone> Derived<'_, T> {
    /// Owned copy of the derived records
    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        self.records.iter().map(|r| (*r).clone()).collect()
    }
}

/// Case-insensitive substring match over the record's search fields
///
/// `needle` must already be lowercased; an empty needle matches everything.
pub fn matches_search<T: ListRecord>(record: &T, needle: &str) -> bool {
    needle.is_empty()
        || record
            .search_fields()
            .iter()
            .any(|field| field.to_lowercase().contains(needle))
}

/// Whether `record` passes every active filter in `state`
///
/// Dimensions compose with AND. Filters naming a dimension the schema does
/// not know are ignored.
pub fn passes_filters<T: ListRecord>(
    record: &T,
    state: &FilterState,
    schema: &ListSchema<T>,
    now: DateTime<Utc>,
) -> bool {
    state
        .filters()
        .iter()
        .all(|(name, value)| match schema.dimension(name) {
            Some(dimension) => dimension.matches(record, value, now),
            None => true,
        })
}

/// Derive the displayed collection from the full one
pub fn derive<'a, T: ListRecord>(
    records: &'a [T],
    state: &FilterState,
    schema: &ListSchema<T>,
    now: DateTime<Utc>,
) -> Derived<'a, T> {
    for name in state.filters().keys() {
        if schema.dimension(name).is_none() {
            warn!(
                resource = schema.resource(),
                filter = %name,
                "ignoring filter with no matching dimension"
            );
        }
    }

    let needle = state.search_term().trim().to_lowercase();
    let mut derived: Vec<&T> = records
        .iter()
        .filter(|r| matches_search(*r, &needle))
        .filter(|r| passes_filters(*r, state, schema, now))
        .collect();

    sort::sort_records(&mut derived, state.sort());
    let aggregates = aggregate::compute(schema.aggregates(), &derived);

    Derived {
        records: derived,
        aggregates,
    }
}
