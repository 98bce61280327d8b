//! Per-resource list configuration: filter dimensions and aggregates

use crate::record::{ListRecord, SortKey};
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;

/// Filter predicate: `(record, selected value, now) -> keep?`
pub type Predicate<T> = Arc<dyn Fn(&T, &str, DateTime<Utc>) -> bool + Send + Sync>;

/// Numeric field accessor used by sum and average aggregates
pub type NumericField<T> = Arc<dyn Fn(&T) -> Option<f64> + Send + Sync>;

/// Record test used by count aggregates
pub type RecordTest<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

/// One named categorical filter, e.g. `status` or `role`
pub struct FilterDimension<T> {
    name: String,
    options: Vec<String>,
    predicate: Predicate<T>,
}

impl<T> FilterDimension<T> {
    /// Dimension backed by an arbitrary predicate
    pub fn new<F>(name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&T, &str, DateTime<Utc>) -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            options: Vec::new(),
            predicate: Arc::new(predicate),
        }
    }

    /// Dimension that keeps records whose field equals the selected value,
    /// compared case-insensitively. Records without the field never match.
    pub fn exact<F>(name: impl Into<String>, field: F) -> Self
    where
        F: Fn(&T) -> Option<String> + Send + Sync + 'static,
    {
        Self::new(name, move |record, value, _now| {
            field(record).is_some_and(|v| v.eq_ignore_ascii_case(value))
        })
    }

    /// Values offered to the user, excluding the `all` sentinel
    #[must_use]
    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

    /// Dimension name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Values offered to the user
    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    /// Evaluate the predicate
    #[must_use]
    pub fn matches(&self, record: &T, value: &str, now: DateTime<Utc>) -> bool {
        (self.predicate)(record, value, now)
    }
}

impl<T> fmt::Debug for FilterDimension<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterDimension")
            .field("name", &self.name)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// Reduction computed over the derived collection
pub enum AggregateKind<T> {
    /// Number of records passing the test
    Count(RecordTest<T>),
    /// Sum of a numeric field, missing values count as zero
    Sum(NumericField<T>),
    /// Mean of a numeric field over all records, missing values count as
    /// zero; zero for an empty collection
    Average(NumericField<T>),
}

/// Named aggregate shown in a page's stats bar
pub struct Aggregate<T> {
    name: String,
    kind: AggregateKind<T>,
}

impl<T> Aggregate<T> {
    /// Count records passing `test`
    pub fn count<F>(name: impl Into<String>, test: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            kind: AggregateKind::Count(Arc::new(test)),
        }
    }

    /// Sum a numeric field
    pub fn sum<F>(name: impl Into<String>, field: F) -> Self
    where
        F: Fn(&T) -> Option<f64> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            kind: AggregateKind::Sum(Arc::new(field)),
        }
    }

    /// Average a numeric field
    pub fn average<F>(name: impl Into<String>, field: F) -> Self
    where
        F: Fn(&T) -> Option<f64> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            kind: AggregateKind::Average(Arc::new(field)),
        }
    }

    /// Aggregate name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Aggregate kind
    #[must_use]
    pub const fn kind(&self) -> &AggregateKind<T> {
        &self.kind
    }
}

impl<T> fmt::Debug for Aggregate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            AggregateKind::Count(_) => "count",
            AggregateKind::Sum(_) => "sum",
            AggregateKind::Average(_) => "average",
        };
        f.debug_struct("Aggregate")
            .field("name", &self.name)
            .field("kind", &kind)
            .finish()
    }
}

/// Everything that differs between two list pages
#[derive(Debug)]
pub struct ListSchema<T> {
    resource: String,
    default_sort: SortKey,
    dimensions: Vec<FilterDimension<T>>,
    aggregates: Vec<Aggregate<T>>,
}

impl<T: ListRecord> ListSchema<T> {
    /// Empty schema for `resource`
    pub fn new(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            default_sort: SortKey::default(),
            dimensions: Vec::new(),
            aggregates: Vec::new(),
        }
    }

    /// Register a filter dimension; a later dimension with the same name
    /// replaces the earlier one
    #[must_use]
    pub fn filter(mut self, dimension: FilterDimension<T>) -> Self {
        self.dimensions.retain(|d| d.name() != dimension.name());
        self.dimensions.push(dimension);
        self
    }

    /// Register an aggregate
    #[must_use]
    pub fn aggregate(mut self, aggregate: Aggregate<T>) -> Self {
        self.aggregates.retain(|a| a.name() != aggregate.name());
        self.aggregates.push(aggregate);
        self
    }

    /// Sort key a fresh page starts with
    #[must_use]
    pub const fn default_sort(mut self, sort: SortKey) -> Self {
        self.default_sort = sort;
        self
    }

    /// Resource name, used in logs and messages
    #[must_use]
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Initial sort key
    #[must_use]
    pub const fn initial_sort(&self) -> SortKey {
        self.default_sort
    }

    /// Look up a dimension by name
    #[must_use]
    pub fn dimension(&self, name: &str) -> Option<&FilterDimension<T>> {
        self.dimensions.iter().find(|d| d.name() == name)
    }

    /// All registered dimensions
    #[must_use]
    pub fn dimensions(&self) -> &[FilterDimension<T>] {
        &self.dimensions
    }

    /// All registered aggregates
    #[must_use]
    pub fn aggregates(&self) -> &[Aggregate<T>] {
        &self.aggregates
    }
}
