//! Aggregate statistics over a derived collection

use crate::schema::{Aggregate, AggregateKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Computed aggregate values keyed by aggregate name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Aggregates {
    values: BTreeMap<String, f64>,
}

impl Aggregates {
    /// Value of a named aggregate
    #[must_use]
    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    /// Iterate in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Number of aggregates
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no aggregates were configured
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Evaluate every aggregate over `records`
pub fn compute<T>(aggregates: &[Aggregate<T>], records: &[&T]) -> Aggregates {
    let values = aggregates
        .iter()
        .map(|aggregate| (aggregate.name().to_string(), evaluate(aggregate.kind(), records)))
        .collect();
    Aggregates { values }
}

fn evaluate<T>(kind: &AggregateKind<T>, records: &[&T]) -> f64 {
    match kind {
        AggregateKind::Count(test) => records.iter().filter(|r| test(**r)).count() as f64,
        AggregateKind::Sum(field) => sum(records, field.as_ref()),
        AggregateKind::Average(field) => {
            if records.is_empty() {
                0.0
            } else {
                sum(records, field.as_ref()) / records.len() as f64
            }
        }
    }
}

fn sum<T>(records: &[&T], field: &(dyn Fn(&T) -> Option<f64> + Send + Sync)) -> f64 {
    records
        .iter()
        .filter_map(|r| field(*r))
        .filter(|v| v.is_finite())
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Product, product};
    use pretty_assertions::assert_eq;

    fn aggregates() -> Vec<Aggregate<Product>> {
        vec![
            Aggregate::count("active", |p: &Product| p.is_active),
            Aggregate::sum("revenue", Product::price_field),
            Aggregate::average("avg_price", Product::price_field),
        ]
    }

    #[test]
    fn test_compute_over_records() {
        let a = product("a", "a", 10.0);
        let mut b = product("b", "b", 20.0);
        b.is_active = false;
        let mut c = product("c", "c", 0.0);
        c.price = None;

        let result = compute(&aggregates(), &[&a, &b, &c]);
        assert_eq!(result.get("active"), Some(2.0));
        assert_eq!(result.get("revenue"), Some(30.0));
        assert_eq!(result.get("avg_price"), Some(10.0));
        assert_eq!(result.len(), 3);
        assert_eq!(result.get("missing"), None);
    }

    #[test]
    fn test_empty_collection() {
        let result = compute::<Product>(&aggregates(), &[]);
        assert_eq!(result.get("active"), Some(0.0));
        assert_eq!(result.get("revenue"), Some(0.0));
        assert_eq!(result.get("avg_price"), Some(0.0));
    }

    #[test]
    fn test_non_finite_values_are_ignored() {
        let mut a = product("a", "a", 1.0);
        a.price = Some(f64::NAN);
        let b = product("b", "b", 4.0);

        let result = compute(&aggregates(), &[&a, &b]);
        assert_eq!(result.get("revenue"), Some(4.0));
        assert_eq!(result.get("avg_price"), Some(2.0));
    }

    #[test]
    fn test_iter_is_name_ordered() {
        let result = compute::<Product>(&aggregates(), &[]);
        let names: Vec<&str> = result.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["active", "avg_price", "revenue"]);
    }
}
