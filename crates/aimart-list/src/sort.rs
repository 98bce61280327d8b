//! Stable ordering by [`SortKey`]

use crate::record::{ListRecord, SortKey};
use std::cmp::Ordering;

/// Compare two records under `key`
///
/// Missing numbers compare as zero and missing timestamps as the oldest
/// possible time. Equal keys compare `Equal` so a stable sort keeps input
/// order.
pub fn compare<T: ListRecord>(a: &T, b: &T, key: SortKey) -> Ordering {
    let number = |value: Option<f64>| value.unwrap_or(0.0);
    match key {
        SortKey::Recent => b.created_at().cmp(&a.created_at()),
        SortKey::Oldest => a.created_at().cmp(&b.created_at()),
        SortKey::PriceAsc => number(a.price()).total_cmp(&number(b.price())),
        SortKey::PriceDesc => number(b.price()).total_cmp(&number(a.price())),
        SortKey::Rating => number(b.rating()).total_cmp(&number(a.rating())),
        SortKey::Popularity => number(b.popularity()).total_cmp(&number(a.popularity())),
    }
}

/// Sort references in place; `slice::sort_by` is stable
pub fn sort_records<T: ListRecord>(records: &mut [&T], key: SortKey) {
    records.sort_by(|a, b| compare(*a, *b, key));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{epoch, product};
    use chrono::Duration;
    use pretty_assertions::assert_eq;

    fn ids<T: ListRecord>(records: &[&T]) -> Vec<String> {
        records.iter().map(|r| r.id().to_string()).collect()
    }

    #[test]
    fn test_recent_puts_newest_first_and_missing_last() {
        let mut old = product("old", "a", 1.0);
        let mut new = product("new", "b", 1.0);
        let mut undated = product("undated", "c", 1.0);
        old.created_at = Some(epoch());
        new.created_at = Some(epoch() + Duration::days(1));
        undated.created_at = None;

        let mut records = vec![&undated, &old, &new];
        sort_records(&mut records, SortKey::Recent);
        assert_eq!(ids(&records), vec!["new", "old", "undated"]);

        sort_records(&mut records, SortKey::Oldest);
        assert_eq!(ids(&records), vec!["undated", "old", "new"]);
    }

    #[test]
    fn test_price_sorts_treat_missing_as_zero() {
        let cheap = product("cheap", "a", 3.0);
        let pricey = product("pricey", "b", 30.0);
        let mut unpriced = product("unpriced", "c", 0.0);
        unpriced.price = None;

        let mut records = vec![&pricey, &unpriced, &cheap];
        sort_records(&mut records, SortKey::PriceAsc);
        assert_eq!(ids(&records), vec!["unpriced", "cheap", "pricey"]);

        sort_records(&mut records, SortKey::PriceDesc);
        assert_eq!(ids(&records), vec!["pricey", "cheap", "unpriced"]);
    }

    #[test]
    fn test_ties_keep_input_order() {
        let a = product("a", "a", 5.0);
        let b = product("b", "b", 5.0);
        let c = product("c", "c", 5.0);

        let mut records = vec![&b, &c, &a];
        sort_records(&mut records, SortKey::PriceAsc);
        assert_eq!(ids(&records), vec!["b", "c", "a"]);

        sort_records(&mut records, SortKey::Recent);
        assert_eq!(ids(&records), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_rating_and_popularity_descend() {
        let mut low = product("low", "a", 1.0);
        let mut high = product("high", "b", 1.0);
        low.rating = Some(2.5);
        high.rating = Some(4.8);
        low.sales = Some(100.0);
        high.sales = Some(3.0);

        let mut records = vec![&low, &high];
        sort_records(&mut records, SortKey::Rating);
        assert_eq!(ids(&records), vec!["high", "low"]);

        sort_records(&mut records, SortKey::Popularity);
        assert_eq!(ids(&records), vec!["low", "high"]);
    }
}
