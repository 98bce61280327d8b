//! Test fixtures shared by the engine's unit tests

use crate::record::{ListRecord, SortKey};
use crate::schema::{Aggregate, FilterDimension, ListSchema};
use crate::state::FilterState;
use chrono::{DateTime, Duration, TimeZone, Utc};

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Product {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) kind: String,
    pub(crate) owner: Option<String>,
    pub(crate) price: Option<f64>,
    pub(crate) rating: Option<f64>,
    pub(crate) sales: Option<f64>,
    pub(crate) is_active: bool,
    pub(crate) valid_until: Option<DateTime<Utc>>,
    pub(crate) created_at: Option<DateTime<Utc>>,
}

impl Product {
    pub(crate) const fn price_field(&self) -> Option<f64> {
        self.price
    }
}

impl ListRecord for Product {
    fn id(&self) -> &str {
        &self.id
    }

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.title.as_str()];
        if let Some(owner) = &self.owner {
            fields.push(owner);
        }
        fields
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    fn price(&self) -> Option<f64> {
        self.price
    }

    fn rating(&self) -> Option<f64> {
        self.rating
    }

    fn popularity(&self) -> Option<f64> {
        self.sales
    }
}

pub(crate) fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

pub(crate) fn product(id: &str, title: &str, price: f64) -> Product {
    Product {
        id: id.to_string(),
        title: title.to_string(),
        kind: "prompt".to_string(),
        owner: Some(format!("{id}@sellers.example")),
        price: Some(price),
        rating: None,
        sales: None,
        is_active: true,
        valid_until: None,
        created_at: Some(epoch()),
    }
}

/// `count` products created one hour apart, alternating active/inactive and
/// prompt/agent
pub(crate) fn catalog(count: usize) -> Vec<Product> {
    (0..count)
        .map(|i| {
            let mut p = product(&format!("p{i}"), &format!("Item {i}"), (i % 7) as f64 * 5.0);
            p.kind = if i % 2 == 0 { "prompt" } else { "agent" }.to_string();
            p.is_active = i % 3 != 0;
            p.rating = Some((i % 5) as f64);
            p.sales = Some((i * 3 % 11) as f64);
            p.created_at = Some(epoch() + Duration::hours(i64::try_from(i).unwrap_or_default()));
            p
        })
        .collect()
}

pub(crate) fn schema() -> ListSchema<Product> {
    ListSchema::new("products")
        .filter(FilterDimension::exact("kind", |p: &Product| Some(p.kind.clone())))
        .filter(FilterDimension::new("status", |p: &Product, value, now| match value {
            "active" => p.is_active && p.valid_until.is_none_or(|until| until > now),
            "inactive" => !p.is_active,
            "expired" => p.valid_until.is_some_and(|until| until <= now),
            _ => false,
        }))
        .filter(FilterDimension::new("price", |p: &Product, value, _| {
            let price = p.price.unwrap_or_default();
            match value {
                "free" => price <= 0.0,
                "under-10" => price > 0.0 && price < 10.0,
                "10-plus" => price >= 10.0,
                _ => false,
            }
        }))
        .aggregate(Aggregate::count("active", |p: &Product| p.is_active))
        .aggregate(Aggregate::sum("revenue", Product::price_field))
        .aggregate(Aggregate::average("avg_rating", |p: &Product| p.rating))
}

pub(crate) fn state() -> FilterState {
    FilterState::new(10, SortKey::Recent)
}
